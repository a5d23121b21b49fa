//! The synchronous call primitive.
//!
//! Mints a fresh correlation token, declares an exclusive ephemeral reply
//! queue, publishes the request tagged with both, and awaits the reply
//! bearing the matching token. The deadline is explicit and caller-chosen:
//! a dead target surfaces as [`sy_domain::Error::Timeout`] instead of
//! blocking forever. Each invocation sets up and tears down its own reply
//! queue; nothing is pooled.

use std::time::Duration;

use sy_broker::{AckMode, Broker, Properties};
use sy_domain::{Error, Result};
use sy_protocol::{RequestEnvelope, ResponseEnvelope};

/// Invoke one operation on one target and decode the reply envelope.
pub async fn call(
    broker: &dyn Broker,
    exchange: &str,
    routing_key: &str,
    request: &RequestEnvelope,
    deadline: Duration,
) -> Result<ResponseEnvelope> {
    let body = call_raw(broker, exchange, routing_key, request, deadline).await?;
    ResponseEnvelope::decode(&body).map_err(|e| Error::Decode(format!("reply envelope: {e}")))
}

/// Like [`call`], but returns the reply body verbatim. The directory uses
/// this to relay a forwarded reply to the original caller unmodified.
pub async fn call_raw(
    broker: &dyn Broker,
    exchange: &str,
    routing_key: &str,
    request: &RequestEnvelope,
    deadline: Duration,
) -> Result<Vec<u8>> {
    let reply_queue = broker.declare_ephemeral_queue().await?;
    let correlation_id = uuid::Uuid::new_v4().to_string();

    let mut consumer = broker.consume(&reply_queue, AckMode::Auto).await?;
    broker
        .publish(
            exchange,
            routing_key,
            request.encode(),
            Properties {
                correlation_id: Some(correlation_id.clone()),
                reply_to: Some(reply_queue.clone()),
                persistent: false,
            },
        )
        .await?;
    tracing::debug!(
        operation = %request.method,
        routing_key,
        correlation_id = %correlation_id,
        "call published"
    );

    let outcome = tokio::time::timeout(deadline, async {
        while let Some(delivery) = consumer.recv().await {
            if delivery.properties.correlation_id.as_deref() == Some(correlation_id.as_str()) {
                return Ok(delivery.body);
            }
            tracing::debug!("ignoring reply with foreign correlation id");
        }
        Err(Error::Broker("reply queue closed before a reply arrived".into()))
    })
    .await;

    // Tear down the per-call session whether or not a reply arrived.
    if let Err(e) = broker.delete_queue(&reply_queue).await {
        tracing::debug!(error = %e, "reply queue teardown failed");
    }

    match outcome {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "no reply from {routing_key} within {}ms",
            deadline.as_millis()
        ))),
    }
}
