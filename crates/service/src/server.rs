//! The RPC server loop.
//!
//! Per inbound message: RECEIVED → DECODE → DISPATCH → REPLY → ACK. The
//! work queue is consumed with a prefetch of one, so each service instance
//! handles exactly one request at a time (strict FIFO). The message is
//! acked only after the reply has been handed to the broker; a crash in
//! between redelivers the request (at-least-once).

use std::sync::Arc;

use async_trait::async_trait;
use sy_broker::{AckMode, Broker, Delivery, ExchangeKind, Properties};
use sy_domain::Result;
use sy_protocol::{
    LIFECYCLE_EXCHANGE, LIFECYCLE_QUEUE, LIFECYCLE_ROUTING_KEY, LifecycleEvent, REQUEST_EXCHANGE,
    RequestEnvelope, ResponseEnvelope, ServiceDescriptor, ServiceState, WireError, WireErrorKind,
};
use tokio_util::sync::CancellationToken;

use crate::descriptor::BuiltService;
use crate::operation::OperationTable;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Service trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What the server needs from a service: its frozen descriptor, the
/// dispatch table, and optionally a special-request hook.
///
/// The hook diverts operations outside the exposed set away from the
/// standard "unsupported" reply — the directory uses it to rewrite alias
/// calls. When diverted, the hook owns the reply: it must publish exactly
/// one response through the given [`ReplyHandle`].
#[async_trait]
pub trait Service: Send + Sync + 'static {
    fn descriptor(&self) -> &ServiceDescriptor;

    fn operations(&self) -> &OperationTable;

    /// Recognize an operation name outside the exposed set as one this
    /// service handles specially. Default: none.
    fn is_special_request(&self, _method: &str) -> bool {
        false
    }

    /// Handle a diverted request. Only called when
    /// [`is_special_request`](Self::is_special_request) returned true. A
    /// returned error is wrapped into an EXCEPTION reply by the server.
    async fn handle_special_request(
        &self,
        request: RequestEnvelope,
        _reply: ReplyHandle,
    ) -> Result<()> {
        Err(sy_domain::Error::UnknownOperation(request.method))
    }
}

#[async_trait]
impl Service for BuiltService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn operations(&self) -> &OperationTable {
        &self.operations
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reply handle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where one request's reply goes: the caller's `reply_to` queue on the
/// default exchange, tagged with the caller's correlation token.
#[derive(Clone)]
pub struct ReplyHandle {
    broker: Arc<dyn Broker>,
    reply_to: Option<String>,
    correlation_id: Option<String>,
}

impl ReplyHandle {
    pub async fn send(&self, response: &ResponseEnvelope) -> Result<()> {
        self.send_raw(response.encode()).await
    }

    /// Publish a pre-serialized body unmodified (alias relay path).
    pub async fn send_raw(&self, body: Vec<u8>) -> Result<()> {
        let Some(reply_to) = &self.reply_to else {
            tracing::warn!("request carried no reply_to; dropping response");
            return Ok(());
        };
        self.broker
            .publish(
                "",
                reply_to,
                body,
                Properties {
                    correlation_id: self.correlation_id.clone(),
                    ..Properties::default()
                },
            )
            .await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RpcServer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct RpcServer {
    broker: Arc<dyn Broker>,
    service: Arc<dyn Service>,
}

impl RpcServer {
    pub fn new(broker: Arc<dyn Broker>, service: Arc<dyn Service>) -> Self {
        Self { broker, service }
    }

    /// Bind the work queue, announce "on", and serve until `shutdown` is
    /// cancelled (then announce "off"). Broker failures during setup are
    /// fatal: a service that cannot reach the broker must not pretend to
    /// run.
    pub async fn serve(&self, shutdown: CancellationToken) -> Result<()> {
        let desc = self.service.descriptor().clone();

        self.broker
            .declare_exchange(REQUEST_EXCHANGE, ExchangeKind::Direct)
            .await?;
        self.broker.declare_queue(&desc.name, false).await?;
        // Drop requests queued for a previous incarnation.
        self.broker.purge_queue(&desc.name).await?;
        self.broker
            .bind_queue(&desc.name, REQUEST_EXCHANGE, &desc.routing_key)
            .await?;
        let mut consumer = self.broker.consume(&desc.name, AckMode::Manual).await?;

        self.announce(&desc, ServiceState::On).await?;
        tracing::info!(
            service = %desc.name,
            routing_key = %desc.routing_key,
            operations = desc.operations.len(),
            "serving requests"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                maybe = consumer.recv() => match maybe {
                    Some(delivery) => self.handle_delivery(delivery).await,
                    None => break,
                },
            }
        }

        if let Err(e) = self.announce(&desc, ServiceState::Off).await {
            tracing::warn!(service = %desc.name, error = %e, "offline announcement failed");
        }
        tracing::info!(service = %desc.name, "stopped serving");
        Ok(())
    }

    /// Publish a persistent lifecycle event on the shared topic.
    async fn announce(&self, desc: &ServiceDescriptor, state: ServiceState) -> Result<()> {
        self.broker
            .declare_exchange(LIFECYCLE_EXCHANGE, ExchangeKind::Topic)
            .await?;
        self.broker.declare_queue(LIFECYCLE_QUEUE, true).await?;
        self.broker
            .bind_queue(LIFECYCLE_QUEUE, LIFECYCLE_EXCHANGE, LIFECYCLE_ROUTING_KEY)
            .await?;

        let event = LifecycleEvent { info: desc.clone(), state };
        self.broker
            .publish(
                LIFECYCLE_EXCHANGE,
                LIFECYCLE_ROUTING_KEY,
                event.encode(),
                Properties { persistent: true, ..Properties::default() },
            )
            .await?;
        tracing::info!(service = %desc.name, ?state, "lifecycle announced");
        Ok(())
    }

    async fn handle_delivery(&self, delivery: Delivery) {
        let reply = ReplyHandle {
            broker: self.broker.clone(),
            reply_to: delivery.properties.reply_to.clone(),
            correlation_id: delivery.properties.correlation_id.clone(),
        };

        // DECODE
        let request = match RequestEnvelope::decode(&delivery.body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "malformed request envelope");
                let response = ResponseEnvelope::exception(
                    "",
                    WireError::new(WireErrorKind::Decode, e.to_string()),
                );
                if reply.send(&response).await.is_ok() {
                    delivery.ack();
                }
                return;
            }
        };

        // DISPATCH
        let method = request.method.clone();
        let response = match self.service.operations().get(&method) {
            Some(operation) => {
                let args = request.args.normalize();
                match operation.invoke(&args).await {
                    Ok(payload) => ResponseEnvelope::pass(&method, payload.into_wire()),
                    Err(e) => {
                        tracing::warn!(operation = %method, error = %e, "handler fault");
                        ResponseEnvelope::exception(&method, WireError::from(&e))
                    }
                }
            }
            None if self.service.is_special_request(&method) => {
                // Diverted: the hook owns the reply path.
                if let Err(e) = self
                    .service
                    .handle_special_request(request, reply.clone())
                    .await
                {
                    tracing::warn!(operation = %method, error = %e, "special request failed");
                    let response = ResponseEnvelope::exception(&method, WireError::from(&e));
                    if reply.send(&response).await.is_err() {
                        return; // left unacked for redelivery
                    }
                }
                delivery.ack();
                return;
            }
            None => {
                tracing::debug!(operation = %method, "operation not exposed");
                ResponseEnvelope::unsupported(&method)
            }
        };

        // REPLY, then ACK. A failed publish leaves the message unacked so
        // the broker redelivers it.
        match reply.send(&response).await {
            Ok(()) => delivery.ack(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to publish reply; message left unacked");
            }
        }
    }
}
