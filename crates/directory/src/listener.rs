//! Lifecycle listener: feeds the table and fans out snapshots.

use std::sync::Arc;

use sy_broker::{AckMode, Broker, ExchangeKind, Properties};
use sy_domain::Result;
use sy_protocol::{
    LIFECYCLE_EXCHANGE, LIFECYCLE_QUEUE, LIFECYCLE_ROUTING_KEY, LifecycleEvent,
};
use tokio_util::sync::CancellationToken;

use crate::table::DirectoryTable;

/// Bind the shared lifecycle queue and the per-process snapshot fanout,
/// then spawn the listener loop. Binding happens before this returns, so
/// no announcement published afterwards can be missed.
///
/// After every table mutation the serialized name → descriptor map is
/// broadcast on `update_exchange`; subscribers that join late pull the
/// same shape via `get_services_info`.
pub async fn spawn_listener(
    broker: Arc<dyn Broker>,
    table: Arc<DirectoryTable>,
    update_exchange: String,
    shutdown: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    broker
        .declare_exchange(LIFECYCLE_EXCHANGE, ExchangeKind::Topic)
        .await?;
    broker.declare_queue(LIFECYCLE_QUEUE, true).await?;
    broker
        .bind_queue(LIFECYCLE_QUEUE, LIFECYCLE_EXCHANGE, LIFECYCLE_ROUTING_KEY)
        .await?;
    broker
        .declare_exchange(&update_exchange, ExchangeKind::Fanout)
        .await?;
    let mut consumer = broker.consume(LIFECYCLE_QUEUE, AckMode::Auto).await?;

    Ok(tokio::spawn(async move {
        tracing::info!(exchange = %update_exchange, "lifecycle listener running");
        loop {
            let delivery = tokio::select! {
                _ = shutdown.cancelled() => break,
                maybe = consumer.recv() => match maybe {
                    Some(delivery) => delivery,
                    None => break,
                },
            };

            let event = match LifecycleEvent::decode(&delivery.body) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed lifecycle event skipped");
                    continue;
                }
            };

            if table.apply(event) {
                let snapshot = serde_json::to_vec(&table.snapshot())
                    .expect("snapshot serializes");
                if let Err(e) = broker
                    .publish(&update_exchange, "", snapshot, Properties::default())
                    .await
                {
                    tracing::warn!(error = %e, "snapshot broadcast failed");
                }
            }
        }
        tracing::info!("lifecycle listener stopped");
    }))
}
