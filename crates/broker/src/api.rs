//! The broker surface Switchyard consumes. Kept to the minimum the RPC
//! server, call primitive, and directory need.

use async_trait::async_trait;
use sy_domain::Result;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    /// Exact routing-key match.
    Direct,
    /// `.`-separated pattern match with `*` and `#` wildcards.
    Topic,
    /// Every bound queue receives every message.
    Fanout,
}

/// Message properties carried alongside the body.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    /// Caller-chosen token pairing a request with its reply.
    pub correlation_id: Option<String>,
    /// Queue the reply should be published to (default exchange).
    pub reply_to: Option<String>,
    /// Survive broker restart (delivery mode 2 in AMQP terms). The memory
    /// broker records it without acting on it.
    pub persistent: bool,
}

/// How deliveries are acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// One delivery in flight at a time; the next arrives only after
    /// [`Delivery::ack`]. Dropping an unacked delivery requeues it.
    Manual,
    /// Deliveries are considered handled as soon as they are received.
    Auto,
}

/// One received message. In [`AckMode::Manual`] the consumer must call
/// [`ack`](Self::ack) after handling; dropping the delivery unacked puts
/// the message back at the front of the queue (at-least-once).
#[derive(Debug)]
pub struct Delivery {
    pub routing_key: String,
    pub body: Vec<u8>,
    pub properties: Properties,
    pub(crate) acker: Option<oneshot::Sender<()>>,
}

impl Delivery {
    pub fn ack(mut self) {
        if let Some(tx) = self.acker.take() {
            let _ = tx.send(());
        }
    }
}

/// Receiving half of a subscription. Dropping it cancels the consume loop;
/// any unacked delivery is requeued.
pub struct Consumer {
    pub(crate) rx: mpsc::Receiver<Delivery>,
}

impl Consumer {
    /// Next delivery, or `None` once the queue is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait Broker: Send + Sync {
    async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<()>;

    async fn delete_exchange(&self, name: &str) -> Result<()>;

    /// Declare a named queue. Idempotent.
    async fn declare_queue(&self, name: &str, durable: bool) -> Result<()>;

    /// Declare a server-named exclusive queue for replies; returns the
    /// generated name. The caller deletes it when the call completes.
    async fn declare_ephemeral_queue(&self) -> Result<String>;

    async fn delete_queue(&self, name: &str) -> Result<()>;

    async fn bind_queue(&self, queue: &str, exchange: &str, routing_key: &str) -> Result<()>;

    /// Drop all messages currently sitting in the queue.
    async fn purge_queue(&self, queue: &str) -> Result<()>;

    /// Publish to an exchange. The empty exchange name is the default
    /// exchange: the routing key addresses a queue directly.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
        properties: Properties,
    ) -> Result<()>;

    async fn consume(&self, queue: &str, mode: AckMode) -> Result<Consumer>;
}
