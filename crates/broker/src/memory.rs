//! In-process broker.
//!
//! Exchanges and bindings live in one `parking_lot`-guarded table; each
//! queue is a `VecDeque` plus a `Notify`. A consume subscription spawns a
//! task that feeds deliveries into a bounded channel, one at a time in
//! manual-ack mode so a service never has more than one message in flight.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sy_domain::{Error, Result};
use tokio::sync::{Notify, mpsc, oneshot};

use crate::api::{AckMode, Broker, Consumer, Delivery, ExchangeKind, Properties};
use crate::topic;

#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    exchanges: HashMap<String, Exchange>,
    queues: HashMap<String, Arc<Queue>>,
}

struct Exchange {
    kind: ExchangeKind,
    bindings: Vec<Binding>,
}

struct Binding {
    queue: String,
    key: String,
}

struct Queue {
    messages: Mutex<VecDeque<Stored>>,
    notify: Notify,
    closed: AtomicBool,
}

#[derive(Clone)]
struct Stored {
    routing_key: String,
    body: Vec<u8>,
    properties: Properties,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, name: &str) -> Result<Arc<Queue>> {
        self.inner
            .state
            .lock()
            .queues
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Broker(format!("unknown queue: {name}")))
    }
}

impl Queue {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        })
    }

    fn push_back(&self, msg: Stored) {
        self.messages.lock().push_back(msg);
        self.notify.notify_one();
    }

    fn push_front(&self, msg: Stored) {
        self.messages.lock().push_front(msg);
        self.notify.notify_one();
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<()> {
        let mut state = self.inner.state.lock();
        match state.exchanges.get(name) {
            Some(existing) if existing.kind != kind => Err(Error::Broker(format!(
                "exchange {name} already declared as {:?}",
                existing.kind
            ))),
            Some(_) => Ok(()),
            None => {
                state
                    .exchanges
                    .insert(name.into(), Exchange { kind, bindings: Vec::new() });
                Ok(())
            }
        }
    }

    async fn delete_exchange(&self, name: &str) -> Result<()> {
        self.inner.state.lock().exchanges.remove(name);
        Ok(())
    }

    async fn declare_queue(&self, name: &str, _durable: bool) -> Result<()> {
        self.inner
            .state
            .lock()
            .queues
            .entry(name.into())
            .or_insert_with(Queue::new);
        Ok(())
    }

    async fn declare_ephemeral_queue(&self) -> Result<String> {
        let name = format!("reply.{}", uuid::Uuid::new_v4());
        self.inner.state.lock().queues.insert(name.clone(), Queue::new());
        Ok(name)
    }

    async fn delete_queue(&self, name: &str) -> Result<()> {
        let mut state = self.inner.state.lock();
        if let Some(queue) = state.queues.remove(name) {
            queue.closed.store(true, Ordering::SeqCst);
            // notify_one stores a permit, so a consumer that has not yet
            // started waiting still observes the close.
            queue.notify.notify_one();
        }
        for exchange in state.exchanges.values_mut() {
            exchange.bindings.retain(|b| b.queue != name);
        }
        Ok(())
    }

    async fn bind_queue(&self, queue: &str, exchange: &str, routing_key: &str) -> Result<()> {
        let mut state = self.inner.state.lock();
        if !state.queues.contains_key(queue) {
            return Err(Error::Broker(format!("unknown queue: {queue}")));
        }
        let ex = state
            .exchanges
            .get_mut(exchange)
            .ok_or_else(|| Error::Broker(format!("unknown exchange: {exchange}")))?;
        let dup = ex
            .bindings
            .iter()
            .any(|b| b.queue == queue && b.key == routing_key);
        if !dup {
            ex.bindings.push(Binding { queue: queue.into(), key: routing_key.into() });
        }
        Ok(())
    }

    async fn purge_queue(&self, queue: &str) -> Result<()> {
        let queue = self.queue(queue)?;
        let dropped = {
            let mut messages = queue.messages.lock();
            let n = messages.len();
            messages.clear();
            n
        };
        if dropped > 0 {
            tracing::debug!(dropped, "purged queue");
        }
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
        properties: Properties,
    ) -> Result<()> {
        let targets: Vec<Arc<Queue>> = {
            let state = self.inner.state.lock();
            if exchange.is_empty() {
                // Default exchange: the routing key names a queue.
                state.queues.get(routing_key).cloned().into_iter().collect()
            } else {
                let ex = state
                    .exchanges
                    .get(exchange)
                    .ok_or_else(|| Error::Broker(format!("unknown exchange: {exchange}")))?;
                ex.bindings
                    .iter()
                    .filter(|b| match ex.kind {
                        ExchangeKind::Direct => b.key == routing_key,
                        ExchangeKind::Topic => topic::matches(&b.key, routing_key),
                        ExchangeKind::Fanout => true,
                    })
                    .filter_map(|b| state.queues.get(&b.queue).cloned())
                    .collect()
            }
        };

        if targets.is_empty() {
            tracing::debug!(exchange, routing_key, "unroutable message dropped");
            return Ok(());
        }

        let stored = Stored { routing_key: routing_key.into(), body, properties };
        for queue in targets {
            queue.push_back(stored.clone());
        }
        Ok(())
    }

    async fn consume(&self, queue: &str, mode: AckMode) -> Result<Consumer> {
        let queue = self.queue(queue)?;
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            loop {
                let stored = loop {
                    if queue.closed.load(Ordering::SeqCst) {
                        return;
                    }
                    if let Some(msg) = queue.messages.lock().pop_front() {
                        break msg;
                    }
                    queue.notify.notified().await;
                };

                match mode {
                    AckMode::Auto => {
                        let delivery = Delivery {
                            routing_key: stored.routing_key.clone(),
                            body: stored.body.clone(),
                            properties: stored.properties.clone(),
                            acker: None,
                        };
                        if tx.send(delivery).await.is_err() {
                            queue.push_front(stored);
                            return;
                        }
                    }
                    AckMode::Manual => {
                        // Keep a copy so an unacked delivery can be requeued.
                        let (ack_tx, ack_rx) = oneshot::channel();
                        let delivery = Delivery {
                            routing_key: stored.routing_key.clone(),
                            body: stored.body.clone(),
                            properties: stored.properties.clone(),
                            acker: Some(ack_tx),
                        };
                        if tx.send(delivery).await.is_err() {
                            queue.push_front(stored);
                            return;
                        }
                        // The next delivery waits until this one is acked
                        // (prefetch of one). A dropped, unacked delivery is
                        // put back at the front for redelivery.
                        if ack_rx.await.is_err() {
                            queue.push_front(stored);
                        }
                    }
                }
            }
        });

        Ok(Consumer { rx })
    }
}
