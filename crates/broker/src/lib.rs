//! Message broker abstraction.
//!
//! Everything above this crate talks to the message transport through the
//! [`Broker`] trait: declare exchanges and queues, bind, publish with
//! `reply_to`/`correlation_id` properties, and consume with explicit acks.
//! [`MemoryBroker`] is the in-process implementation used by tests and the
//! reference binary; an AMQP-backed implementation would slot in behind
//! the same trait.

pub mod api;
pub mod memory;
mod topic;

pub use api::{AckMode, Broker, Consumer, Delivery, ExchangeKind, Properties};
pub use memory::MemoryBroker;
