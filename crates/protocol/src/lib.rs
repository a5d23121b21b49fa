//! Switchyard wire protocol: request/response envelopes, the service
//! capability descriptor, lifecycle announcements, and payload encoding.
//!
//! Services bind a work queue to [`REQUEST_EXCHANGE`] under their routing
//! key, announce themselves on [`LIFECYCLE_EXCHANGE`], and answer each
//! [`RequestEnvelope`] with exactly one [`ResponseEnvelope`] published to
//! the caller's `reply_to` queue.

pub mod descriptor;
pub mod envelope;
pub mod lifecycle;
pub mod payload;

pub use descriptor::{ArgCondition, ArgumentSpec, OperationInfo, ServiceDescriptor};
pub use envelope::{
    RequestArgs, RequestEnvelope, ResponseEnvelope, ResultStatus, WireError, WireErrorKind,
};
pub use lifecycle::{LifecycleEvent, ServiceState};
pub use payload::Payload;

/// Direct exchange carrying RPC requests, keyed by target routing key.
pub const REQUEST_EXCHANGE: &str = "services.request";

/// Topic exchange carrying lifecycle announcements.
pub const LIFECYCLE_EXCHANGE: &str = "service.lifecycle";

/// Durable queue the directory drains for lifecycle events.
pub const LIFECYCLE_QUEUE: &str = "service.lifecycle.events";

/// Routing key lifecycle announcements are published under.
pub const LIFECYCLE_ROUTING_KEY: &str = "service.lifecycle";

/// Fixed payload returned for an operation the target does not expose.
pub const UNSUPPORTED_PAYLOAD: &str = "unsupported operation";
