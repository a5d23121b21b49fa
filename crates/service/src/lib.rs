//! Service-side building blocks: the operation registration table, the
//! capability descriptor builder, the RPC server loop, and the synchronous
//! call primitive.
//!
//! A service is assembled once at startup:
//!
//! 1. [`ServiceBuilder`] collects operations (name + handler + doc block)
//!    and folds them into an immutable [`ServiceDescriptor`].
//! 2. [`RpcServer::serve`] binds the work queue, announces the service on
//!    the lifecycle topic, and runs the receive-decode-dispatch-reply-ack
//!    loop until shutdown.
//! 3. [`call`]/[`call_raw`] let any party (including the directory) invoke
//!    one operation on one target and await the correlated reply.

pub mod call;
pub mod descriptor;
pub mod docinfo;
pub mod operation;
pub mod server;
pub mod standard;

pub use call::{call, call_raw};
pub use descriptor::{BuiltService, ServiceBuilder};
pub use operation::{Operation, OperationTable, operation_fn};
pub use server::{ReplyHandle, RpcServer, Service};
