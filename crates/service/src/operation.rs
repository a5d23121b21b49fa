//! Operation registration table — maps exposed operation names to handlers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use sy_domain::Result;
use sy_protocol::Payload;

/// Implement this trait to handle one exposed operation.
///
/// Arguments arrive already normalized to a positional list (absent → 0,
/// scalar → 1, list → spread). Handlers run on the Tokio runtime and may
/// perform async I/O. A returned error is classified as a handler fault
/// and relayed to the caller as an EXCEPTION response.
#[async_trait::async_trait]
pub trait Operation: Send + Sync + 'static {
    async fn invoke(&self, args: &[String]) -> Result<Payload>;
}

/// Wrap an async closure as an [`Operation`].
///
/// ```rust,no_run
/// use sy_service::operation_fn;
/// use sy_protocol::Payload;
///
/// let echo = operation_fn(|args: Vec<String>| async move {
///     Ok(Payload::Text(args.join(" ")))
/// });
/// ```
pub fn operation_fn<F, Fut>(f: F) -> Arc<dyn Operation>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Payload>> + Send + 'static,
{
    Arc::new(FnOperation(f))
}

struct FnOperation<F>(F);

#[async_trait::async_trait]
impl<F, Fut> Operation for FnOperation<F>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Payload>> + Send + 'static,
{
    async fn invoke(&self, args: &[String]) -> Result<Payload> {
        (self.0)(args.to_vec()).await
    }
}

/// The exposed-operation set of one service, frozen at build time.
#[derive(Clone, Default)]
pub struct OperationTable {
    handlers: HashMap<String, Arc<dyn Operation>>,
    /// Exposed names in registration order.
    order: Vec<String>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Re-registering a name replaces the handler but
    /// keeps its original position.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Operation>) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Exposed operation names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
