//! Reference "hello-world" service for Switchyard.
//!
//! Runs a directory and one service over the in-process broker, then
//! exercises the loop end to end: direct calls, a snapshot pull, and an
//! alias call rewritten by the directory.
//!
//! The service advertises three operations:
//!
//! - `ping`       — pong with a timestamp
//! - `say`        — echo the arguments back, space-joined
//! - `read_text`  — read a text file (from an allowlisted directory)
//!
//! Usage:
//!   sy-hello-service [config.toml]
//!
//! Env vars:
//!   SY_ALLOWED_DIR   — directory allowed for read_text (default: ".")

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sy_broker::MemoryBroker;
use sy_directory::{DirectoryService, JsonAliasStore};
use sy_domain::{Config, Error};
use sy_protocol::{Payload, REQUEST_EXCHANGE, RequestArgs, RequestEnvelope};
use sy_service::{BuiltService, RpcServer, ServiceBuilder, call, operation_fn};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "switchyard.toml".into());
    let config = Config::load(Path::new(&config_path))?;
    for issue in config.validate() {
        tracing::warn!(%issue, "config issue");
    }

    let allowed_dir = PathBuf::from(
        std::env::var("SY_ALLOWED_DIR").unwrap_or_else(|_| ".".into()),
    );
    let deadline = Duration::from_millis(config.call.deadline_ms);
    let broker: Arc<MemoryBroker> = Arc::new(MemoryBroker::new());
    let shutdown = CancellationToken::new();

    // Directory first, so its listener catches the service's announcement.
    let directory = Arc::new(DirectoryService::new(
        broker.clone(),
        Arc::new(JsonAliasStore::new(config.directory.alias_path.clone())),
        &config.directory.update_exchange_prefix,
        Duration::from_millis(config.directory.forward_deadline_ms),
    )?);
    let directory_task = tokio::spawn({
        let directory = directory.clone();
        let token = shutdown.clone();
        async move { directory.run(token).await }
    });
    tokio::task::yield_now().await;

    let server = RpcServer::new(broker.clone(), Arc::new(hello_service(allowed_dir)));
    let service_task = tokio::spawn({
        let token = shutdown.clone();
        async move { server.serve(token).await }
    });
    tokio::task::yield_now().await;

    // Direct call.
    let request = RequestEnvelope::new(
        "say",
        RequestArgs::List(vec!["hello".into(), "switchyard".into()]),
    );
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.hello", &request, deadline).await?;
    tracing::info!(result = ?reply.result, data = %reply.result_data, "say replied");

    // Snapshot pull from the directory.
    let request = RequestEnvelope::new("get_services_info", RequestArgs::None);
    let reply = call(
        broker.as_ref(),
        REQUEST_EXCHANGE,
        sy_directory::service::DIRECTORY_ROUTING_KEY,
        &request,
        deadline,
    )
    .await?;
    let snapshot: std::collections::BTreeMap<String, sy_protocol::ServiceDescriptor> =
        serde_json::from_str(&reply.result_data)?;
    tracing::info!(
        services = snapshot.len(),
        names = ?snapshot.keys().collect::<Vec<_>>(),
        "directory snapshot"
    );

    // Install an alias at runtime, then call through it.
    let alias_table =
        r#"{ "greet": { "service": "hello", "operation": "say", "arguments": "${input},(via,alias)" } }"#;
    let request = RequestEnvelope::new(
        "update_alias_conf",
        RequestArgs::Scalar(alias_table.into()),
    );
    call(
        broker.as_ref(),
        REQUEST_EXCHANGE,
        sy_directory::service::DIRECTORY_ROUTING_KEY,
        &request,
        deadline,
    )
    .await?;

    let request = RequestEnvelope::new("greet", RequestArgs::Scalar("hello".into()));
    let reply = call(
        broker.as_ref(),
        REQUEST_EXCHANGE,
        sy_directory::service::DIRECTORY_ROUTING_KEY,
        &request,
        deadline,
    )
    .await?;
    tracing::info!(result = ?reply.result, data = %reply.result_data, "alias call replied");

    shutdown.cancel();
    directory_task.await??;
    service_task.await??;
    tracing::info!("hello service exiting");
    Ok(())
}

fn hello_service(allowed_dir: PathBuf) -> BuiltService {
    ServiceBuilder::new("hello", "svc.hello")
        .description("Reference service exercising the RPC loop.")
        .short_desc("hello world")
        .group("examples")
        .version(env!("CARGO_PKG_VERSION"))
        .operation(
            "ping",
            "Pong with the current timestamp.\nReturns: str\n",
            operation_fn(|_args| async {
                Ok(Payload::Text(format!("pong {}", Utc::now().timestamp_millis())))
            }),
        )
        .operation(
            "say",
            "* `words` / Condition: optional / Type: list / Words to echo\nReturns: str\n",
            operation_fn(|args: Vec<String>| async move { Ok(Payload::Text(args.join(" "))) }),
        )
        .operation(
            "read_text",
            "* `path` / Condition: required / Type: str / File to read, relative to the allowed directory\nReturns: str\n",
            operation_fn(move |args: Vec<String>| {
                let allowed_dir = allowed_dir.clone();
                async move { read_text(&allowed_dir, &args) }
            }),
        )
        .build()
}

fn read_text(allowed_dir: &Path, args: &[String]) -> sy_domain::Result<Payload> {
    let path = args
        .first()
        .ok_or_else(|| Error::Handler("missing 'path' argument".into()))?;

    // Resolve and keep the read inside the allowed directory.
    let canonical_dir = allowed_dir
        .canonicalize()
        .map_err(|e| Error::Handler(format!("allowed dir error: {e}")))?;
    let canonical_file = allowed_dir
        .join(path)
        .canonicalize()
        .map_err(|e| Error::Handler(format!("file not found: {e}")))?;
    if !canonical_file.starts_with(&canonical_dir) {
        return Err(Error::Handler(
            "path traversal outside allowed directory".into(),
        ));
    }

    let content = std::fs::read_to_string(&canonical_file)
        .map_err(|e| Error::Handler(format!("read error: {e}")))?;
    Ok(Payload::Text(content))
}
