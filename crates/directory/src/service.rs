//! The directory's RPC surface and alias dispatch hook.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use sy_broker::Broker;
use sy_domain::{Error, Result};
use sy_protocol::{
    REQUEST_EXCHANGE, RequestArgs, RequestEnvelope, ServiceDescriptor,
};
use sy_service::{
    OperationTable, ReplyHandle, RpcServer, Service, ServiceBuilder, call_raw, operation_fn,
};
use tokio_util::sync::CancellationToken;

use crate::alias::AliasTable;
use crate::listener::spawn_listener;
use crate::store::AliasStore;
use crate::table::DirectoryTable;

pub const DIRECTORY_NAME: &str = "directory";
pub const DIRECTORY_ROUTING_KEY: &str = "svc.directory";

const GET_SERVICES_INFO_DOC: &str = "\
Get the current name-to-descriptor map of online services.
Returns: json
";
const GET_UPDATE_EXCHANGE_DOC: &str = "\
Get the name of this directory's snapshot fanout exchange.
Returns: str
";
const GET_ALIAS_CONF_DOC: &str = "\
Get the serialized alias table.
Returns: json
";
const UPDATE_ALIAS_CONF_DOC: &str = "\
Replace the alias table with the given serialized one.

* `table` / Condition: required / Type: json / Full alias table
Returns: str
";

/// The directory as a servable RPC service. Requests for exposed
/// operations take the standard path; requests whose name matches an alias
/// are diverted into [`handle_special_request`](Service::handle_special_request),
/// rewritten, and forwarded to the resolved target.
pub struct DirectoryService {
    broker: Arc<dyn Broker>,
    table: Arc<DirectoryTable>,
    aliases: Arc<RwLock<AliasTable>>,
    update_exchange: String,
    forward_deadline: Duration,
    descriptor: ServiceDescriptor,
    operations: OperationTable,
}

impl DirectoryService {
    /// Assemble the directory. The alias table is loaded from `store`
    /// immediately; a store with nothing persisted yields an empty table.
    pub fn new(
        broker: Arc<dyn Broker>,
        store: Arc<dyn AliasStore>,
        update_exchange_prefix: &str,
        forward_deadline: Duration,
    ) -> Result<Self> {
        let table = Arc::new(DirectoryTable::new());
        let aliases = Arc::new(RwLock::new(store.load()?));
        let update_exchange = format!("{update_exchange_prefix}{}", uuid::Uuid::new_v4());
        tracing::info!(
            aliases = aliases.read().entries.len(),
            exchange = %update_exchange,
            "directory assembled"
        );

        let built = {
            let snapshot_table = table.clone();
            let exchange_name = update_exchange.clone();
            let read_aliases = aliases.clone();
            let write_aliases = aliases.clone();
            ServiceBuilder::new(DIRECTORY_NAME, DIRECTORY_ROUTING_KEY)
                .description("Tracks online services and dispatches alias calls.")
                .short_desc("service directory")
                .group("core")
                .operation(
                    "get_services_info",
                    GET_SERVICES_INFO_DOC,
                    operation_fn(move |_args| {
                        let table = snapshot_table.clone();
                        async move {
                            let json = serde_json::to_string(&table.snapshot())
                                .expect("snapshot serializes");
                            Ok(json.into())
                        }
                    }),
                )
                .operation(
                    "get_realtime_update_exchange",
                    GET_UPDATE_EXCHANGE_DOC,
                    operation_fn(move |_args| {
                        let name = exchange_name.clone();
                        async move { Ok(name.into()) }
                    }),
                )
                .operation(
                    "get_alias_conf",
                    GET_ALIAS_CONF_DOC,
                    operation_fn(move |_args| {
                        let aliases = read_aliases.clone();
                        async move { Ok(aliases.read().encode().into()) }
                    }),
                )
                .operation(
                    "update_alias_conf",
                    UPDATE_ALIAS_CONF_DOC,
                    operation_fn(move |args: Vec<String>| {
                        let aliases = write_aliases.clone();
                        let store = store.clone();
                        async move {
                            let raw = args.first().ok_or_else(|| {
                                Error::Handler(
                                    "update_alias_conf requires the serialized table".into(),
                                )
                            })?;
                            // Validate and persist before the in-memory swap,
                            // so a rejected table changes nothing.
                            let table = AliasTable::decode(raw)?;
                            store.save(&table)?;
                            let count = table.entries.len();
                            *aliases.write() = table;
                            tracing::info!(aliases = count, "alias table replaced");
                            Ok("ok".into())
                        }
                    }),
                )
                .build()
        };

        Ok(Self {
            broker,
            table,
            aliases,
            update_exchange,
            forward_deadline,
            descriptor: built.descriptor,
            operations: built.operations,
        })
    }

    /// The live service table, shared with the lifecycle listener.
    pub fn table(&self) -> Arc<DirectoryTable> {
        self.table.clone()
    }

    pub fn update_exchange(&self) -> &str {
        &self.update_exchange
    }

    /// Run listener and RPC server until `shutdown` is cancelled, then tear
    /// down the per-process fanout exchange.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<()> {
        let listener = spawn_listener(
            self.broker.clone(),
            self.table.clone(),
            self.update_exchange.clone(),
            shutdown.clone(),
        )
        .await?;

        let server = RpcServer::new(self.broker.clone(), self.clone());
        let served = server.serve(shutdown).await;

        if let Err(e) = self.broker.delete_exchange(&self.update_exchange).await {
            tracing::warn!(error = %e, "update exchange teardown failed");
        }
        if let Err(e) = listener.await {
            tracing::warn!(error = %e, "listener task panicked");
        }
        served
    }
}

#[async_trait]
impl Service for DirectoryService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn operations(&self) -> &OperationTable {
        &self.operations
    }

    fn is_special_request(&self, method: &str) -> bool {
        self.aliases.read().contains(method)
    }

    /// Resolve the alias, rewrite the arguments, forward to the target, and
    /// relay the raw reply under the caller's correlation token.
    async fn handle_special_request(
        &self,
        request: RequestEnvelope,
        reply: ReplyHandle,
    ) -> Result<()> {
        let alias = request.method.clone();
        let entry = self
            .aliases
            .read()
            .get(&alias)
            .cloned()
            .ok_or_else(|| Error::UnknownOperation(alias.clone()))?;

        let routing_key = self.table.routing_key_of(&entry.service).ok_or_else(|| {
            Error::Alias(format!(
                "alias {alias} targets {}, which is not online",
                entry.service
            ))
        })?;

        let args = entry.expand(&alias, &request.args.normalize())?;
        tracing::debug!(
            alias = %alias,
            target = %entry.service,
            operation = %entry.operation,
            "forwarding alias call"
        );

        let forwarded = RequestEnvelope::new(&entry.operation, RequestArgs::List(args));
        let raw = call_raw(
            self.broker.as_ref(),
            REQUEST_EXCHANGE,
            &routing_key,
            &forwarded,
            self.forward_deadline,
        )
        .await?;
        reply.send_raw(raw).await
    }
}
