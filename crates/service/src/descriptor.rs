//! Builds a service's immutable [`ServiceDescriptor`] and operation table.
//!
//! Operations are listed explicitly at construction — name, handler, and a
//! doc block parsed best-effort by [`crate::docinfo`] — so the announced
//! descriptor is complete and final before the first lifecycle event goes
//! out.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use sy_protocol::{OperationInfo, ServiceDescriptor};

use crate::operation::{Operation, OperationTable};
use crate::standard;

pub struct ServiceBuilder {
    name: String,
    description: String,
    short_desc: String,
    group: String,
    tag: String,
    version: String,
    routing_key: String,
    gui_support: bool,
    gui_dir: PathBuf,
    table: OperationTable,
    info: BTreeMap<String, OperationInfo>,
}

/// The frozen result: descriptor plus dispatch table. Implements
/// [`crate::Service`] directly for services that need no special-request
/// hook.
pub struct BuiltService {
    pub descriptor: ServiceDescriptor,
    pub operations: OperationTable,
}

impl ServiceBuilder {
    pub fn new(name: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            short_desc: String::new(),
            group: String::new(),
            tag: String::new(),
            version: "1.0.0".into(),
            routing_key: routing_key.into(),
            gui_support: false,
            gui_dir: PathBuf::from("guis"),
            table: OperationTable::new(),
            info: BTreeMap::new(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn short_desc(mut self, text: impl Into<String>) -> Self {
        self.short_desc = text.into();
        self
    }

    pub fn group(mut self, text: impl Into<String>) -> Self {
        self.group = text.into();
        self
    }

    pub fn tag(mut self, text: impl Into<String>) -> Self {
        self.tag = text.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable the gui capability: `get_gui_files` is exposed and bundles
    /// `gui_dir`.
    pub fn gui_support(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gui_support = true;
        self.gui_dir = dir.into();
        self
    }

    /// Register one exposed operation. The doc block is parsed with the
    /// fixed grammar; a missing or unparseable block is logged and yields
    /// no metadata, never an error.
    pub fn operation(
        mut self,
        name: impl Into<String>,
        doc: &str,
        handler: Arc<dyn Operation>,
    ) -> Self {
        let name = name.into();
        if doc.trim().is_empty() {
            tracing::warn!(operation = %name, "operation has no doc block");
        } else {
            let info = crate::docinfo::parse(doc);
            if info.arguments.is_empty() && info.return_type.is_none() {
                tracing::warn!(
                    operation = %name,
                    "doc block did not match the argument grammar"
                );
            }
            self.info.insert(name.clone(), info);
        }
        self.table.register(name, handler);
        self
    }

    /// Freeze the descriptor. Standard operations are appended here:
    /// `get_version` always, `get_gui_files` only for gui-capable services.
    pub fn build(mut self) -> BuiltService {
        let version = self.version.clone();
        self = self.operation(
            standard::GET_VERSION,
            standard::GET_VERSION_DOC,
            standard::version_operation(version),
        );
        if self.gui_support {
            let dir = self.gui_dir.clone();
            self = self.operation(
                standard::GET_GUI_FILES,
                standard::GET_GUI_FILES_DOC,
                standard::gui_files_operation(dir),
            );
        }

        let descriptor = ServiceDescriptor {
            name: self.name,
            description: self.description,
            short_desc: self.short_desc,
            group: self.group,
            tag: self.tag,
            version: self.version,
            routing_key: self.routing_key,
            gui_support: self.gui_support,
            operations: self.table.names(),
            operation_info: self.info,
        };
        BuiltService { descriptor, operations: self.table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::operation_fn;
    use sy_protocol::Payload;

    fn noop() -> Arc<dyn Operation> {
        operation_fn(|_| async { Ok(Payload::Text(String::new())) })
    }

    #[test]
    fn gui_operation_gated_on_capability() {
        let plain = ServiceBuilder::new("plain", "svc.plain").build();
        assert!(!plain.descriptor.operations.contains(&"get_gui_files".to_string()));
        assert!(plain.descriptor.operations.contains(&"get_version".to_string()));

        let gui = ServiceBuilder::new("gui", "svc.gui")
            .gui_support("assets")
            .build();
        assert!(gui.descriptor.operations.contains(&"get_gui_files".to_string()));
        assert!(gui.operations.contains("get_gui_files"));
    }

    #[test]
    fn descriptor_folds_doc_metadata() {
        let built = ServiceBuilder::new("files", "svc.files")
            .version("0.2.0")
            .operation(
                "read",
                "* `path` / Condition: required / Type: str\nReturns: str\n",
                noop(),
            )
            .operation("undocumented", "", noop())
            .build();

        let info = built.descriptor.operation_info.get("read").unwrap();
        assert_eq!(info.arguments.len(), 1);
        assert_eq!(info.return_type.as_deref(), Some("str"));

        // No doc block → exposed, but no metadata entry.
        assert!(built.descriptor.operations.contains(&"undocumented".to_string()));
        assert!(!built.descriptor.operation_info.contains_key("undocumented"));

        assert_eq!(built.descriptor.version, "0.2.0");
        assert_eq!(
            built.descriptor.operations,
            vec!["read", "undocumented", "get_version"]
        );
    }
}
