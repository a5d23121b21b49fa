//! The self-reported capability manifest a service announces on startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Capability descriptor, built exactly once at service construction and
/// immutable thereafter: the exposed-operation set cannot change while the
/// service is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub description: String,
    pub short_desc: String,
    pub group: String,
    pub tag: String,
    /// Semantic version string, e.g. "1.0.0".
    pub version: String,
    /// Routing key the service's work queue is bound under.
    pub routing_key: String,
    pub gui_support: bool,
    /// Exposed operation names, in registration order.
    pub operations: Vec<String>,
    /// Best-effort per-operation metadata. Absence never blocks exposure.
    #[serde(default)]
    pub operation_info: BTreeMap<String, OperationInfo>,
}

/// Parsed documentation for one operation. Purely informational: dispatch
/// never consults it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationInfo {
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub condition: ArgCondition,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub arg_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgCondition {
    Required,
    Optional,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_round_trips() {
        let desc = ServiceDescriptor {
            name: "echo".into(),
            description: "Echo service".into(),
            short_desc: "echo".into(),
            group: "demo".into(),
            tag: "".into(),
            version: "1.0.0".into(),
            routing_key: "svc.echo".into(),
            gui_support: false,
            operations: vec!["echo".into(), "get_version".into()],
            operation_info: BTreeMap::new(),
        };
        let json = serde_json::to_string(&desc).unwrap();
        let back: ServiceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(desc, back);
    }

    #[test]
    fn argument_spec_type_field_is_renamed() {
        let spec = ArgumentSpec {
            name: "path".into(),
            condition: ArgCondition::Required,
            arg_type: Some("str".into()),
            default: None,
            description: None,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains(r#""type":"str""#));
        assert!(json.contains(r#""condition":"required""#));
    }
}
