//! Lifecycle announcements: one "on" at startup, one "off" at shutdown.

use serde::{Deserialize, Serialize};

use crate::descriptor::ServiceDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub info: ServiceDescriptor,
    pub state: ServiceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    On,
    Off,
}

impl LifecycleEvent {
    pub fn online(info: ServiceDescriptor) -> Self {
        Self { info, state: ServiceState::On }
    }

    pub fn offline(info: ServiceDescriptor) -> Self {
        Self { info, state: ServiceState::Off }
    }

    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("lifecycle event serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn desc(name: &str) -> ServiceDescriptor {
        ServiceDescriptor {
            name: name.into(),
            description: String::new(),
            short_desc: String::new(),
            group: String::new(),
            tag: String::new(),
            version: "1.0.0".into(),
            routing_key: format!("svc.{name}"),
            gui_support: false,
            operations: vec![],
            operation_info: BTreeMap::new(),
        }
    }

    #[test]
    fn state_serializes_lowercase() {
        let event = LifecycleEvent::online(desc("a"));
        let json = String::from_utf8(event.encode()).unwrap();
        assert!(json.contains(r#""state":"on""#));

        let off = LifecycleEvent::offline(desc("a"));
        let json = String::from_utf8(off.encode()).unwrap();
        assert!(json.contains(r#""state":"off""#));
    }
}
