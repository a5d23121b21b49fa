//! The live table of online services.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sy_protocol::{LifecycleEvent, ServiceDescriptor, ServiceState};

/// One tracked service.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub descriptor: ServiceDescriptor,
    /// When the "on" event was applied.
    pub registered_at: DateTime<Utc>,
}

/// Name → descriptor table fed by lifecycle events. Shared between the
/// listener task and the RPC surface, so all access goes through a lock.
#[derive(Default)]
pub struct DirectoryTable {
    entries: RwLock<HashMap<String, DirectoryEntry>>,
}

impl DirectoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one lifecycle event. "on" inserts an absent service, "off"
    /// removes a present one; anything else is a no-op, so duplicate and
    /// stale events converge to the same table. Returns whether the table
    /// changed.
    pub fn apply(&self, event: LifecycleEvent) -> bool {
        let name = event.info.name.clone();
        let mut entries = self.entries.write();
        match event.state {
            ServiceState::On => {
                if entries.contains_key(&name) {
                    tracing::debug!(service = %name, "duplicate online event ignored");
                    return false;
                }
                entries.insert(
                    name.clone(),
                    DirectoryEntry { descriptor: event.info, registered_at: Utc::now() },
                );
                tracing::info!(service = %name, "service online");
                true
            }
            ServiceState::Off => {
                let removed = entries.remove(&name).is_some();
                if removed {
                    tracing::info!(service = %name, "service offline");
                } else {
                    tracing::debug!(service = %name, "offline event for unknown service");
                }
                removed
            }
        }
    }

    /// Sorted name → descriptor view, the shape broadcast to subscribers
    /// and returned by `get_services_info`.
    pub fn snapshot(&self) -> BTreeMap<String, ServiceDescriptor> {
        self.entries
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.descriptor.clone()))
            .collect()
    }

    pub fn routing_key_of(&self, service: &str) -> Option<String> {
        self.entries
            .read()
            .get(service)
            .map(|entry| entry.descriptor.routing_key.clone())
    }

    pub fn contains(&self, service: &str) -> bool {
        self.entries.read().contains_key(service)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

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
            operation_info: Map::new(),
        }
    }

    #[test]
    fn event_sequences_converge() {
        let table = DirectoryTable::new();
        assert!(table.apply(LifecycleEvent::online(desc("a"))));
        assert!(table.apply(LifecycleEvent::online(desc("b"))));
        assert!(table.apply(LifecycleEvent::offline(desc("a"))));

        let snapshot = table.snapshot();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn duplicate_events_are_noops() {
        let table = DirectoryTable::new();
        assert!(table.apply(LifecycleEvent::online(desc("a"))));
        assert!(!table.apply(LifecycleEvent::online(desc("a"))));
        assert_eq!(table.len(), 1);

        assert!(table.apply(LifecycleEvent::offline(desc("a"))));
        assert!(!table.apply(LifecycleEvent::offline(desc("a"))));
        assert!(table.is_empty());
    }

    #[test]
    fn routing_key_lookup() {
        let table = DirectoryTable::new();
        table.apply(LifecycleEvent::online(desc("files")));
        assert_eq!(table.routing_key_of("files").as_deref(), Some("svc.files"));
        assert!(table.routing_key_of("ghost").is_none());
    }
}
