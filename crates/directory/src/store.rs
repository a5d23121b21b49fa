//! Alias table persistence.

use std::path::PathBuf;

use sy_domain::{Error, Result};

use crate::alias::AliasTable;

/// Where the alias table lives between directory restarts.
pub trait AliasStore: Send + Sync {
    /// Load the persisted table. A store with nothing persisted yet yields
    /// an empty table, not an error.
    fn load(&self) -> Result<AliasTable>;

    fn save(&self, table: &AliasTable) -> Result<()>;
}

/// JSON file store. Saves go through a temp file in the same directory and
/// a rename, so a crash mid-write never leaves a torn table behind.
pub struct JsonAliasStore {
    path: PathBuf,
}

impl JsonAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AliasStore for JsonAliasStore {
    fn load(&self) -> Result<AliasTable> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => AliasTable::decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no alias file, starting empty");
                Ok(AliasTable::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, table: &AliasTable) -> Result<()> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        std::io::Write::write_all(&mut tmp, table.encode().as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Io(e.error))?;
        tracing::debug!(path = %self.path.display(), aliases = table.entries.len(), "alias table saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasEntry;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAliasStore::new(dir.path().join("alias.json"));
        assert!(store.load().unwrap().entries.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAliasStore::new(dir.path().join("alias.json"));

        let mut table = AliasTable::default();
        table.entries.insert(
            "greet".into(),
            AliasEntry {
                service: "hello".into(),
                operation: "say".into(),
                arguments: "${input}".into(),
            },
        );
        store.save(&table).unwrap();
        assert_eq!(store.load().unwrap(), table);

        // Overwrite in place.
        store.save(&AliasTable::default()).unwrap();
        assert!(store.load().unwrap().entries.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alias.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(JsonAliasStore::new(path).load().is_err());
    }
}
