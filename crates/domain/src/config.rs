use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub call: CallConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Config {
    /// Load a config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)
                .map_err(|e| crate::Error::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Sanity-check the resolved config, returning human-readable issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.call.deadline_ms == 0 {
            issues.push("call.deadline_ms must be > 0".into());
        }
        if self.directory.forward_deadline_ms == 0 {
            issues.push("directory.forward_deadline_ms must be > 0".into());
        }
        if self.directory.update_exchange_prefix.is_empty() {
            issues.push("directory.update_exchange_prefix must not be empty".into());
        }
        issues
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Broker connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker endpoint. The in-process broker ignores it; an AMQP-backed
    /// implementation would dial it.
    #[serde(default = "d_broker_url")]
    pub url: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self { url: d_broker_url() }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Per-service knobs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory bundled by `get_gui_files` for gui-capable services.
    #[serde(default = "d_gui_dir")]
    pub gui_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { gui_dir: PathBuf::from("guis") }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Call primitive
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    /// How long a caller waits for a correlated reply before giving up.
    #[serde(default = "d_30000")]
    pub deadline_ms: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self { deadline_ms: 30_000 }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Directory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Where the alias table is persisted.
    #[serde(default = "d_alias_path")]
    pub alias_path: PathBuf,
    /// Prefix of the per-process snapshot fanout exchange; a fresh uuid is
    /// appended each start.
    #[serde(default = "d_update_prefix")]
    pub update_exchange_prefix: String,
    /// Deadline applied when forwarding a resolved alias call.
    #[serde(default = "d_30000")]
    pub forward_deadline_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            alias_path: d_alias_path(),
            update_exchange_prefix: d_update_prefix(),
            forward_deadline_ms: 30_000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_broker_url() -> String {
    "amqp://localhost:5672/%2f".into()
}

fn d_gui_dir() -> PathBuf {
    PathBuf::from("guis")
}

fn d_alias_path() -> PathBuf {
    PathBuf::from("alias.json")
}

fn d_update_prefix() -> String {
    "directory.updates.".into()
}

fn d_30000() -> u64 {
    30_000
}
