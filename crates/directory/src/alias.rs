//! The alias table and its template expansion.
//!
//! An alias names a target service + operation and an argument template.
//! Every `${input}` placeholder in the template consumes one caller
//! argument, in order; the substituted string is then split on `,` to form
//! the target's positional argument list. `"${input},fixed"` applied to
//! `["x"]` yields `["x", "fixed"]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sy_domain::{Error, Result};

const PLACEHOLDER: &str = "${input}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Directory name of the target service.
    pub service: String,
    /// Operation invoked on the target.
    pub operation: String,
    /// Argument template; empty means the target is called with no
    /// arguments.
    #[serde(default)]
    pub arguments: String,
}

impl AliasEntry {
    /// Expand the template against the caller's positional arguments.
    pub fn expand(&self, alias: &str, args: &[String]) -> Result<Vec<String>> {
        if self.arguments.is_empty() {
            return Ok(Vec::new());
        }

        let mut expanded = String::with_capacity(self.arguments.len());
        let mut rest = self.arguments.as_str();
        let mut consumed = 0;
        while let Some(at) = rest.find(PLACEHOLDER) {
            expanded.push_str(&rest[..at]);
            let Some(arg) = args.get(consumed) else {
                return Err(Error::Alias(format!(
                    "alias {alias} needs at least {} argument(s), got {}",
                    consumed + 1,
                    args.len()
                )));
            };
            expanded.push_str(arg);
            consumed += 1;
            rest = &rest[at + PLACEHOLDER.len()..];
        }
        expanded.push_str(rest);

        Ok(expanded.split(',').map(str::to_string).collect())
    }
}

/// The full alias map, serialized as a JSON object keyed by alias name.
/// A `BTreeMap` keeps the persisted form stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    pub entries: BTreeMap<String, AliasEntry>,
}

impl AliasTable {
    pub fn get(&self, alias: &str) -> Option<&AliasEntry> {
        self.entries.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Alias(format!("alias table: {e}")))
    }

    pub fn encode(&self) -> String {
        serde_json::to_string_pretty(self).expect("alias table serializes")
    }
}
