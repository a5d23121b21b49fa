//! The directory service: a live table of online services, fed by
//! lifecycle announcements, with an alias layer that rewrites indirect
//! calls into concrete ones.
//!
//! Three cooperating pieces:
//!
//! - [`DirectoryTable`] — the synchronized name → descriptor table, updated
//!   by the lifecycle [`listener`] and broadcast as a snapshot on a
//!   per-process fanout exchange after every change.
//! - [`AliasTable`] + [`AliasStore`] — the persisted alias → target map and
//!   its template expansion.
//! - [`DirectoryService`] — the served RPC surface plus the special-request
//!   hook that resolves, rewrites, and forwards alias calls.

pub mod alias;
pub mod listener;
pub mod service;
pub mod store;
pub mod table;

pub use alias::{AliasEntry, AliasTable};
pub use listener::spawn_listener;
pub use service::DirectoryService;
pub use store::{AliasStore, JsonAliasStore};
pub use table::DirectoryTable;
