//! Shared domain types for Switchyard: the crate-wide error type and the
//! TOML-backed configuration every binary loads at startup.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
