/// Shared error type used across all Switchyard crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("broker: {0}")]
    Broker(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{0}")]
    Handler(String),

    #[error("alias: {0}")]
    Alias(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
