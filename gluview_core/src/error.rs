use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum MonitorError {
    #[error("source error: {0}")]
    Source(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("timeout waiting for the vendor API")]
    Timeout,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("malformed sample data: {0}")]
    Data(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
