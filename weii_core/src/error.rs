use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasureError {
    #[error("insufficient data: no samples were collected")]
    InsufficientData,
    #[error("device error: {0}")]
    Device(String),
    #[error("balance board disconnected")]
    DeviceGone,
    #[error("invalid device address: {0:?}")]
    InvalidAddress(String),
    #[error("post-session hook failed: {0}")]
    Hook(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing device lookup")]
    MissingLookup,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
