use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("balance board disconnected")]
    Disconnected,
    #[error("simulated fault: {0}")]
    Scripted(String),
}
