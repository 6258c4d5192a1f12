use thiserror::Error;

/// Failures raised by host bridge implementations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host cannot provide the service (no async runtime, no render loop).
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
