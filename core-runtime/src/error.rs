use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected configuration value, or a global facility already installed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host service was neither injected nor available by default.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
