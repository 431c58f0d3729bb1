use thiserror::Error;

/// Failure reported by a host bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be read.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
