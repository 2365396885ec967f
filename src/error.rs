//! WolfGate Error Types

use thiserror::Error;

/// Result type alias for WolfGate operations
pub type Result<T> = std::result::Result<T, Error>;

/// WolfGate error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Probe and proxy errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Probe timeout for {0}")]
    ProbeTimeout(String),

    #[error("Node {address} returned status {status}")]
    UpstreamStatus { address: String, status: u16 },

    // Leader routing errors
    #[error("No leader available")]
    NoLeader,

    // Clock errors
    #[error("Unknown clock participant: {0}")]
    UnknownParticipant(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error is a per-node transport failure.
    ///
    /// Transport failures are absorbed into liveness/leader state
    /// (dead / unknown) instead of being propagated to callers.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::ProbeTimeout(_) | Error::UpstreamStatus { .. }
        )
    }
}
