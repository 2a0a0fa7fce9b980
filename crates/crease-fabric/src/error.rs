/// Errors produced by the event fabric.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// The fabric has been shut down and cannot accept events.
    #[error("fabric is shut down")]
    Shutdown,

    /// Event could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the fabric crate.
pub type Result<T> = std::result::Result<T, FabricError>;
