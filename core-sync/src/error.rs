use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync already in progress ({phase})")]
    SyncInProgress { phase: String },

    /// The catalog health precheck failed. Displays as the user-facing status.
    #[error("Network Failure")]
    NetworkFailure { reason: String },

    #[error("{0} source is not configured")]
    SourceUnavailable(&'static str),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid sync phase: {0}")]
    InvalidPhase(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] core_metadata::MetadataError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
