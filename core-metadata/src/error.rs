use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to extract metadata: {0}")]
    ExtractionFailed(String),

    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    #[error("Artwork processing failed: {0}")]
    ArtworkError(String),

    #[error("{provider} request failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
