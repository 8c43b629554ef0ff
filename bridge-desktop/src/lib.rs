//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs`, rooted at the platform data dir from `dirs`
//! - `MediaIndex` backed by a walk of the user's music directory
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DirectoryMediaIndex, ReqwestHttpClient, TokioFileSystem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let fs = TokioFileSystem::new();
//!     let media = DirectoryMediaIndex::new(dirs::audio_dir().unwrap());
//!     // Hand these to the core service bootstrap
//!     Ok(())
//! }
//! ```

mod filesystem;
mod http;
mod media_index;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use media_index::DirectoryMediaIndex;

/// Default music directory for the current user, if the platform has one.
pub fn default_music_dir() -> Option<std::path::PathBuf> {
    dirs::audio_dir()
}
