//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the library sync core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that is implemented differently per platform.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP for the remote catalog and artwork providers
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Bounded file reads and artwork file storage
//! - [`MediaIndex`](media::MediaIndex) - Paginated enumeration of device audio assets
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and include context such as paths or URLs.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` across async tasks.

pub mod error;
pub mod http;
pub mod media;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{MediaAsset, MediaIndex, MediaPage, PermissionStatus};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, LogLevel, SystemClock};
