//! # Library Sync Module
//!
//! Rebuilds the music library from a local or remote source.
//!
//! ## Overview
//!
//! A sync run clears the stored library, enumerates a source page by page,
//! deduplicates artists and albums by name while resolving their artwork, and
//! writes the result back in bounded chunks. Progress is tracked in a
//! [`SyncRun`] and published on the event bus.
//!
//! ## Components
//!
//! - **Sync Run State Machine** (`run`): phases and progress counters with validated transitions
//! - **Source Providers** (`source`, `local`, `remote`): paginated enumeration of raw items
//! - **Library Builder** (`builder`): exact-name dedup and relationship linking
//! - **Bulk Writer** (`writer`): chunked persistence in artist, album, track order
//! - **Sync Controller** (`controller`): runs the pipeline and owns the run state

pub mod builder;
pub mod controller;
pub mod error;
pub mod local;
pub mod remote;
pub mod run;
pub mod source;
pub mod writer;

pub use builder::{LibraryBuilder, LibraryGraph};
pub use controller::SyncController;
pub use error::{Result, SyncError};
pub use local::LocalSource;
pub use remote::{RemoteSource, RemoteTrack};
pub use run::{SyncPhase, SyncRun};
pub use source::{SourceItem, SourceKind, SourcePage, SourceProvider};
pub use writer::{BulkWriter, ClearSummary, LibraryRepositories, WriteSummary};
