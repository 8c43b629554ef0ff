//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the library sync core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus for progress observation
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its configuration types and the broadcast channel that carries sync
//! progress to observers.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, ExternalArtworkConfig, RemoteCatalogConfig, SyncConfig};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream, LibraryEvent, SyncEvent};
