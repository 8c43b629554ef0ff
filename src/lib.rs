//! Workspace facade crate.
//!
//! Re-exports the service entry point so host applications can depend on
//! `muziko-sync-workspace` alone and enable the documented features instead
//! of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, CoreService};

#[cfg(feature = "desktop-shims")]
pub use core_sync::{SyncController, SyncPhase, SyncRun};
