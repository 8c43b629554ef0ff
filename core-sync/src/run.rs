//! # Sync Run State Machine
//!
//! Tracks the phase and progress of one sync run with validated transitions.
//!
//! ## State Machine
//!
//! ```text
//! Idle → Clearing → Scanning → Saving → Completed
//!          │  ↑        │         │
//!          ↓  │        └────┬────┘
//!         Idle│             ↓
//!   Completed/Failed      Failed
//! ```
//!
//! `Failed` is reachable from every phase, so the remote precheck can fail a
//! run before anything is cleared. A finished run (`Completed` or `Failed`)
//! may start over at `Clearing` or be reset to `Idle`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::run::SyncRun;
//!
//! let mut run = SyncRun::new(clock.now());
//! run.begin_clearing(clock.now())?;
//! run.begin_scanning(3, clock.now())?;
//! run.record_item(clock.now())?;
//! assert_eq!(run.message, "1 / 3");
//! ```

use crate::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Phase
// ============================================================================

/// Phase of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    /// Nothing has run since the last reset
    Idle,
    /// Prior library state is being deleted
    Clearing,
    /// Source pages are being pulled and entities built
    Scanning,
    /// The built library is being written
    Saving,
    Completed,
    Failed,
}

impl SyncPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Completed | SyncPhase::Failed)
    }

    /// Whether a run (or a clear) is currently executing
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncPhase::Clearing | SyncPhase::Scanning | SyncPhase::Saving
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Clearing => "clearing",
            SyncPhase::Scanning => "scanning",
            SyncPhase::Saving => "saving",
            SyncPhase::Completed => "completed",
            SyncPhase::Failed => "failed",
        }
    }

    fn can_transition_to(&self, to: SyncPhase) -> bool {
        use SyncPhase::*;
        match (self, to) {
            (_, Failed) => true,
            (Idle | Completed | Failed, Clearing) => true,
            (Clearing | Completed | Failed, Idle) => true,
            (Clearing, Scanning) => true,
            (Scanning, Saving) => true,
            (Saving, Completed) => true,
            _ => false,
        }
    }
}

impl FromStr for SyncPhase {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SyncPhase::Idle),
            "clearing" => Ok(SyncPhase::Clearing),
            "scanning" => Ok(SyncPhase::Scanning),
            "saving" => Ok(SyncPhase::Saving),
            "completed" => Ok(SyncPhase::Completed),
            "failed" => Ok(SyncPhase::Failed),
            _ => Err(SyncError::InvalidPhase(s.to_string())),
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Run
// ============================================================================

pub const MSG_NOT_STARTED: &str = "Not started";
pub const MSG_CLEARING: &str = "Clearing";
pub const MSG_STARTING: &str = "Starting";
pub const MSG_SAVING: &str = "Saving";
pub const MSG_COMPLETED: &str = "Completed";

/// Observable state of the current (or last) sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub phase: SyncPhase,
    /// Items attempted so far, skipped ones included
    pub processed: u64,
    /// Item count reported by the source when scanning began
    pub total: u64,
    /// 0 to 100
    pub percent: f64,
    pub message: String,
    pub succeeded: bool,
    pub last_updated: DateTime<Utc>,
}

impl SyncRun {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            phase: SyncPhase::Idle,
            processed: 0,
            total: 0,
            percent: 0.0,
            message: MSG_NOT_STARTED.to_string(),
            succeeded: false,
            last_updated: now,
        }
    }

    /// Validate a phase change without applying it
    pub fn validate_transition(&self, to: SyncPhase) -> Result<()> {
        if self.phase.can_transition_to(to) {
            return Ok(());
        }

        Err(SyncError::InvalidStateTransition {
            from: self.phase.to_string(),
            to: to.to_string(),
            reason: match self.phase {
                phase if phase.is_active() => "a run is in progress".to_string(),
                _ => "transition not allowed".to_string(),
            },
        })
    }

    fn transition(&mut self, to: SyncPhase, message: &str, now: DateTime<Utc>) -> Result<()> {
        self.validate_transition(to)?;
        self.phase = to;
        self.message = message.to_string();
        self.last_updated = now;
        Ok(())
    }

    /// Reset counters and enter `Clearing`
    pub fn begin_clearing(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(SyncPhase::Clearing, MSG_CLEARING, now)?;
        self.processed = 0;
        self.total = 0;
        self.percent = 0.0;
        self.succeeded = false;
        Ok(())
    }

    /// Enter `Scanning` with the total fixed for the rest of the run
    pub fn begin_scanning(&mut self, total: u64, now: DateTime<Utc>) -> Result<()> {
        self.transition(SyncPhase::Scanning, MSG_STARTING, now)?;
        self.total = total;
        self.processed = 0;
        self.percent = 0.0;
        Ok(())
    }

    /// Count one attempted item.
    ///
    /// The count saturates at `total` if the source yields more items than it
    /// reported up front.
    pub fn record_item(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.phase != SyncPhase::Scanning {
            return Err(SyncError::InvalidStateTransition {
                from: self.phase.to_string(),
                to: SyncPhase::Scanning.to_string(),
                reason: "items can only be recorded while scanning".to_string(),
            });
        }

        self.processed = (self.processed + 1).min(self.total);
        self.percent = Self::percent_of(self.processed, self.total);
        self.message = format!("{} / {}", self.processed, self.total);
        self.last_updated = now;
        Ok(())
    }

    pub fn begin_saving(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(SyncPhase::Saving, MSG_SAVING, now)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(SyncPhase::Completed, MSG_COMPLETED, now)?;
        self.succeeded = true;
        Ok(())
    }

    /// Enter `Failed` with `message` as the status. Always allowed.
    ///
    /// Counters are kept when a run fails mid-flight and zeroed otherwise, so
    /// a failure before scanning never reports an earlier run's progress.
    pub fn fail(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        if !self.phase.is_active() {
            self.processed = 0;
            self.total = 0;
            self.percent = 0.0;
        }
        self.phase = SyncPhase::Failed;
        self.message = message.into();
        self.succeeded = false;
        self.last_updated = now;
    }

    /// Return to `Idle` after a clear or a finished run
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(SyncPhase::Idle, MSG_NOT_STARTED, now)?;
        self.processed = 0;
        self.total = 0;
        self.percent = 0.0;
        self.succeeded = false;
        Ok(())
    }

    fn percent_of(processed: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        ((processed as f64 / total as f64) * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_happy_path() {
        let mut run = SyncRun::new(now());
        assert_eq!(run.message, "Not started");

        run.begin_clearing(now()).unwrap();
        assert_eq!(run.message, "Clearing");

        run.begin_scanning(3, now()).unwrap();
        assert_eq!(run.message, "Starting");

        for expected in 1..=3 {
            run.record_item(now()).unwrap();
            assert_eq!(run.processed, expected);
            assert_eq!(run.message, format!("{} / 3", expected));
        }
        assert_eq!(run.percent, 100.0);

        run.begin_saving(now()).unwrap();
        assert_eq!(run.message, "Saving");
        assert_eq!(run.processed, 3);

        run.complete(now()).unwrap();
        assert_eq!(run.phase, SyncPhase::Completed);
        assert!(run.succeeded);
    }

    #[test]
    fn test_processed_never_exceeds_total() {
        let mut run = SyncRun::new(now());
        run.begin_clearing(now()).unwrap();
        run.begin_scanning(2, now()).unwrap();
        for _ in 0..5 {
            run.record_item(now()).unwrap();
        }
        assert_eq!(run.processed, 2);
        assert_eq!(run.percent, 100.0);
    }

    #[test]
    fn test_zero_total_percent() {
        let mut run = SyncRun::new(now());
        run.begin_clearing(now()).unwrap();
        run.begin_scanning(0, now()).unwrap();
        run.record_item(now()).unwrap();
        assert_eq!(run.processed, 0);
        assert_eq!(run.percent, 0.0);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut run = SyncRun::new(now());
        assert!(matches!(
            run.begin_scanning(1, now()),
            Err(SyncError::InvalidStateTransition { .. })
        ));
        assert!(run.begin_saving(now()).is_err());
        assert!(run.complete(now()).is_err());
        assert!(run.record_item(now()).is_err());

        run.begin_clearing(now()).unwrap();
        assert!(run.begin_clearing(now()).is_err());
        assert!(run.begin_saving(now()).is_err());
    }

    #[test]
    fn test_fail_from_any_phase() {
        let mut run = SyncRun::new(now());
        run.fail("Network Failure", now());
        assert_eq!(run.phase, SyncPhase::Failed);
        assert_eq!(run.message, "Network Failure");
        assert!(!run.succeeded);

        run.begin_clearing(now()).unwrap();
        run.begin_scanning(10, now()).unwrap();
        run.record_item(now()).unwrap();
        run.fail("Source error: boom", now());
        assert_eq!(run.processed, 1);
        assert_eq!(run.phase, SyncPhase::Failed);
    }

    #[test]
    fn test_fail_before_scanning_drops_previous_progress() {
        let mut run = SyncRun::new(now());
        run.begin_clearing(now()).unwrap();
        run.begin_scanning(2, now()).unwrap();
        run.record_item(now()).unwrap();
        run.record_item(now()).unwrap();
        run.begin_saving(now()).unwrap();
        run.complete(now()).unwrap();
        assert_eq!(run.processed, 2);

        run.fail("Network Failure", now());
        assert_eq!(run.phase, SyncPhase::Failed);
        assert_eq!(run.processed, 0);
        assert_eq!(run.total, 0);
        assert_eq!(run.percent, 0.0);
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut run = SyncRun::new(now());
        run.begin_clearing(now()).unwrap();
        run.reset(now()).unwrap();
        assert_eq!(run.phase, SyncPhase::Idle);
        assert_eq!(run.message, "Not started");

        run.begin_clearing(now()).unwrap();
        run.begin_scanning(1, now()).unwrap();
        assert!(run.reset(now()).is_err());
    }

    #[test]
    fn test_phase_round_trip() {
        for phase in [
            SyncPhase::Idle,
            SyncPhase::Clearing,
            SyncPhase::Scanning,
            SyncPhase::Saving,
            SyncPhase::Completed,
            SyncPhase::Failed,
        ] {
            assert_eq!(phase.as_str().parse::<SyncPhase>().unwrap(), phase);
        }
        assert!("bogus".parse::<SyncPhase>().is_err());
        assert!(SyncPhase::Saving.is_active());
        assert!(SyncPhase::Failed.is_terminal());
    }
}
