//! Per-order sync state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{RecReviewsError, Result};

/// Progress of one order through the remote push lifecycle.
///
/// Only ever advances `NotSent -> Sent -> Valid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    NotSent,
    Sent,
    Valid,
}

impl SyncState {
    /// Value stored in the order meta.
    pub const fn as_meta(self) -> u8 {
        match self {
            Self::NotSent => 0,
            Self::Sent => 1,
            Self::Valid => 2,
        }
    }

    pub fn from_meta(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::NotSent),
            1 => Ok(Self::Sent),
            2 => Ok(Self::Valid),
            other => Err(RecReviewsError::Serialization(format!("unknown sync state {other}"))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotSent => "not_sent",
            Self::Sent => "sent",
            Self::Valid => "valid",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync metadata owned by a host order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSyncRecord {
    pub state: SyncState,
    pub ignore: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub valid_at: Option<DateTime<Utc>>,
}

impl OrderSyncRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// `NotSent -> Sent`, stamping `sent_at`.
    pub fn mark_sent(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure(SyncState::NotSent, SyncState::Sent)?;
        if self.ignore {
            return Err(RecReviewsError::InvalidTransition {
                from: self.state,
                to: SyncState::Sent,
            });
        }
        self.state = SyncState::Sent;
        self.sent_at = Some(at);
        Ok(())
    }

    /// `Sent -> Valid`, stamping `valid_at`.
    pub fn mark_valid(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure(SyncState::Sent, SyncState::Valid)?;
        self.state = SyncState::Valid;
        self.valid_at = Some(at);
        Ok(())
    }

    /// Flag an unsent order so neither sweep pass selects it again.
    pub fn mark_ignored(&mut self) -> Result<()> {
        if self.state != SyncState::NotSent {
            return Err(RecReviewsError::InvalidTransition { from: self.state, to: self.state });
        }
        self.ignore = true;
        Ok(())
    }

    fn ensure(&self, expected: SyncState, to: SyncState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RecReviewsError::InvalidTransition { from: self.state, to })
        }
    }
}

/// Timestamp of the last finished reconciliation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRunRecord {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_run_at: DateTime<Utc>,
}

/// Counters for one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Orders moved `Sent -> Valid`
    pub completed: usize,
    /// Orders moved `NotSent -> Sent`
    pub sent: usize,
    /// Orders flagged ignore for having no products
    pub ignored: usize,
    /// Orders left untouched after a failure
    pub failed: usize,
    /// Stopped early because another run reclaimed the sweep lock
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepSkip {
    NotAuthenticated,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Ran(SweepSummary),
    Skipped(SweepSkip),
}
