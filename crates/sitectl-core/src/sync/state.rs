//! Sync state value object.

use chrono::{DateTime, Local};

use crate::status::{Status, StatusError};

/// Client-side copy of the remote flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cached {
    /// No successful read yet. Controls stay hidden.
    #[default]
    Unknown,
    Known(Status),
}

impl Cached {
    pub fn status(self) -> Option<Status> {
        match self {
            Cached::Unknown => None,
            Cached::Known(status) => Some(status),
        }
    }
}

/// Controller phase, derived from [`SyncState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Before the first successful read.
    Unknown,
    /// Interactive.
    Ready,
    /// A write is in flight; further writes are rejected.
    Toggling,
}

/// Snapshot published to subscribers on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub cached: Cached,
    pub pending: bool,
    pub last_updated: Option<DateTime<Local>>,
    /// Most recent failure, cleared by the next successful exchange.
    pub last_error: Option<StatusError>,
}

impl SyncState {
    pub fn phase(&self) -> SyncPhase {
        match (self.cached, self.pending) {
            (Cached::Unknown, _) => SyncPhase::Unknown,
            (Cached::Known(_), false) => SyncPhase::Ready,
            (Cached::Known(_), true) => SyncPhase::Toggling,
        }
    }

    pub fn status(&self) -> Option<Status> {
        self.cached.status()
    }

    pub fn is_live(&self) -> Option<bool> {
        self.status().map(|s| s.is_live)
    }

    /// Whether a write may start right now.
    pub fn can_toggle(&self) -> bool {
        self.phase() == SyncPhase::Ready
    }

    /// Records an authoritative value from the server.
    pub(crate) fn apply(&mut self, status: Status) {
        self.cached = Cached::Known(status);
        self.last_updated = Some(Local::now());
        self.last_error = None;
    }

    /// Records a failure. The cached value is left as it was.
    pub(crate) fn fail(&mut self, error: StatusError) {
        self.last_error = Some(error);
    }
}
