//! Status synchronization controller.
//!
//! `StatusSync` keeps a cached copy of the remote site flag and drives at most
//! one write at a time. State lives in a `watch` channel so renderers can
//! subscribe instead of polling.
//!
//! Rules:
//! - Nothing is known (and nothing is interactive) until a read succeeds.
//! - A write always carries an explicit target value and the server's reply
//!   replaces the cache, even when it differs from what was requested.
//! - Failures never touch the cached value; they are logged and recorded in
//!   `SyncState::last_error`.
//! - `pending` is cleared by a drop guard, so it cannot stick after success,
//!   failure, timeout, or cancellation of the write future.

mod state;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use state::{Cached, SyncPhase, SyncState};

use crate::status::{Status, StatusError, StatusResult, StatusService};

/// Controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Per-request limit. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl SyncOptions {
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Self::DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Result of a write attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server answered; `status` is what it settled on.
    Applied {
        previous: Status,
        requested: Status,
        status: Status,
    },
    /// Not started: state unknown or another write in flight.
    Skipped,
    /// Request failed; cached value unchanged.
    Failed(StatusError),
}

impl ToggleOutcome {
    /// True when the server settled on something other than what was asked.
    pub fn was_overridden(&self) -> bool {
        matches!(self, ToggleOutcome::Applied { requested, status, .. } if requested != status)
    }
}

/// Client-side controller for the site flag.
pub struct StatusSync<S> {
    service: S,
    options: SyncOptions,
    state: watch::Sender<SyncState>,
    /// Bumped whenever a write starts. Reads that raced a write are dropped.
    write_epoch: AtomicU64,
}

impl<S: StatusService> StatusSync<S> {
    pub fn new(service: S, options: SyncOptions) -> Self {
        Self {
            service,
            options,
            state: watch::Sender::new(SyncState::default()),
            write_epoch: AtomicU64::new(0),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Current snapshot.
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Reads the remote flag for the first time.
    ///
    /// On failure the state stays unknown; no retry is scheduled.
    ///
    /// # Errors
    /// Returns the request failure. State has already been updated.
    pub async fn initialize(&self) -> StatusResult<Status> {
        self.read("initialize").await
    }

    /// Re-reads the remote flag.
    ///
    /// Also serves as the manual retry after a failed `initialize()`.
    /// Returns `None` without sending anything while a write is in flight.
    pub async fn refresh(&self) -> Option<StatusResult<Status>> {
        if self.state.borrow().pending {
            debug!("Refresh skipped: write in flight");
            return None;
        }
        Some(self.read("refresh").await)
    }

    /// Flips the flag.
    pub async fn toggle(&self) -> ToggleOutcome {
        self.write(Status::flipped).await
    }

    /// Writes a specific flag value, with the same guard as `toggle()`.
    pub async fn set_live(&self, live: bool) -> ToggleOutcome {
        self.write(move |_| Status::new(live)).await
    }

    async fn read(&self, op: &'static str) -> StatusResult<Status> {
        let epoch = self.write_epoch.load(Ordering::SeqCst);
        let result = self.request(self.service.fetch_status()).await;

        // Checked under the channel lock so a write cannot be claimed in between.
        let mut stale = false;
        self.state.send_if_modified(|s| {
            if s.pending || self.write_epoch.load(Ordering::SeqCst) != epoch {
                stale = true;
                return false;
            }
            match &result {
                Ok(status) => s.apply(*status),
                Err(err) => s.fail(err.clone()),
            }
            true
        });

        match &result {
            Ok(status) if stale => debug!(op, %status, "Discarding read that overlapped a write"),
            Err(err) if stale => debug!(op, error = %err, "Discarding failed read that overlapped a write"),
            Ok(status) => info!(op, %status, "Site status loaded"),
            Err(err) => warn!(op, kind = %err.kind, error = %err, "Failed to fetch site status"),
        }
        result
    }

    async fn write(&self, target: impl FnOnce(Status) -> Status) -> ToggleOutcome {
        let mut claimed = None;
        self.state.send_if_modified(|s| match s.cached {
            Cached::Known(status) if !s.pending => {
                s.pending = true;
                claimed = Some(status);
                true
            }
            _ => false,
        });
        let Some(previous) = claimed else {
            debug!("Toggle ignored: status unknown or write in flight");
            return ToggleOutcome::Skipped;
        };
        let _pending = PendingGuard { state: &self.state };
        self.write_epoch.fetch_add(1, Ordering::SeqCst);

        let requested = target(previous);
        info!(from = %previous, to = %requested, "Writing site status");

        match self
            .request(self.service.write_status(requested.is_live))
            .await
        {
            Ok(status) => {
                if status == requested {
                    info!(%status, "Site status updated");
                } else {
                    info!(%requested, %status, "Server kept a different site status");
                }
                self.state.send_modify(|s| s.apply(status));
                ToggleOutcome::Applied {
                    previous,
                    requested,
                    status,
                }
            }
            Err(err) => {
                warn!(kind = %err.kind, error = %err, "Failed to toggle site status");
                self.state.send_modify(|s| s.fail(err.clone()));
                ToggleOutcome::Failed(err)
            }
        }
    }

    async fn request<F>(&self, fut: F) -> StatusResult<Status>
    where
        F: Future<Output = StatusResult<Status>>,
    {
        let Some(limit) = self.options.request_timeout else {
            return fut.await;
        };
        tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_elapsed| {
                Err(StatusError::timeout(format!(
                    "No response after {:.1}s",
                    limit.as_secs_f32()
                )))
            })
    }
}

/// Clears `pending` when the write scope ends, however it ends.
struct PendingGuard<'a> {
    state: &'a watch::Sender<SyncState>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.pending = false);
    }
}
