//! Dashboard state.
//!
//! `AppState` is owned by the runtime, mutated only by the reducer, and read
//! by the renderer. The site flag itself is a mirror of the controller's
//! `SyncState`, refreshed whenever the controller publishes a change.

use sitectl_core::sync::SyncState;

/// Spinner frames for the loading and pending indicators.
pub const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Combined application state for the dashboard.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Last snapshot received from the controller.
    pub site: SyncState,
    /// Card title for the managed site.
    pub site_name: String,
    /// Base URL shown in the header.
    pub endpoint: String,
    pub spinner_frame: usize,
    pub should_quit: bool,
    /// One-line message from the last action (override, failure).
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(site_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            site: SyncState::default(),
            site_name: site_name.into(),
            endpoint: endpoint.into(),
            spinner_frame: 0,
            should_quit: false,
            notice: None,
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Whether anything on screen is animating.
    pub fn is_busy(&self) -> bool {
        self.site.pending || (self.site.status().is_none() && self.site.last_error.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_wraps() {
        let mut app = AppState::new("Main Website", "http://localhost");
        app.spinner_frame = SPINNER_FRAMES.len();
        assert_eq!(app.spinner(), SPINNER_FRAMES[0]);
    }

    #[test]
    fn test_busy_while_loading() {
        let app = AppState::new("Main Website", "http://localhost");
        assert!(app.is_busy());
    }
}
