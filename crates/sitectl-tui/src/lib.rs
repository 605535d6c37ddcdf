//! Full-screen site status dashboard.

pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stdout};
use std::sync::Arc;

use anyhow::Result;
pub use runtime::TuiRuntime;
use sitectl_core::config::Config;
use sitectl_core::status::{HttpStatusService, StatusEndpoint};
use sitectl_core::sync::{SyncState, StatusSync};
use tracing::info;

use crate::state::AppState;

/// Runs the dashboard until the user quits.
///
/// Returns the last snapshot so the caller can print a summary.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the terminal fails.
pub async fn run_dashboard(config: &Config, endpoint: StatusEndpoint) -> Result<SyncState> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The dashboard requires a terminal.\n\
             Use `sitectl status` or `sitectl toggle` for non-interactive use."
        );
    }

    info!(base_url = endpoint.base_url(), "Starting dashboard");
    let state = AppState::new(config.site_name.clone(), endpoint.base_url());
    let service = HttpStatusService::new(endpoint)?;
    let sync = Arc::new(StatusSync::new(service, config.sync_options()));

    let mut runtime = TuiRuntime::new(Arc::clone(&sync), state, config.poll_interval())?;
    runtime.run()?;
    drop(runtime);

    Ok(sync.state())
}
