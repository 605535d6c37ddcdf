//! Interactive dashboard (default command).

use anyhow::Result;
use sitectl_core::config::Config;
use sitectl_core::logging::{self, LogTarget};

pub async fn run(config: &Config, base_url: Option<&str>) -> Result<()> {
    let endpoint = config.endpoint(base_url)?;

    // stdout belongs to the dashboard; logs go to a file
    let _log = logging::init(&config.logging, &LogTarget::File(config.logging.file_path()))?;

    let last = sitectl_tui::run_dashboard(config, endpoint).await?;
    if let Some(status) = last.status() {
        eprintln!("{}: {}", config.site_name, status.label());
    }
    Ok(())
}
