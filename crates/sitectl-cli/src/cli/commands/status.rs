//! One-shot status commands: `status`, `toggle`, `set`.
//!
//! Each command builds a fresh controller, loads the flag once, and prints
//! the value the server reports. Nothing is cached between runs.

use std::future::Future;

use anyhow::{Context, Result};
use sitectl_core::config::Config;
use sitectl_core::interrupt::{self, InterruptedError};
use sitectl_core::logging::{self, LogGuard, LogTarget};
use sitectl_core::status::HttpStatusService;
use sitectl_core::sync::{StatusSync, SyncState, ToggleOutcome};

/// Logs to stderr: failures only, or everything with `--verbose`.
pub fn init_logging(config: &Config, verbose: bool) -> Result<LogGuard> {
    logging::init(&config.logging, &LogTarget::Stderr { verbose })
}

pub async fn show(config: &Config, base_url: Option<&str>, json: bool) -> Result<()> {
    let sync = connect(config, base_url)?;
    interruptible(sync.initialize())
        .await?
        .context("Failed to read site status")?;
    print_state(config, &sync.state(), json)
}

/// Flips the flag (`target = None`) or sets it to `target`.
pub async fn change(
    config: &Config,
    base_url: Option<&str>,
    target: Option<bool>,
    json: bool,
) -> Result<()> {
    let sync = connect(config, base_url)?;
    interruptible(sync.initialize())
        .await?
        .context("Failed to read site status")?;

    let outcome = interruptible(async {
        match target {
            Some(live) => sync.set_live(live).await,
            None => sync.toggle().await,
        }
    })
    .await?;

    match outcome {
        ToggleOutcome::Applied {
            requested, status, ..
        } if requested != status => {
            eprintln!(
                "note: server kept the site {} (requested {})",
                status.label(),
                requested.label()
            );
        }
        ToggleOutcome::Applied { .. } => {}
        ToggleOutcome::Skipped => anyhow::bail!("Another update is already in progress"),
        ToggleOutcome::Failed(err) => {
            return Err(anyhow::Error::new(err).context("Failed to update site status"));
        }
    }

    print_state(config, &sync.state(), json)
}

fn connect(config: &Config, base_url: Option<&str>) -> Result<StatusSync<HttpStatusService>> {
    let endpoint = config.endpoint(base_url)?;
    let service = HttpStatusService::new(endpoint)?;
    Ok(StatusSync::new(service, config.sync_options()))
}

/// Runs `fut` unless Ctrl+C arrives first.
async fn interruptible<T>(fut: impl Future<Output = T>) -> Result<T> {
    tokio::select! {
        value = fut => Ok(value),
        () = interrupt::wait_for_interrupt() => Err(InterruptedError.into()),
    }
}

fn print_state(config: &Config, state: &SyncState, json: bool) -> Result<()> {
    let status = state.status().context("Site status is unknown")?;
    if json {
        println!("{}", serde_json::to_string(&status)?);
        return Ok(());
    }
    match state.last_updated {
        Some(updated) => println!(
            "{}: {} (updated {})",
            config.site_name,
            status.label(),
            updated.format("%H:%M:%S")
        ),
        None => println!("{}: {}", config.site_name, status.label()),
    }
    Ok(())
}
