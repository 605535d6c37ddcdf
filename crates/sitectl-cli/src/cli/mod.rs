//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use sitectl_core::config::{self, BASE_URL_ENV};
use sitectl_core::interrupt;
use tracing::debug;

mod commands;

#[derive(Parser)]
#[command(name = "sitectl")]
#[command(version)]
#[command(about = "Switch a website between live and maintenance mode")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the status backend (overrides config)
    #[arg(long, global = true, value_name = "URL", env = BASE_URL_ENV)]
    base_url: Option<String>,

    /// Per-request timeout in seconds, 0 waits forever (overrides config)
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Log state changes to stderr, not just failures
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the current site status
    Status {
        /// Print the raw status object as JSON
        #[arg(long)]
        json: bool,
    },
    /// Flip the site between live and maintenance
    Toggle {
        /// Print the resulting status object as JSON
        #[arg(long)]
        json: bool,
    },
    /// Put the site into a specific state
    Set {
        #[arg(value_enum)]
        state: SiteState,
        /// Print the resulting status object as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SiteState {
    Live,
    Maintenance,
}

impl SiteState {
    fn is_live(self) -> bool {
        self == SiteState::Live
    }
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults
    Generate,
    /// Save the status backend base URL
    SetBaseUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init()?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        base_url,
        timeout_secs,
        verbose,
    } = cli;

    let mut config = config::Config::load().context("load config")?;
    if let Some(secs) = timeout_secs {
        config.request_timeout_secs = secs;
    }
    let base_url = base_url.as_deref();

    // default to the dashboard
    let Some(command) = command else {
        return commands::dashboard::run(&config, base_url).await;
    };

    let _log = if matches!(command, Commands::Config { .. }) {
        None
    } else {
        Some(commands::status::init_logging(&config, verbose)?)
    };
    debug!(
        base_url = base_url.unwrap_or(config.base_url.as_str()),
        timeout_secs = config.request_timeout_secs,
        "Dispatching command"
    );

    match command {
        Commands::Status { json } => commands::status::show(&config, base_url, json).await,
        Commands::Toggle { json } => {
            commands::status::change(&config, base_url, None, json).await
        }
        Commands::Set { state, json } => {
            commands::status::change(&config, base_url, Some(state.is_live()), json).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
            ConfigCommands::SetBaseUrl { url } => commands::config::set_base_url(&url),
        },
    }
}
