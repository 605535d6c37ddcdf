//! Configuration management for sitectl.
//!
//! Loads configuration from ${SITECTL_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::status::StatusEndpoint;
use crate::sync::SyncOptions;

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "SITECTL_BASE_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments/sections from the template are always present, while the
/// user's customized values are preserved.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;
    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for sitectl configuration and data directories.
    //!
    //! SITECTL_HOME resolution order:
    //! 1. SITECTL_HOME environment variable (if set)
    //! 2. ~/.config/sitectl (default)

    use std::path::PathBuf;

    /// Returns the sitectl home directory.
    pub fn sitectl_home() -> PathBuf {
        if let Ok(home) = std::env::var("SITECTL_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("sitectl")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        sitectl_home().join("config.toml")
    }

    /// Returns the directory for dashboard log files.
    pub fn logs_dir() -> PathBuf {
        sitectl_home().join("logs")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive used when SITECTL_LOG is unset
    pub level: String,
    /// Dashboard log file (defaults to $SITECTL_HOME/logs/sitectl.log)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Resolved log file path for the dashboard.
    pub fn file_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| paths::logs_dir().join("sitectl.log"))
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the status backend
    pub base_url: String,

    /// Name shown on the dashboard card
    pub site_name: String,

    /// Timeout for each status request in seconds (0 disables)
    pub request_timeout_secs: u64,

    /// Dashboard re-read interval in seconds (0 disables)
    pub poll_interval_secs: u64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "https://swimwear-backend.vercel.app";
    const DEFAULT_SITE_NAME: &str = "Main Website";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
    /// Default is disabled
    const DEFAULT_POLL_INTERVAL_SECS: u64 = 0;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves only the base_url field to the default config path.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_base_url(base_url: &str) -> Result<()> {
        Self::save_base_url_to(&paths::config_path(), base_url)
    }

    /// Saves only the base_url field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_base_url_to(path: &Path, base_url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let endpoint = StatusEndpoint::parse(base_url)?;

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        doc["base_url"] = value(endpoint.base_url());

        Self::write_config(path, &doc.to_string())
    }

    /// Resolves the status endpoint with precedence: override > env > config.
    ///
    /// # Errors
    /// Returns an error if the winning value is not a valid http(s) URL.
    pub fn endpoint(&self, override_url: Option<&str>) -> Result<StatusEndpoint> {
        let env_url = std::env::var(BASE_URL_ENV).ok();
        let candidates = [override_url, env_url.as_deref(), Some(self.base_url.as_str())];
        let chosen = candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(Self::DEFAULT_BASE_URL);
        StatusEndpoint::parse(chosen)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }

    /// Controller options derived from this config.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            request_timeout: self.request_timeout(),
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            site_name: Self::DEFAULT_SITE_NAME.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_secs: Self::DEFAULT_POLL_INTERVAL_SECS,
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.poll_interval(), None);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "base_url = \"http://localhost:3000\"\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.site_name, "Main Website");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "base_url = [").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_template_matches_defaults() {
        let parsed: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("swimwear-backend.vercel.app"));
        assert!(contents.contains("# file ="));
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        let result = Config::init(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_keeps_template_comments() {
        let generated = Config::generate().unwrap();
        assert!(generated.contains("# sitectl Configuration"));
        let parsed: Config = toml::from_str(&generated).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_timeouts_zero_disable() {
        let config = Config {
            request_timeout_secs: 0,
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.poll_interval(), None);
        assert_eq!(config.sync_options().request_timeout, None);
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = Config {
            base_url: "http://from-config.test".to_string(),
            ..Default::default()
        };
        let endpoint = config.endpoint(Some("http://from-flag.test/")).unwrap();
        assert_eq!(endpoint.base_url(), "http://from-flag.test");
    }

    #[test]
    fn test_endpoint_blank_override_is_ignored() {
        let config = Config {
            base_url: "http://from-config.test".to_string(),
            ..Default::default()
        };
        // SITECTL_BASE_URL is not set by the test harness
        if std::env::var(BASE_URL_ENV).is_ok() {
            return;
        }
        let endpoint = config.endpoint(Some("   ")).unwrap();
        assert_eq!(endpoint.base_url(), "http://from-config.test");
    }

    #[test]
    fn test_endpoint_invalid_url_fails() {
        let config = Config::default();
        assert!(config.endpoint(Some("nope")).is_err());
    }

    #[test]
    fn test_save_base_url_creates_file_with_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        Config::save_base_url_to(&config_path, "http://localhost:8080/").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# sitectl Configuration"));
    }

    #[test]
    fn test_save_base_url_preserves_other_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "site_name = \"Shop\"\npoll_interval_secs = 30\n",
        )
        .unwrap();

        Config::save_base_url_to(&config_path, "https://status.example.com").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url, "https://status.example.com");
        assert_eq!(config.site_name, "Shop");
        assert_eq!(config.poll_interval_secs, 30);
    }

    #[test]
    fn test_save_base_url_rejects_invalid_url() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        assert!(Config::save_base_url_to(&config_path, "ftp://nope").is_err());
        assert!(!config_path.exists());
    }
}
