use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::catalog::DEFAULT_CHUNK_SIZE;
use crate::cli::Cli;

/// Root configuration structure, deserialized from `.license-sweeper/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub removal: RemovalConfig,
}

/// Where the account and catalog services live.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Seconds between license-list polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovalConfig {
    /// Packages per catalog request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Directory receiving `RemovedLicenses_<account>.log`.
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_token_env() -> String {
    "LICENSE_SWEEPER_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for RemovalConfig {
    fn default() -> Self {
        RemovalConfig {
            chunk_size: default_chunk_size(),
            audit_dir: default_audit_dir(),
        }
    }
}

impl Config {
    /// CLI flags take precedence over whatever the file said.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.gateway {
            self.gateway.base_url = url.clone();
        }
        if let Some(chunk_size) = cli.chunk_size {
            self.removal.chunk_size = chunk_size;
        }
        if let Some(dir) = &cli.audit_dir {
            self.removal.audit_dir = dir.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.removal.chunk_size == 0 {
            bail!("removal.chunk_size must be at least 1");
        }
        if self.gateway.poll_interval_secs == 0 {
            bail!("gateway.poll_interval_secs must be at least 1");
        }
        Ok(())
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<working_dir>/.license-sweeper/config.toml`
/// 3. `~/.config/license-sweeper/config.toml`
/// 4. Built-in [`Config::default`]
///
/// The result is not validated; call [`Config::validate`] once CLI overrides are applied.
pub fn load_config(working_dir: &Path, config_override: Option<&Path>) -> Result<Config> {
    let config = match find_config(working_dir, config_override) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };

    Ok(config)
}

fn find_config(working_dir: &Path, config_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_override {
        return Some(path.to_path_buf());
    }

    let local = working_dir.join(".license-sweeper").join("config.toml");
    if local.exists() {
        return Some(local);
    }

    let home = dirs::home_dir()?
        .join(".config")
        .join("license-sweeper")
        .join("config.toml");
    home.exists().then_some(home)
}
