use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_FILE_NAME: &str = ".pd.yml";

/// Contents of `~/.pd.yml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// PagerDuty REST API token.
    #[serde(default)]
    pub authtoken: String,
    /// Overrides the PagerDuty API endpoint, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the provided path or `~/.pd.yml`.
    ///
    /// There is no fallback: a missing or unreadable file, malformed YAML or
    /// an empty token are all errors.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        debug!(path = %path.display(), "Loading config");

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Unable to read config file at {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("Malformed YAML in config file {}", path.display()))?;

        if config.authtoken.trim().is_empty() {
            bail!("Config file {} has no authtoken", path.display());
        }

        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE_NAME)
    }
}
