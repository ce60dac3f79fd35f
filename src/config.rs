// rc-file configuration for procflow
//
// The rc file lives at ~/.procflow/rc and holds `key=value` lines:
//   data.location=./workflow.db
//   backend.url=http://localhost:8003
//   backend.timeout=30

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `backend.url`
pub const BACKEND_URL_ENV: &str = "PROCFLOW_BACKEND_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub data_location: PathBuf,
    pub backend_url: Option<String>,
    pub backend_timeout: Duration,
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;
        Ok(home.join(".procflow"))
    }

    /// Get the configuration file path
    pub fn rc_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("rc"))
    }

    /// Get the default database path
    pub fn default_data_location() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("workflow.db"))
    }

    /// Load configuration from the rc file, falling back to defaults
    pub fn load() -> Result<Self> {
        let rc_path = Self::rc_path()?;
        let mut config = Self {
            data_location: Self::default_data_location()?,
            backend_url: None,
            backend_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        if rc_path.exists() {
            let content = std::fs::read_to_string(&rc_path)
                .with_context(|| format!("Failed to read config: {}", rc_path.display()))?;
            config.apply_rc(&content, rc_path.parent())?;
        }

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend_url = Some(url.trim().to_string());
            }
        }

        log::debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    /// Apply rc-file content on top of the current values.
    /// Relative paths resolve against `base_dir` (the rc file's directory).
    pub fn apply_rc(&mut self, content: &str, base_dir: Option<&Path>) -> Result<()> {
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("Ignoring malformed config line {}: {}", lineno + 1, line);
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    self.data_location = match base_dir {
                        Some(dir) if path.is_relative() => dir.join(path),
                        _ => path,
                    };
                }
                "backend.url" => {
                    self.backend_url = if value.is_empty() { None } else { Some(value.to_string()) };
                }
                "backend.timeout" => {
                    let secs: u64 = value.parse()
                        .with_context(|| format!("Invalid backend.timeout '{}' (expected seconds)", value))?;
                    self.backend_timeout = Duration::from_secs(secs);
                }
                other => log::warn!("Ignoring unknown config key '{}'", other),
            }
        }
        Ok(())
    }
}
