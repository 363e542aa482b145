use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api-efiling.vercel.app/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
  #[serde(default)]
  pub certificate: CertificateConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Freshness window and periodic refresh interval
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
  /// Keep cached lists separate per signed-in account
  #[serde(default = "default_true")]
  pub per_account: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_secs: default_ttl_secs(),
      per_account: true,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

fn default_true() -> bool {
  true
}

fn default_ttl_secs() -> u64 {
  300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Directory for log files (defaults to the data directory)
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      directory: None,
    }
  }
}

fn default_log_level() -> String {
  "info".to_string()
}

/// Fixed parts of the research certificate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
  /// Where the research took place
  pub laboratory: String,
  pub signer_name: String,
  pub signer_title: String,
  /// Place of issue printed above the signature
  pub city: String,
  /// Where PDFs are written (defaults to the current directory)
  pub output_dir: Option<PathBuf>,
}

impl Default for CertificateConfig {
  fn default() -> Self {
    Self {
      laboratory: "Lab ICT".to_string(),
      signer_name: "Kepala Lab ICT".to_string(),
      signer_title: "Kepala Lab ICT".to_string(),
      city: "Jakarta".to_string(),
      output_dir: None,
    }
  }
}

impl CertificateConfig {
  pub fn output_directory(&self) -> PathBuf {
    self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./efiling.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/efiling/config.yaml
  ///
  /// Without a file the defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("efiling.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("efiling").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Bearer token from the environment, if set.
  pub fn env_token() -> Option<String> {
    std::env::var("EFILING_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }

  /// Log directory, falling back to the data directory.
  pub fn log_directory(&self) -> PathBuf {
    self.log.directory.clone().unwrap_or_else(|| {
      dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("efiling")
        .join("logs")
    })
  }
}
