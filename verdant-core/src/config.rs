//! Configuration parsing and management.

use crate::viewers::ClientViewer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: String, message: String },
}

/// Main configuration struct matching the verdant.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Namespace of generated log pages (`log/2024-03-05`)
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,

    /// Directory names skipped during the scan, at any depth
    #[serde(default = "default_reserved_dirs")]
    pub reserved_dirs: Vec<String>,

    /// Regexes matched against paths relative to the content root
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Fixed build date for relative-date links; the local date otherwise
    #[serde(default)]
    pub today: Option<NaiveDate>,

    #[serde(default)]
    pub client_viewers: Vec<ClientViewer>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    String::from("/")
}

fn default_log_prefix() -> String {
    String::from("log")
}

fn default_reserved_dirs() -> Vec<String> {
    vec![String::from("components")]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_content_dir")]
    pub content: PathBuf,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            base_url: default_base_url(),
            log_prefix: default_log_prefix(),
            reserved_dirs: default_reserved_dirs(),
            ignore_patterns: Vec::new(),
            today: None,
            client_viewers: Vec::new(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration for a bare content directory
    pub fn for_content_dir<P: AsRef<Path>>(content: P) -> Self {
        Self {
            paths: PathsConfig {
                content: content.as_ref().to_path_buf(),
            },
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.log_prefix.trim_matches('/');
        if prefix.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "log_prefix".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(viewer) = self.client_viewers.iter().find(|v| v.name.trim().is_empty()) {
            return Err(ConfigError::InvalidField {
                field: "client_viewers".into(),
                message: format!("viewer for module '{}' has no name", viewer.module),
            });
        }
        Ok(())
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Log namespace without surrounding slashes
    pub fn log_prefix(&self) -> &str {
        self.log_prefix.trim_matches('/')
    }

    /// The date relative-date links resolve against
    pub fn build_date(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }

    /// Normalized base URL with leading and trailing slash ("/foo/" or "/")
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }
}

/// Ensure base URLs have a leading and trailing slash
pub fn normalize_base_url(raw: &str) -> String {
    let mut s = raw.trim().to_string();
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    if !s.ends_with('/') {
        s.push('/');
    }

    while s.contains("//") {
        s = s.replace("//", "/");
    }

    s
}
