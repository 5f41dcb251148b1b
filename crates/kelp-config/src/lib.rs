//! # Kelp Configuration
//!
//! Configuration management with support for:
//! - Multiple formats (YAML, TOML, JSON)
//! - Environment variable expansion
//! - Validation
//! - Default values

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod loader;
pub mod types;
pub mod validator;

pub use loader::{load_config, load_from_file, load_from_str};
pub use types::{Config, LoggingConfig, SessionConfig};
pub use validator::{validate_config, validate_session};

use kelp_core::{Error, Result};
use std::fmt;
use std::path::Path;

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Format for a file extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        [
            ("yaml", Self::Yaml),
            ("yml", Self::Yaml),
            ("toml", Self::Toml),
            ("json", Self::Json),
        ]
        .into_iter()
        .find_map(|(known, format)| ext.eq_ignore_ascii_case(known).then_some(format))
    }

    /// Format of a config file, from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => Self::from_extension(ext)
                .ok_or_else(|| Error::Config(format!("Unsupported config format: {ext}"))),
            None => Err(Error::Config(format!(
                "Unable to detect config format of {}",
                path.display()
            ))),
        }
    }

    /// Deserialize a document in this format
    pub fn parse(self, content: &str) -> Result<Config> {
        let parsed: std::result::Result<Config, String> = match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| Error::Config(format!("Failed to parse {self}: {reason}")))
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}
