//! Configuration loading

use crate::{Config, ConfigFormat};
use kelp_core::{Error, Result};
use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::path::Path;

/// `${NAME}` or `${NAME:-fallback}`
const ENV_REFERENCE: &str = r"\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?::-(?P<fallback>[^}]*))?\}";

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    load_from_str(&content, format)
}

/// Load configuration from a string, after environment substitution
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    format.parse(&substitute_env(content)?)
}

/// Replace every environment reference in `content`.
///
/// A set variable wins over the fallback. An unset variable without a
/// fallback is an error naming the first such variable.
fn substitute_env(content: &str) -> Result<String> {
    let pattern = Regex::new(ENV_REFERENCE)
        .map_err(|e| Error::Config(format!("Invalid env reference pattern: {e}")))?;

    let mut unset = None;
    let substituted = pattern.replace_all(content, |caps: &Captures<'_>| {
        let name = &caps["name"];
        match (env::var(name), caps.name("fallback")) {
            (Ok(value), _) => value,
            (Err(_), Some(fallback)) => fallback.as_str().to_string(),
            (Err(_), None) => {
                unset.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match unset {
        Some(name) => Err(Error::Config(format!(
            "Environment variable '{name}' not set and no default provided"
        ))),
        None => Ok(substituted.into_owned()),
    }
}

/// Load and validate configuration from a file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = load_from_file(path)?;

    crate::validator::validate_config(&config)?;

    Ok(config)
}
