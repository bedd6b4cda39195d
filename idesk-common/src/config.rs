//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The MongoDB URI has no compiled default; resolution fails without one.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::task::COLLECTION;
use crate::{Error, Result};

pub const DEFAULT_DATABASE: &str = "interviewSupport";
pub const DEFAULT_BIND: &str = "127.0.0.1:5730";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

pub const ENV_MONGODB_URI: &str = "MONGODB_URI";
pub const ENV_DATABASE: &str = "IDESK_DATABASE";
pub const ENV_COLLECTION: &str = "IDESK_COLLECTION";
pub const ENV_BIND: &str = "IDESK_BIND";
pub const ENV_TIMEZONE: &str = "IDESK_TIMEZONE";
pub const ENV_CONFIG_FILE: &str = "IDESK_CONFIG";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub mongodb_uri: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub bind: Option<String>,
    pub timezone: Option<String>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub mongodb_uri: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub bind: Option<String>,
    pub timezone: Option<String>,
    pub config_file: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub mongodb_uri: String,
    pub database: String,
    pub collection: String,
    pub bind: String,
    /// Zone in which "today" is computed for the live feed
    pub timezone: Tz,
}

impl ServiceConfig {
    /// Resolve from overrides, the environment and the config file
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let file = match config_file_path(overrides.config_file.as_deref()) {
            Some(path) => Some(load_toml_config(&path)?),
            None => {
                debug!("No config file found, using environment and defaults");
                None
            }
        };
        Self::resolve_with(overrides, file.as_ref())
    }

    /// Resolve against an already-loaded config file
    pub fn resolve_with(overrides: &ConfigOverrides, file: Option<&TomlConfig>) -> Result<Self> {
        let from_file = |get: fn(&TomlConfig) -> Option<&String>| file.and_then(get).cloned();

        let mongodb_uri = pick(
            overrides.mongodb_uri.as_deref(),
            ENV_MONGODB_URI,
            from_file(|f| f.mongodb_uri.as_ref()),
        )
        .ok_or_else(|| {
            Error::Config(format!(
                "MongoDB URI not set (use --mongodb-uri, {} or mongodb_uri in config.toml)",
                ENV_MONGODB_URI
            ))
        })?;

        let database = pick(
            overrides.database.as_deref(),
            ENV_DATABASE,
            from_file(|f| f.database.as_ref()),
        )
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let collection = pick(
            overrides.collection.as_deref(),
            ENV_COLLECTION,
            from_file(|f| f.collection.as_ref()),
        )
        .unwrap_or_else(|| COLLECTION.to_string());

        let bind = pick(
            overrides.bind.as_deref(),
            ENV_BIND,
            from_file(|f| f.bind.as_ref()),
        )
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let timezone = pick(
            overrides.timezone.as_deref(),
            ENV_TIMEZONE,
            from_file(|f| f.timezone.as_ref()),
        )
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        Ok(Self {
            mongodb_uri,
            database,
            collection,
            bind,
            timezone: parse_timezone(&timezone)?,
        })
    }
}

/// Parse an IANA zone name such as `America/New_York`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| Error::Config(format!("Unknown timezone '{}': {}", name, e)))
}

/// First non-empty value of CLI argument, environment variable, file value
fn pick(cli: Option<&str>, env_var: &str, file: Option<String>) -> Option<String> {
    cli.filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|v| !v.is_empty()))
        .or_else(|| file.filter(|v| !v.is_empty()))
}

/// Locate the config file
///
/// An explicit path (argument or `IDESK_CONFIG`) is returned as-is, even if it
/// does not exist, so that a typo surfaces as an error. Otherwise the user
/// config dir (`~/.config/idesk/config.toml` on Linux) is tried, then
/// `/etc/idesk/config.toml`.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("idesk").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/idesk/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        warn!("Could not read config file {}: {}", path.display(), e);
        Error::Config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}
