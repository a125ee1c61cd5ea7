//! Configuration loading and resolution
//!
//! Every setting resolves in priority order:
//! 1. Command-line argument or environment variable (parsed by the binary)
//! 2. TOML config file
//! 3. Compiled default
//!
//! The JWT secret has no default; startup fails when it is missing.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default CORS origin for the editor frontend
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Default token lifetime expression
pub const DEFAULT_JWT_EXPIRE: &str = "7d";

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub jwt_expire: Option<String>,
    pub frontend_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
}

/// TOML config file contents (every key optional)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub jwt_expire: Option<String>,
    pub frontend_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_lifetime: Duration,
    pub frontend_url: String,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
}

impl ServerConfig {
    /// Merge overrides, TOML values and compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let jwt_secret = non_empty(overrides.jwt_secret)
            .or_else(|| non_empty(toml.jwt_secret))
            .ok_or_else(|| {
                Error::Config(
                    "JWT secret not configured. Set JWT_SECRET or jwt_secret in config.toml"
                        .to_string(),
                )
            })?;

        let jwt_expire = non_empty(overrides.jwt_expire)
            .or_else(|| non_empty(toml.jwt_expire))
            .unwrap_or_else(|| DEFAULT_JWT_EXPIRE.to_string());
        let jwt_lifetime = parse_duration(&jwt_expire)?;

        Ok(Self {
            host: non_empty(overrides.host)
                .or_else(|| non_empty(toml.host))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or(toml.database_path)
                .unwrap_or_else(default_database_path),
            uploads_dir: overrides
                .uploads_dir
                .or(toml.uploads_dir)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            jwt_secret,
            jwt_lifetime,
            frontend_url: non_empty(overrides.frontend_url)
                .or_else(|| non_empty(toml.frontend_url))
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            openai_api_key: non_empty(overrides.openai_api_key)
                .or_else(|| non_empty(toml.openai_api_key)),
            groq_api_key: non_empty(overrides.groq_api_key)
                .or_else(|| non_empty(toml.groq_api_key)),
            unsplash_access_key: non_empty(overrides.unsplash_access_key)
                .or_else(|| non_empty(toml.unsplash_access_key)),
        })
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Treat empty and whitespace-only values as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load a TOML config file
///
/// An explicit path must exist. Without one, the platform config location is
/// tried and a missing file yields the empty config.
pub fn load_toml(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using environment and defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config: TomlConfig = toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;

    if config.jwt_secret.is_some() {
        warn!("jwt_secret read from {}; prefer the JWT_SECRET environment variable", path.display());
    }
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// `~/.config/newsdesk/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("newsdesk").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("newsdesk"))
        .unwrap_or_else(|| PathBuf::from("./newsdesk_data"))
        .join("newsdesk.db")
}

/// Parse a lifetime such as `7d`, `12h`, `30m`, `45s` or bare seconds
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let invalid = || Error::Config(format!("Invalid duration: '{}'", value));

    let (digits, multiplier) = match value.chars().last() {
        Some('d') => (&value[..value.len() - 1], 86_400),
        Some('h') => (&value[..value.len() - 1], 3_600),
        Some('m') => (&value[..value.len() - 1], 60),
        Some('s') => (&value[..value.len() - 1], 1),
        Some(c) if c.is_ascii_digit() => (value, 1),
        _ => return Err(invalid()),
    };

    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }
    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}
