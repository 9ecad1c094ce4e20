//! Configuration loading.

use crate::config::GatewayConfig;
use secrecy::SecretString;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use validator::Validate;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

/// File used when `GATEWAY_CONFIG` is unset, if it exists
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.yaml";

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed
    #[error("failed to parse config file {path}: {message}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Unknown file extension
    #[error("unsupported config format for {0} (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    /// An environment override has an unusable value
    #[error("invalid value for {var}: {message}")]
    InvalidEnv {
        /// Variable name
        var: String,
        /// What is wrong
        message: String,
    },

    /// The merged configuration failed validation
    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Load the configuration from file and environment, then validate it.
///
/// # Errors
/// Returns error if the file cannot be read or parsed, an environment
/// override is malformed, or the merged configuration is invalid
pub async fn load_config() -> Result<GatewayConfig, ConfigError> {
    let path = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from).or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        default.exists().then_some(default)
    });

    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            load_from_file(&path).await?
        }
        None => {
            debug!("No configuration file, using defaults");
            GatewayConfig::default()
        }
    };

    apply_env_overrides(&mut config, |var| env::var(var).ok())?;
    config.validate()?;

    Ok(config)
}

/// Parse a YAML or TOML configuration file (no env overrides, no validation)
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub async fn load_from_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    parse_config(path, &contents)
}

fn parse_config(path: &Path, contents: &str) -> Result<GatewayConfig, ConfigError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match extension.as_deref() {
        Some("yaml" | "yml") => {
            serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))
        }
        Some("toml") => toml::from_str(contents).map_err(|e| parse_error(e.to_string())),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Apply environment overrides through `lookup`.
///
/// Recognized variables: `GATEWAY_HOST`, `GATEWAY_PORT`, `GATEWAY_LOG_LEVEL`,
/// `GATEWAY_LOG_FORMAT` (`json` or `pretty`) and, per provider tag,
/// `<TAG>_API_KEY`, `<TAG>_BASE_URL`, `<TAG>_ENABLED`.
///
/// # Errors
/// Returns error if a numeric or boolean variable cannot be parsed
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("GATEWAY_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("GATEWAY_PORT") {
        config.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
            var: "GATEWAY_PORT".to_string(),
            message: format!("'{port}' is not a port number"),
        })?;
    }
    if let Some(level) = lookup("GATEWAY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = lookup("GATEWAY_LOG_FORMAT") {
        config.logging.json = match format.to_ascii_lowercase().as_str() {
            "json" => true,
            "pretty" | "text" => false,
            other => {
                return Err(ConfigError::InvalidEnv {
                    var: "GATEWAY_LOG_FORMAT".to_string(),
                    message: format!("'{other}' is not one of json, pretty"),
                })
            }
        };
    }

    for tag in [
        crate::config::MAXKB,
        crate::config::DIFY,
        crate::config::RAGFLOW,
        crate::config::SQLBOT,
    ] {
        let prefix = tag.to_ascii_uppercase();
        let Some(settings) = config.providers.get_mut(tag) else {
            continue;
        };

        if let Some(key) = lookup(&format!("{prefix}_API_KEY")) {
            settings.api_key = SecretString::new(key);
        }
        if let Some(url) = lookup(&format!("{prefix}_BASE_URL")) {
            settings.base_url = Some(url);
        }
        let enabled_var = format!("{prefix}_ENABLED");
        if let Some(enabled) = lookup(&enabled_var) {
            settings.enabled = parse_bool(&enabled).ok_or_else(|| ConfigError::InvalidEnv {
                var: enabled_var.clone(),
                message: format!("'{enabled}' is not a boolean"),
            })?;
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
