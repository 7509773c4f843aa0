//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::{Credentials, GatewayConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from the process environment.
///
/// If `GATEWAY_CONFIG` names a TOML file it is read first; environment
/// variables then override individual fields.
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` as the environment.
pub fn load_from<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup("GATEWAY_CONFIG") {
        Some(path) if !path.is_empty() => load_file(Path::new(&path))?,
        _ => GatewayConfig::default(),
    };

    apply_env(&mut config, &lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML configuration file without validating it.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn apply_env<F>(config: &mut GatewayConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = parse_var(lookup, "PORT")? {
        config.listener.port = port;
    }
    if let Some(host) = non_empty(lookup, "BIND_HOST") {
        config.listener.host = host;
    }

    if let Some(base_url) = non_empty(lookup, "OCM_BASE_URL") {
        config.upstream.base_url = base_url;
    }
    match (non_empty(lookup, "OCM_USERNAME"), non_empty(lookup, "OCM_PASSWORD")) {
        (Some(username), Some(password)) => {
            config.upstream.credentials = Some(Credentials { username, password });
        }
        (None, None) => {}
        // A half-configured pair is treated like no credentials at all.
        _ => config.upstream.credentials = None,
    }

    if let Some(v) = parse_bool(lookup, "UPSTREAM_SYSTEM_PROXY")? {
        config.upstream.system_proxy = v;
    }

    if let Some(v) = parse_var(lookup, "UPSTREAM_TIMEOUT_SECS")? {
        config.timeouts.upstream_secs = v;
    }
    if let Some(v) = parse_var(lookup, "UPSTREAM_CONNECT_TIMEOUT_SECS")? {
        config.timeouts.connect_secs = v;
    }
    if let Some(v) = parse_var(lookup, "REQUEST_TIMEOUT_SECS")? {
        config.timeouts.request_secs = v;
    }

    if let Some(v) = parse_var(lookup, "UPSTREAM_MAX_RETRIES")? {
        config.retries.max_retries = v;
    }
    if let Some(v) = parse_var(lookup, "RETRY_BASE_DELAY_MS")? {
        config.retries.base_delay_ms = v;
    }

    if let Some(v) = parse_var(lookup, "SCHEDULE_WINDOW_DAYS")? {
        config.schedule.window_days = v;
    }
    if let Some(v) = parse_var(lookup, "MAX_BODY_SIZE")? {
        config.security.max_body_size = v;
    }
    if let Some(v) = parse_bool(lookup, "RELAY_ENABLED")? {
        config.security.relay_enabled = v;
    }

    if let Some(format) = non_empty(lookup, "LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::InvalidEnv {
                    var: "LOG_FORMAT",
                    value: format,
                })
            }
        };
    }
    if let Some(v) = parse_bool(lookup, "METRICS_ENABLED")? {
        config.observability.metrics_enabled = v;
    }
    if let Some(addr) = non_empty(lookup, "METRICS_ADDRESS") {
        config.observability.metrics_address = addr;
    }

    Ok(())
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, var) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        None => Ok(None),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, var) {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnv { var, value }),
        },
        None => Ok(None),
    }
}
