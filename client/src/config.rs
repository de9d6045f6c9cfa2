//! Configuration management for the client.
//!
//! Endpoints are resolved once from the deployment environment and never
//! re-derived afterwards.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use plank_engine::{Backoff, ReconnectPolicy, DEFAULT_TABLE};

use crate::error::ConfigError;

/// Where the backend lives relative to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Local development: backend on localhost:8000
    Development,
    /// Served by the backend itself, e.g. `https://plank.example.com`
    Production { origin: String },
}

/// Backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the HTTP API, without trailing slash
    pub api_base_url: String,
    /// Full URL of the notification socket
    pub ws_url: String,
}

impl BackendConfig {
    /// Derive endpoints for an environment.
    pub fn resolve(environment: &Environment) -> Result<Self, ConfigError> {
        match environment {
            Environment::Development => Ok(Self {
                api_base_url: "http://localhost:8000".to_string(),
                ws_url: "ws://localhost:8000/ws".to_string(),
            }),
            Environment::Production { origin } => {
                let origin = origin.trim_end_matches('/');
                let (ws_scheme, host) = if let Some(host) = origin.strip_prefix("https://") {
                    ("wss", host)
                } else if let Some(host) = origin.strip_prefix("http://") {
                    ("ws", host)
                } else {
                    return Err(ConfigError::InvalidOrigin(origin.to_string()));
                };

                Ok(Self {
                    api_base_url: origin.to_string(),
                    ws_url: format!("{}://{}/ws", ws_scheme, host),
                })
            }
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    /// Table whose notifications are applied
    pub table: String,
    pub reconnect: ReconnectPolicy,
    /// Maximum log entries kept; `None` keeps everything
    pub log_capacity: Option<usize>,
}

impl ClientConfig {
    /// Defaults around the given endpoints.
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            backend,
            table: DEFAULT_TABLE.to_string(),
            reconnect: ReconnectPolicy::default(),
            log_capacity: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("PLANK_ENV").as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production {
                origin: lookup("PLANK_ORIGIN").ok_or(ConfigError::MissingOrigin)?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "PLANK_ENV",
                    value: other.to_string(),
                })
            }
        };

        let mut backend = BackendConfig::resolve(&environment)?;
        if let Some(api) = lookup("PLANK_API_URL") {
            backend.api_base_url = api.trim_end_matches('/').to_string();
        }
        if let Some(ws) = lookup("PLANK_WS_URL") {
            backend.ws_url = ws;
        }

        let defaults = ReconnectPolicy::default();
        let max_attempts =
            parse_or(&lookup, "PLANK_MAX_RECONNECT_ATTEMPTS", defaults.max_attempts)?;
        let base_delay_ms = parse_or(
            &lookup,
            "PLANK_RECONNECT_DELAY_MS",
            defaults.base_delay.as_millis() as u64,
        )?;
        let backoff = match lookup("PLANK_BACKOFF").as_deref() {
            None | Some("linear") => Backoff::Linear,
            Some("exponential") => Backoff::Exponential {
                max_delay: Duration::from_millis(parse_or(
                    &lookup,
                    "PLANK_RECONNECT_MAX_DELAY_MS",
                    30_000u64,
                )?),
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "PLANK_BACKOFF",
                    value: other.to_string(),
                })
            }
        };

        let log_capacity = match lookup("PLANK_LOG_CAPACITY") {
            Some(raw) => Some(parse_value("PLANK_LOG_CAPACITY", &raw)?),
            None => None,
        };

        Ok(Self {
            backend,
            table: lookup("PLANK_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            reconnect: ReconnectPolicy {
                max_attempts,
                base_delay: Duration::from_millis(base_delay_ms),
                backoff,
            },
            log_capacity,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}
