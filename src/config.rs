use anyhow::Result;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Database
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Capability checks
    pub localizer_api_key: Option<String>,
    pub editor_api_key: Option<String>,

    // Message broker handed to clients joining a session
    pub broker_url: String,
    pub broker_user: String,
    pub broker_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Server
            port: parse_var("PORT", 8000),

            // Database - unset means the in-memory store is used
            database_url: non_empty_var("DATABASE_URL"),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5),

            localizer_api_key: non_empty_var("LOCALIZER_API_KEY"),
            editor_api_key: non_empty_var("EDITOR_API_KEY"),

            // Broker
            broker_url: std::env::var("BROKER_URL")
                .unwrap_or_else(|_| "ws://localhost:15674/ws".to_string()),
            broker_user: std::env::var("BROKER_USER").unwrap_or_else(|_| "guest".to_string()),
            broker_password: std::env::var("BROKER_PASSWORD")
                .unwrap_or_else(|_| "guest".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            database_url: None,
            database_max_connections: 5,
            localizer_api_key: None,
            editor_api_key: None,
            broker_url: "ws://localhost:15674/ws".to_string(),
            broker_user: "guest".to_string(),
            broker_password: "guest".to_string(),
        }
    }
}

/// Parse an environment variable, falling back to `default` when it is unset or malformed
fn parse_var<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("{} is not valid ({}), using {}", key, value, default);
            default
        }),
        Err(_) => default,
    }
}

/// Read an environment variable, treating blank values as unset
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
