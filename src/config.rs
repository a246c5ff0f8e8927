//! Server configuration from environment variables
//!
//! ```bash
//! NOTIFY_PORT=5000
//! FRONTEND_URL=http://localhost:5173
//! NOTIFY_ADMINS=root:change-me
//! NOTIFY_PUSH_SCOPE=all
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::push::{HubConfig, LifecycleConfig, PushScope};

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allowed CORS origin; `None` allows any origin without credentials
    pub frontend_url: Option<String>,
    pub session_ttl_seconds: i64,
    /// Admin accounts seeded at startup
    pub admins: Vec<(String, String)>,
    pub bcrypt_cost: u32,
    pub hub: HubConfig,
    pub lifecycle: LifecycleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            frontend_url: None,
            session_ttl_seconds: 86_400,
            admins: Vec::new(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            hub: HubConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("NOTIFY_HOST") {
            config.host = parse("NOTIFY_HOST", &host)?;
        }
        if let Some(port) = get("NOTIFY_PORT").or_else(|| get("PORT")) {
            config.port = parse("NOTIFY_PORT", &port)?;
        }
        config.frontend_url = get("FRONTEND_URL").map(|url| url.trim().to_string());

        if let Some(ttl) = get("NOTIFY_SESSION_TTL") {
            config.session_ttl_seconds = parse("NOTIFY_SESSION_TTL", &ttl)?;
        }
        if let Some(admins) = get("NOTIFY_ADMINS") {
            config.admins = parse_admins(&admins)?;
        }
        if let Some(cost) = get("NOTIFY_BCRYPT_COST") {
            let cost: u32 = parse("NOTIFY_BCRYPT_COST", &cost)?;
            if !(4..=31).contains(&cost) {
                return Err(invalid("NOTIFY_BCRYPT_COST", &cost.to_string(), "must be between 4 and 31"));
            }
            config.bcrypt_cost = cost;
        }

        if let Some(capacity) = get("NOTIFY_PUSH_QUEUE") {
            let capacity: usize = parse("NOTIFY_PUSH_QUEUE", &capacity)?;
            if capacity == 0 {
                return Err(invalid("NOTIFY_PUSH_QUEUE", "0", "must be at least 1"));
            }
            config.lifecycle.queue_capacity = capacity;
        }
        if let Some(ms) = get("NOTIFY_PUSH_SEND_TIMEOUT_MS") {
            config.hub.send_timeout = Duration::from_millis(parse("NOTIFY_PUSH_SEND_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = get("NOTIFY_PUSH_WRITE_TIMEOUT_MS") {
            config.lifecycle.write_timeout =
                Duration::from_millis(parse("NOTIFY_PUSH_WRITE_TIMEOUT_MS", &ms)?);
        }
        if let Some(scope) = get("NOTIFY_PUSH_SCOPE") {
            config.hub.scope = scope
                .parse::<PushScope>()
                .map_err(|reason| invalid("NOTIFY_PUSH_SCOPE", &scope, &reason))?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(name, value, &e.to_string()))
}

/// Parse `name:password,name:password`
fn parse_admins(value: &str) -> Result<Vec<(String, String)>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, password)) if !name.is_empty() && !password.is_empty() => {
                Ok((name.to_string(), password.to_string()))
            }
            _ => Err(invalid("NOTIFY_ADMINS", entry, "expected name:password")),
        })
        .collect()
}
