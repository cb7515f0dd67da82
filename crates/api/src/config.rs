use std::path::PathBuf;

use leaders_core::push::{DEFAULT_RATE_LIMIT_MAX, DEFAULT_RATE_LIMIT_WINDOW_SECS};

use crate::auth::jwt::JwtConfig;

/// Default upload cap: 50 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Web Push (VAPID) settings.
    pub push: PushConfig,
    /// Push send rate limit.
    pub rate_limit: RateLimitSettings,
    /// Object storage settings.
    pub storage: StorageConfig,
}

/// VAPID key material. Push is disabled unless the private key is set.
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
    /// Contact URI sent as the VAPID `sub` claim.
    pub subject: String,
}

impl PushConfig {
    pub fn is_enabled(&self) -> bool {
        self.vapid_private_key.is_some()
    }
}

/// Where push rate limit counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// In-process sliding window; limits are per instance.
    Memory,
    /// Shared `rate_limit_hits` table; limits hold across instances.
    Postgres,
}

impl std::str::FromStr for RateLimitBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(RateLimitBackend::Memory),
            "postgres" => Ok(RateLimitBackend::Postgres),
            other => Err(format!("unknown rate limit backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub backend: RateLimitBackend,
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per bucket.
    pub root: PathBuf,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                    |
    /// |-------------------------------|----------------------------|
    /// | `HOST`                        | `0.0.0.0`                  |
    /// | `PORT`                        | `3000`                     |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                       |
    /// | `VAPID_PUBLIC_KEY`            | unset                      |
    /// | `VAPID_PRIVATE_KEY`           | unset (push disabled)      |
    /// | `VAPID_SUBJECT`               | `mailto:admin@localhost`   |
    /// | `PUSH_RATE_LIMIT_MAX`         | `20`                       |
    /// | `PUSH_RATE_LIMIT_WINDOW_SECS` | `60`                       |
    /// | `RATE_LIMIT_BACKEND`          | `memory`                   |
    /// | `STORAGE_ROOT`                | `./storage`                |
    /// | `MAX_UPLOAD_BYTES`            | `52428800`                 |
    ///
    /// # Panics
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let push = PushConfig {
            vapid_public_key: optional_env("VAPID_PUBLIC_KEY"),
            vapid_private_key: optional_env("VAPID_PRIVATE_KEY"),
            subject: std::env::var("VAPID_SUBJECT")
                .unwrap_or_else(|_| "mailto:admin@localhost".into()),
        };

        let rate_limit = RateLimitSettings {
            backend: std::env::var("RATE_LIMIT_BACKEND")
                .unwrap_or_else(|_| "memory".into())
                .parse()
                .unwrap_or_else(|e| panic!("RATE_LIMIT_BACKEND: {e}")),
            max_requests: parse_env("PUSH_RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX),
            window_secs: parse_env("PUSH_RATE_LIMIT_WINDOW_SECS", DEFAULT_RATE_LIMIT_WINDOW_SECS),
        };
        assert!(rate_limit.max_requests > 0, "PUSH_RATE_LIMIT_MAX must be positive");
        assert!(rate_limit.window_secs > 0, "PUSH_RATE_LIMIT_WINDOW_SECS must be positive");

        let storage = StorageConfig {
            root: std::env::var("STORAGE_ROOT")
                .unwrap_or_else(|_| "./storage".into())
                .into(),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            push,
            rate_limit,
            storage,
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} is invalid: {e}")),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_backend_parses_case_insensitively() {
        assert_eq!("memory".parse(), Ok(RateLimitBackend::Memory));
        assert_eq!(" Postgres ".parse(), Ok(RateLimitBackend::Postgres));
        assert!("redis".parse::<RateLimitBackend>().is_err());
    }

    #[test]
    fn push_is_disabled_without_private_key() {
        let push = PushConfig {
            vapid_public_key: Some("pub".into()),
            vapid_private_key: None,
            subject: "mailto:ops@example.com".into(),
        };
        assert!(!push.is_enabled());
    }
}
