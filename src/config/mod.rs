//! Configuration module for the admin gateway.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of the remote admin API. `None` serves from the local store.
    pub backend_url: Option<String>,
    /// Path to the SQLite database of the local backend
    pub db_path: PathBuf,
    /// Insert demo records into an empty local store
    pub seed_demo: bool,
    /// Pre-shared key for `/internal/revalidate`. `None` disables the endpoint.
    pub revalidate_key: Option<String>,
    /// Lifetime of cached reads; zero disables caching
    pub cache_ttl: Duration,
    /// Page size used when fetching uniqueness snapshots and lookups
    pub snapshot_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            backend_url: None,
            db_path: PathBuf::from("./data/admin.sqlite"),
            seed_demo: false,
            revalidate_key: None,
            cache_ttl: Duration::from_secs(60),
            snapshot_page_size: 500,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let bind_addr = match non_empty_var("ADMIN_BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid ADMIN_BIND_ADDR format: {}", addr)))?,
            None => defaults.bind_addr,
        };

        let log_level = non_empty_var("ADMIN_LOG_LEVEL").unwrap_or(defaults.log_level);

        let backend_url = non_empty_var("ADMIN_BACKEND_URL");
        if let Some(url) = &backend_url {
            url::Url::parse(url)
                .map_err(|e| AppError::Config(format!("Invalid ADMIN_BACKEND_URL {}: {}", url, e)))?;
        }

        let db_path = non_empty_var("ADMIN_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let seed_demo = match non_empty_var("ADMIN_SEED_DEMO") {
            Some(flag) => parse_flag("ADMIN_SEED_DEMO", &flag)?,
            None => defaults.seed_demo,
        };

        let revalidate_key = non_empty_var("ADMIN_REVALIDATE_KEY");

        let cache_ttl = match non_empty_var("ADMIN_CACHE_TTL_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|_| {
                AppError::Config(format!("Invalid ADMIN_CACHE_TTL_SECS: {}", secs))
            })?),
            None => defaults.cache_ttl,
        };

        let snapshot_page_size = match non_empty_var("ADMIN_SNAPSHOT_PAGE_SIZE") {
            Some(size) => size
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| AppError::Config(format!("Invalid ADMIN_SNAPSHOT_PAGE_SIZE: {}", size)))?,
            None => defaults.snapshot_page_size,
        };

        Ok(Self {
            bind_addr,
            log_level,
            backend_url,
            db_path,
            seed_demo,
            revalidate_key,
            cache_ttl,
            snapshot_page_size,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_flag(name: &str, value: &str) -> Result<bool, AppError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("Invalid {}: {}", name, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 8] = [
        "ADMIN_BIND_ADDR",
        "ADMIN_LOG_LEVEL",
        "ADMIN_BACKEND_URL",
        "ADMIN_DB_PATH",
        "ADMIN_SEED_DEMO",
        "ADMIN_REVALIDATE_KEY",
        "ADMIN_CACHE_TTL_SECS",
        "ADMIN_SNAPSHOT_PAGE_SIZE",
    ];

    // Both cases share one test: the environment is process-wide.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(config.backend_url.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/admin.sqlite"));
        assert!(!config.seed_demo);
        assert!(config.revalidate_key.is_none());
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.snapshot_page_size, 500);

        env::set_var("ADMIN_CACHE_TTL_SECS", "0");
        env::set_var("ADMIN_SEED_DEMO", "yes");
        let config = Config::from_env().unwrap();
        assert!(config.cache_ttl.is_zero());
        assert!(config.seed_demo);

        env::set_var("ADMIN_SNAPSHOT_PAGE_SIZE", "0");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));
        env::set_var("ADMIN_SNAPSHOT_PAGE_SIZE", "200");

        env::set_var("ADMIN_BACKEND_URL", "not a url");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));

        for var in VARS {
            env::remove_var(var);
        }
    }
}
