//! Configuration loading utilities.
//!
//! Layered configuration loading using figment:
//! - Defaults (compiled in)
//! - Configuration file (TOML), optional
//! - Environment variables, prefixed `TICKETING_`
//!
//! # Example
//!
//! ```rust,ignore
//! use ticketing_common::config::load_config;
//!
//! let config: AppConfig = load_config("ticketing", None)?;
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// PostgreSQL connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_url() -> String {
    "postgres://localhost/ticketing".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Redis connection configuration, backing both the Cache and the Lock
/// Manager's production variant.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,

    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}
fn default_redis_pool_size() -> usize {
    10
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
        }
    }
}

/// Reservation window: how long a `RESERVED` ticket holds before the reaper
/// may reclaim it (§4.2, `RESERVATION_WINDOW`).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ReservationConfig {
    #[serde(default = "default_reservation_window_secs")]
    pub window_secs: u64,
}

fn default_reservation_window_secs() -> u64 {
    600 // 10 minutes
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            window_secs: default_reservation_window_secs(),
        }
    }
}

/// Expiry reaper cadence (§4.3).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ReaperConfig {
    #[serde(default = "default_reaper_period_secs")]
    pub period_secs: u64,

    #[serde(default = "default_reaper_initial_delay_secs")]
    pub initial_delay_secs: u64,
}

fn default_reaper_period_secs() -> u64 {
    300 // 5 minutes
}
fn default_reaper_initial_delay_secs() -> u64 {
    60 // 1 minute
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            period_secs: default_reaper_period_secs(),
            initial_delay_secs: default_reaper_initial_delay_secs(),
        }
    }
}

/// Lock Manager wait/lease budgets (§4.1).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct LockConfig {
    #[serde(default = "default_lock_wait_budget_ms")]
    pub wait_budget_ms: u64,

    #[serde(default = "default_lock_lease_budget_ms")]
    pub lease_budget_ms: u64,
}

fn default_lock_wait_budget_ms() -> u64 {
    3_000
}
fn default_lock_lease_budget_ms() -> u64 {
    10_000
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_budget_ms: default_lock_wait_budget_ms(),
            lease_budget_ms: default_lock_lease_budget_ms(),
        }
    }
}

/// Cache TTLs (§4.4).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    600 // 10 minutes
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub reservation: ReservationConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Load configuration from layered sources.
///
/// Sources (in order of precedence): defaults, then the config file (if
/// given), then environment variables prefixed `<PREFIX>_`, e.g. with
/// prefix "ticketing", `TICKETING_DATABASE_URL` sets `database.url`.
pub fn load_config<T: Default + Serialize + for<'de> Deserialize<'de>>(
    prefix: &str,
    config_file: Option<&str>,
) -> Result<T, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(T::default()));

    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed(&format!("{}_", prefix.to_uppercase())).split("__"));

    figment.extract()
}

/// Load the complete application configuration from defaults, file, and env.
pub fn load_app_config(config_file: Option<&str>) -> Result<AppConfig, figment::Error> {
    load_config("ticketing", config_file)
}
