//! Configuration management

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Valhalla-compatible matrix backend URL (optional, falls back to Haversine if unavailable)
    pub valhalla_url: Option<String>,

    /// JWT secret key used to verify bearer tokens
    pub jwt_secret: String,

    /// How long a resolved distance/time matrix stays cached, keyed by point-set fingerprint
    pub matrix_cache_ttl_secs: u64,

    /// Maximum number of points (depots + stops) accepted in a single matrix request
    pub matrix_max_points: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;

        let valhalla_url = std::env::var("VALHALLA_URL").ok();

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-min-32-bytes!!".to_string());

        let matrix_cache_ttl_secs = std::env::var("MATRIX_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let matrix_max_points = std::env::var("MATRIX_MAX_POINTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(200);

        Ok(Self {
            nats_url,
            database_url,
            valhalla_url,
            jwt_secret,
            matrix_cache_ttl_secs,
            matrix_max_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn valhalla_url_none_when_not_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("VALHALLA_URL");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert!(config.valhalla_url.is_none());
    }

    #[test]
    fn valhalla_url_some_when_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("VALHALLA_URL", "http://localhost:8002");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.valhalla_url, Some("http://localhost:8002".to_string()));

        std::env::remove_var("VALHALLA_URL");
    }

    #[test]
    fn matrix_cache_ttl_defaults_when_not_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("MATRIX_CACHE_TTL_SECS");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.matrix_cache_ttl_secs, 300);
    }

    #[test]
    fn matrix_max_points_uses_env_when_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MATRIX_MAX_POINTS", "50");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.matrix_max_points, 50);

        std::env::remove_var("MATRIX_MAX_POINTS");
    }
}
