//! Runtime configuration sourced from the environment.
//!
//! Values are layered with figment: compiled-in defaults first, then the
//! process environment (after `.env` has been loaded by the binary).

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::db::DatabaseConfig;

/// Environment keys recognized by [`Config::figment`].
const ENV_KEYS: &[&str] = &[
    "database_url",
    "cors_origins",
    "listen_addr",
    "loglevel",
    "db_max_connections",
    "db_acquire_timeout_secs",
    "bcrypt_cost",
    "seed_sample_data",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// sqlx connection string for the store.
    pub database_url: String,
    /// Comma-separated list of origins allowed to make cross-origin calls.
    pub cors_origins: String,
    pub listen_addr: String,
    pub loglevel: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub bcrypt_cost: u32,
    /// Insert the development sample rows on boot when the store is empty.
    pub seed_sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:time_off_system.db".to_string(),
            cors_origins: "http://localhost:3000".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            db_max_connections: 5,
            db_acquire_timeout_secs: 5,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            seed_sample_data: false,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::raw().only(ENV_KEYS))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Split `cors_origins` into its trimmed, non-empty entries.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.db_max_connections,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_apply_without_environment() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let cfg = Config::load()?;
            assert_eq!(cfg, Config::default());
            assert_eq!(cfg.allowed_origins(), vec!["http://localhost:3000"]);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("DATABASE_URL", "sqlite:/tmp/other.db");
            jail.set_env("CORS_ORIGINS", "https://a.example, https://b.example,");
            jail.set_env("DB_MAX_CONNECTIONS", "12");
            jail.set_env("SEED_SAMPLE_DATA", "true");

            let cfg = Config::load()?;
            assert_eq!(cfg.database_url, "sqlite:/tmp/other.db");
            assert_eq!(
                cfg.allowed_origins(),
                vec!["https://a.example", "https://b.example"]
            );
            assert!(cfg.seed_sample_data);

            let db = cfg.database();
            assert_eq!(db.max_connections, 12);
            assert_eq!(db.acquire_timeout, Duration::from_secs(5));
            Ok(())
        });
    }
}
