//! Runtime settings read from the environment
use crate::error::ConfigError;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "SHOP_DB_PATH";
pub const CACHE_CAPACITY_VAR: &str = "SHOP_CACHE_CAPACITY";
pub const FLUSH_EVERY_MS_VAR: &str = "SHOP_FLUSH_EVERY_MS";

const DEFAULT_DB_PATH: &str = "./data/shop.db";
const DEFAULT_CACHE_CAPACITY: u64 = 64 * 1024 * 1024;
const DEFAULT_FLUSH_EVERY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub cache_capacity: u64,
    pub flush_every_ms: Option<u64>, // None disables the background flusher
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            flush_every_ms: Some(DEFAULT_FLUSH_EVERY_MS),
        }
    }
}

impl Config {
    /// Loads `.env` if one is present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        accept_missing_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(DB_PATH_VAR) {
            if path.trim().is_empty() {
                return Err(ConfigError::Empty(DB_PATH_VAR.into()));
            }
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(value) = lookup(CACHE_CAPACITY_VAR) {
            config.cache_capacity = parse_number(CACHE_CAPACITY_VAR, &value)?;
        }
        if let Some(value) = lookup(FLUSH_EVERY_MS_VAR) {
            config.flush_every_ms = match parse_number(FLUSH_EVERY_MS_VAR, &value)? {
                0 => None,
                ms => Some(ms),
            };
        }

        Ok(config)
    }

    pub fn sled_config(&self) -> sled::Config {
        sled::Config::new()
            .path(&self.db_path)
            .cache_capacity(self.cache_capacity)
            .flush_every_ms(self.flush_every_ms)
    }
}

// a missing .env is fine, real deployments set the variables directly
fn accept_missing_dotenv<T>(loaded: Result<T, dotenvy::Error>) -> Result<(), ConfigError> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            key: key.to_owned(),
            value: value.to_owned(),
        })
}
