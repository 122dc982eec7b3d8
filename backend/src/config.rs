use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreKind::Redis),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("expected 'redis' or 'memory', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub store: StoreKind,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            env::var(key)
                .map_err(|_| warn!("Environment variable {key} not found, using default"))
                .ok()
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load(&lookup, "PORT", "3000")?,
            redis_url: try_load(&lookup, "REDIS_URL", "redis://127.0.0.1:6379")?,
            store: try_load(&lookup, "TODO_STORE", "redis")?,
            static_dir: try_load(&lookup, "STATIC_DIR", "frontend/dist")?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.store, StoreKind::Redis);
        assert_eq!(config.static_dir, PathBuf::from("frontend/dist"));
    }

    #[rstest]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("TODO_STORE", "Memory"),
            ("STATIC_DIR", "/srv/todo"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.static_dir, PathBuf::from("/srv/todo"));
    }

    #[rstest]
    #[case("PORT", "eighty")]
    #[case("PORT", "70000")]
    #[case("TODO_STORE", "mongo")]
    fn rejects_bad_values(#[case] key: &str, #[case] value: &str) {
        let error = Config::from_lookup(lookup(&[(key, value)])).unwrap_err();
        let ConfigError::Invalid { key: bad_key, .. } = error;
        assert_eq!(bad_key, key);
    }
}
