//! Process configuration, read once from the environment at startup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TALLY_BIND` | `0.0.0.0:8080` |
//! | `DATABASE_URL` | `sqlite://database.sqlite` |
//! | `TALLY_STATIC_DIR` | `www` (shipped at the repository root) |
//! | `TALLY_COOLDOWN_MINUTES` | `45` |
//! | `TALLY_SEED_USERS` | none (`id:name,id:name`) |

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use tally_core::{User, UserId, DEFAULT_COOLDOWN_MINUTES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database_url: String,
    pub static_dir: PathBuf,
    pub cooldown_minutes: u32,
    /// Users registered at startup when their id is not taken yet.
    pub seed_users: Vec<User>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &'static str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                tracing::info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let bind: SocketAddr = var("TALLY_BIND", "0.0.0.0:8080")
            .parse()
            .map_err(|e| ConfigError::invalid("TALLY_BIND", format!("{e}")))?;

        let cooldown_minutes: u32 = var("TALLY_COOLDOWN_MINUTES", &DEFAULT_COOLDOWN_MINUTES.to_string())
            .parse()
            .map_err(|e| ConfigError::invalid("TALLY_COOLDOWN_MINUTES", format!("{e}")))?;

        let seed_users = match lookup("TALLY_SEED_USERS") {
            Some(raw) => parse_seed_users(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bind,
            database_url: var("DATABASE_URL", "sqlite://database.sqlite"),
            static_dir: PathBuf::from(var("TALLY_STATIC_DIR", "www")),
            cooldown_minutes,
            seed_users,
        })
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cooldown_minutes))
    }
}

/// Parse `1:Alice,2:Bob`. Blank entries are skipped.
fn parse_seed_users(raw: &str) -> Result<Vec<User>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, name) = entry.split_once(':').ok_or_else(|| {
                ConfigError::invalid("TALLY_SEED_USERS", format!("expected id:name, got {entry:?}"))
            })?;
            let id: UserId = id
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("TALLY_SEED_USERS", format!("{e}")))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::invalid(
                    "TALLY_SEED_USERS",
                    format!("empty name for user {id}"),
                ));
            }
            Ok(User::new(id, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.database_url, "sqlite://database.sqlite");
        assert_eq!(cfg.static_dir, PathBuf::from("www"));
        assert_eq!(cfg.cooldown_minutes, 45);
        assert_eq!(cfg.cooldown(), chrono::Duration::minutes(45));
        assert!(cfg.seed_users.is_empty());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("TALLY_BIND", "127.0.0.1:9000"),
            ("TALLY_COOLDOWN_MINUTES", "10"),
            ("TALLY_SEED_USERS", "2:Bob, 1:Alice ,"),
        ])
        .unwrap();

        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.cooldown_minutes, 10);
        let names: Vec<(i64, &str)> = cfg
            .seed_users
            .iter()
            .map(|u| (u.id.get(), u.name.as_str()))
            .collect();
        assert_eq!(names, vec![(2, "Bob"), (1, "Alice")]);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("TALLY_BIND", "nowhere")]).is_err());
        assert!(config(&[("TALLY_COOLDOWN_MINUTES", "-5")]).is_err());
        assert!(config(&[("TALLY_SEED_USERS", "Alice")]).is_err());
        assert!(config(&[("TALLY_SEED_USERS", "0:Alice")]).is_err());
        assert!(config(&[("TALLY_SEED_USERS", "1:")]).is_err());
    }
}
