use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use tracing::info;

use tally_core::{Clock, SystemClock, User};
use tally_infra::{CounterService, EventStore, EventStoreError, SqliteEventStore};

use crate::config::AppConfig;

pub type SharedStore = Arc<dyn EventStore>;
pub type SharedClock = Arc<dyn Clock>;
pub type AppCounter = CounterService<SharedStore, SharedClock>;

/// Everything the handlers need, shared behind an `Arc` extension.
pub struct AppServices {
    counter: AppCounter,
}

impl AppServices {
    pub fn new(store: SharedStore, clock: SharedClock, cooldown: Duration) -> Self {
        Self {
            counter: CounterService::new(store, clock, cooldown),
        }
    }

    pub fn counter(&self) -> &AppCounter {
        &self.counter
    }
}

/// Production wiring: SQLite store at `DATABASE_URL`, system clock.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = SqliteEventStore::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    store
        .create_schema()
        .await
        .context("failed to create database schema")?;

    seed_users(&store, &config.seed_users)
        .await
        .context("failed to register seed users")?;

    Ok(AppServices::new(
        Arc::new(store),
        Arc::new(SystemClock::new()),
        config.cooldown(),
    ))
}

/// Register `users` whose ids are not taken yet. Existing users are left as
/// they are.
pub async fn seed_users(store: &dyn EventStore, users: &[User]) -> Result<(), EventStoreError> {
    for user in users {
        if store.register_user(user).await? {
            info!(user_id = %user.id, name = %user.name, "registered seed user");
        }
    }
    Ok(())
}
