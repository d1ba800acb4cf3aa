//! Runtime wiring: turn a validated [`Config`] into live collections,
//! a populated agent registry, and the services built on top of them.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::adapters::agents::{MockSourceAgent, MockTargetAgent};
use crate::adapters::memory::MemoryCollection;
use crate::adapters::sqlite::{all_embedded_migrations, create_pool, Migrator, SqliteCollection};
use crate::domain::models::{Config, Rule, User};
use crate::domain::ports::Collection;
use crate::services::{AgentRegistry, RuleScheduler, RuleService};

/// Fully wired application state.
pub struct Runtime {
    pub rules: Arc<dyn Collection<Rule>>,
    pub users: Arc<dyn Collection<User>>,
    pub registry: Arc<AgentRegistry>,
    pub rule_service: Arc<RuleService>,
    pub scheduler: Arc<RuleScheduler>,
}

/// Build the runtime from config: select the store backend, run
/// migrations where applicable, and register the built-in agents.
pub async fn build_runtime(config: &Config) -> Result<Runtime> {
    let (rules, users) = build_collections(config).await?;

    let mut registry = AgentRegistry::new();
    registry.register_source(Arc::new(MockSourceAgent::weather()));
    registry.register_source(Arc::new(MockSourceAgent::pollen()));
    registry.register_target(Arc::new(MockTargetAgent::ads()));
    let registry = Arc::new(registry);

    let rule_service = Arc::new(RuleService::new(
        Arc::clone(&rules),
        Arc::clone(&users),
        Arc::clone(&registry),
    ));

    let scheduler = Arc::new(
        RuleScheduler::new(
            Arc::clone(&rules),
            Arc::clone(&users),
            Arc::clone(&registry),
        )
        .with_call_timeout(std::time::Duration::from_secs(
            config.scheduler.call_timeout_secs,
        ))
        .with_group_fetches(config.scheduler.group_fetches),
    );

    Ok(Runtime {
        rules,
        users,
        registry,
        rule_service,
        scheduler,
    })
}

async fn build_collections(
    config: &Config,
) -> Result<(Arc<dyn Collection<Rule>>, Arc<dyn Collection<User>>)> {
    match config.store.as_str() {
        "memory" => {
            info!("Using in-memory store");
            Ok((
                Arc::new(MemoryCollection::<Rule>::new()),
                Arc::new(MemoryCollection::<User>::new()),
            ))
        }
        "sqlite" => {
            info!(path = %config.database.path, "Using SQLite store");
            let pool = create_pool(&config.database.path, config.database.max_connections)
                .await
                .context("Failed to open SQLite database")?;

            let migrator = Migrator::new(pool.clone());
            migrator
                .run_embedded_migrations(all_embedded_migrations())
                .await
                .context("Failed to run database migrations")?;

            Ok((
                Arc::new(SqliteCollection::<Rule>::new(pool.clone())),
                Arc::new(SqliteCollection::<User>::new(pool)),
            ))
        }
        other => bail!("Unsupported store backend: {other}"),
    }
}
