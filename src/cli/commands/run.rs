//! Scheduler commands: the long-running loop and one-shot ticks.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::{build_runtime, ConfigLoader};
use crate::services::TickSummary;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured tick interval, in seconds
    #[arg(long)]
    pub tick_interval: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
struct TickOutput {
    due: usize,
    succeeded: usize,
    failed: usize,
    skipped: usize,
}

impl From<TickSummary> for TickOutput {
    fn from(summary: TickSummary) -> Self {
        Self {
            due: summary.due,
            succeeded: summary.succeeded,
            failed: summary.failed,
            skipped: summary.skipped,
        }
    }
}

impl CommandOutput for TickOutput {
    fn to_human(&self) -> String {
        format!(
            "Tick complete: {} due, {} succeeded, {} failed, {} skipped",
            self.due, self.succeeded, self.failed, self.skipped
        )
    }
}

/// Run the scheduler loop until interrupted.
pub async fn execute_run(args: RunArgs, _json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let runtime = build_runtime(&config).await?;

    let tick_interval =
        Duration::from_secs(args.tick_interval.unwrap_or(config.scheduler.tick_interval_secs));

    info!(interval_secs = tick_interval.as_secs(), "Starting scheduler");
    let handle = runtime.scheduler.start(tick_interval);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping scheduler");
    runtime.scheduler.stop();
    handle.await?;

    Ok(())
}

/// Run a single tick and report the summary.
pub async fn execute_tick(json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let runtime = build_runtime(&config).await?;

    let summary = runtime.scheduler.run_tick().await;
    output(&TickOutput::from(summary), json);
    Ok(())
}
