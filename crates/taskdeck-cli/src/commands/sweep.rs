use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use taskdeck_core::repository::SqliteRepository;
use taskdeck_core::scheduler::{run_sweep, SweepScheduler};

use crate::cli::SweepCommand;
use crate::config::Config;

pub async fn sweep(
    repo: Arc<SqliteRepository>,
    config: &Config,
    command: SweepCommand,
) -> Result<()> {
    if command.once {
        let summary = run_sweep(&repo, Utc::now()).await?;
        println!(
            "{} Swept {} templates, created {} instances",
            "✓".green().bold(),
            summary.templates_seen,
            summary.instances_created
        );
        for failure in &summary.failures {
            eprintln!("  failed: {failure}");
        }
        return Ok(());
    }

    let mut scheduler = SweepScheduler::new(repo)
        .with_tick(Duration::from_secs(config.sweep.tick_seconds.max(1)));
    scheduler.start();
    println!(
        "Sweeping recurring templates every {}s; press Ctrl-C to stop.",
        config.sweep.tick_seconds.max(1)
    );

    tokio::signal::ctrl_c().await?;
    scheduler.stop().await;
    Ok(())
}
