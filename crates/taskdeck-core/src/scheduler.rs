//! Minute-granularity sweep over recurring templates.
//!
//! A sweep pass loads every Daily/Weekly template with a deadline, asks the
//! evaluator whether "now" lands exactly on the template's scheduled minute
//! (and weekday, for Weekly), and materializes the day's instance for the
//! ones that are due. One template's failure never aborts the pass for the
//! rest. Missed minutes are skipped permanently, never backfilled.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::models::Task;
use crate::recurrence::SweepDecision;
use crate::repository::{MaterializationRepository, SqliteRepository};

pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// What one sweep pass did.
#[derive(Debug, Default)]
pub struct SweepSummary {
    pub templates_seen: usize,
    pub instances_created: usize,
    pub failures: Vec<String>,
}

/// Runs a single sweep pass at `now`.
pub async fn run_sweep(
    repo: &SqliteRepository,
    now: DateTime<Utc>,
) -> Result<SweepSummary, CoreError> {
    let templates = repo.find_recurring_templates().await?;
    let mut summary = SweepSummary {
        templates_seen: templates.len(),
        ..Default::default()
    };

    for template in templates {
        match sweep_template(repo, &template, now).await {
            Ok(Some(instance)) => {
                summary.instances_created += 1;
                info!(
                    template_id = %template.id,
                    instance_id = %instance.id,
                    occurrence = ?instance.deadline,
                    "created dated instance"
                );
            }
            Ok(None) => {}
            Err(err) => {
                warn!(
                    template_id = %template.id,
                    error = %err,
                    "sweep failed for template, continuing with the rest"
                );
                summary.failures.push(format!("{}: {}", template.id, err));
            }
        }
    }

    Ok(summary)
}

async fn sweep_template(
    repo: &SqliteRepository,
    template: &Task,
    now: DateTime<Utc>,
) -> Result<Option<Task>, CoreError> {
    match repo.policy().sweep_decision(template, now) {
        SweepDecision::Due(occurrence) => {
            if repo
                .find_instance_for_day(template.id, occurrence)
                .await?
                .is_some()
            {
                return Ok(None);
            }
            repo.materialize_instance(template.id, occurrence).await
        }
        SweepDecision::Skip(reason) => {
            debug!(template_id = %template.id, ?reason, "template not due");
            Ok(None)
        }
    }
}

/// Owns the background sweep loop. Explicit `start`/`stop` lifecycle; the
/// clock is injected so tests can drive passes at pinned moments instead of
/// waiting for wall time.
pub struct SweepScheduler {
    repo: Arc<SqliteRepository>,
    clock: Arc<dyn Clock>,
    tick: Duration,
    handle: Option<JoinHandle<()>>,
}

impl SweepScheduler {
    pub fn new(repo: Arc<SqliteRepository>) -> Self {
        Self {
            repo,
            clock: Arc::new(SystemClock),
            tick: DEFAULT_TICK,
            handle: None,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the sweep loop. Calling `start` on a running scheduler is a
    /// no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let repo = Arc::clone(&self.repo);
        let clock = Arc::clone(&self.clock);
        let tick = self.tick;

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let now = clock.now_utc();
                match run_sweep(&repo, now).await {
                    Ok(summary) if summary.instances_created > 0 => {
                        info!(
                            created = summary.instances_created,
                            templates = summary.templates_seen,
                            "sweep pass complete"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "sweep pass failed"),
                }
            }
        }));
        info!(every = ?self.tick, "recurring task sweep started");
    }

    /// Stops the sweep loop and waits for the task to wind down.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            info!("recurring task sweep stopped");
        }
    }
}
