use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::{JobDefinition, JobRegistry};

/// Drives every registered job on its schedule until shut down.
pub struct JobScheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Spawn one worker per registered job.
    pub fn start(registry: JobRegistry) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        if registry.is_empty() {
            tracing::warn!("Job scheduler started with no registered jobs");
        }
        let names = registry.names();

        let handles: Vec<JoinHandle<()>> = registry
            .into_jobs()
            .map(|job| tokio::spawn(Self::job_loop(job, shutdown_rx.clone())))
            .collect();

        tracing::info!(job_count = handles.len(), jobs = ?names, "Job scheduler started");

        Self {
            shutdown_tx,
            handles,
        }
    }

    /// Signal every worker and wait for it to stop. A run already in progress
    /// finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Job worker terminated abnormally");
            }
        }

        tracing::info!("Job scheduler stopped");
    }

    async fn job_loop(job: JobDefinition, mut shutdown_rx: watch::Receiver<bool>) {
        if job.run_on_start {
            Self::run_once(&job).await;
        }

        loop {
            let now = Utc::now();
            let Some(next) = job.schedule.next_after(now) else {
                tracing::error!(job = %job.name, "Could not compute next run time, stopping job");
                break;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tracing::debug!(job = %job.name, next_run = %next, "Job sleeping until next run");

            tokio::select! {
                _ = sleep(wait) => {
                    Self::run_once(&job).await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!(job = %job.name, "Job worker shutting down");
    }

    async fn run_once(job: &JobDefinition) {
        let reference_time = Utc::now();
        tracing::info!(job = %job.name, reference_time = %reference_time, "Job started");

        match job.handler.run(reference_time).await {
            Ok(outcome) => {
                let failed = outcome.failed();
                let elapsed_ms = (Utc::now() - reference_time).num_milliseconds();
                if failed > 0 {
                    tracing::warn!(
                        job = %job.name,
                        failed = failed,
                        errors = ?outcome.errors(),
                        elapsed_ms = elapsed_ms,
                        "Job completed with failures"
                    );
                } else {
                    tracing::info!(
                        job = %job.name,
                        outcome = ?outcome,
                        elapsed_ms = elapsed_ms,
                        "Job completed"
                    );
                }
            }
            Err(e) => {
                tracing::error!(job = %job.name, error = %e, "Job failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobHandler, Schedule};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use vigil_core::models::{ExpirationResult, JobName, SweepOutcome};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobHandler for CountingJob {
        async fn run(&self, _reference_time: DateTime<Utc>) -> anyhow::Result<SweepOutcome> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(ExpirationResult::default().into())
        }
    }

    struct FailingJob;

    #[async_trait]
    impl JobHandler for FailingJob {
        async fn run(&self, _reference_time: DateTime<Utc>) -> anyhow::Result<SweepOutcome> {
            anyhow::bail!("database unavailable")
        }
    }

    #[tokio::test]
    async fn test_run_on_start_then_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = JobRegistry::new();
        registry
            .register(JobDefinition {
                name: JobName::VideoExpiration,
                schedule: Schedule::daily_at(0, 0).unwrap(),
                handler: Arc::new(CountingJob { runs: runs.clone() }),
                run_on_start: true,
            })
            .unwrap();
        registry
            .register(JobDefinition {
                name: JobName::VideoDistribution,
                schedule: Schedule::hourly_at(0).unwrap(),
                handler: Arc::new(FailingJob),
                run_on_start: true,
            })
            .unwrap();

        let scheduler = JobScheduler::start(registry);

        for _ in 0..100 {
            if runs.load(Ordering::SeqCst) > 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        tokio::time::timeout(Duration::from_secs(5), scheduler.shutdown())
            .await
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_jobs_without_run_on_start_wait_for_schedule() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = JobRegistry::new();
        registry
            .register(JobDefinition {
                name: JobName::CheckInReminder,
                schedule: Schedule::daily_at(9, 0).unwrap(),
                handler: Arc::new(CountingJob { runs: runs.clone() }),
                run_on_start: false,
            })
            .unwrap();

        let scheduler = JobScheduler::start(registry);
        sleep(Duration::from_millis(50)).await;
        scheduler.shutdown().await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_registry_starts_and_stops() {
        let scheduler = JobScheduler::start(JobRegistry::new());
        tokio::time::timeout(Duration::from_secs(1), scheduler.shutdown())
            .await
            .unwrap();
    }
}
