use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use vigil_core::models::{JobName, SweepOutcome};

use super::Schedule;

#[derive(Debug, Error)]
pub enum JobRegistryError {
    #[error("Job already registered: {0}")]
    DuplicateJob(JobName),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// A unit of scheduled work.
///
/// An `Err` means the run could not even enumerate its work; it is logged and
/// the job waits for its next firing. Per-item failures belong in the outcome.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, reference_time: DateTime<Utc>) -> anyhow::Result<SweepOutcome>;
}

#[derive(Clone)]
pub struct JobDefinition {
    pub name: JobName,
    pub schedule: Schedule,
    pub handler: Arc<dyn JobHandler>,
    pub run_on_start: bool,
}

/// Jobs known to the process, keyed by name.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: BTreeMap<JobName, JobDefinition>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job: JobDefinition) -> Result<(), JobRegistryError> {
        if self.jobs.contains_key(&job.name) {
            return Err(JobRegistryError::DuplicateJob(job.name));
        }

        tracing::info!(
            job = %job.name,
            schedule = %job.schedule,
            run_on_start = job.run_on_start,
            "Job registered"
        );
        self.jobs.insert(job.name, job);
        Ok(())
    }

    pub fn get(&self, name: JobName) -> Option<&JobDefinition> {
        self.jobs.get(&name)
    }

    pub fn names(&self) -> Vec<JobName> {
        self.jobs.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub(super) fn into_jobs(self) -> impl Iterator<Item = JobDefinition> {
        self.jobs.into_values()
    }
}
