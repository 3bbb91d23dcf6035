//! Background sweep registration

use anyhow::{Context, Result};
use std::sync::Arc;
use vigil_core::models::JobName;
use vigil_core::Config;
use vigil_infra::{JobDefinition, JobRegistry, JobScheduler, Schedule};
use vigil_services::push::PushSender;
use vigil_services::{create_push_sender, DistributionSweep, ExpirationSweep, NotificationSweep};
use vigil_storage::Storage;

use crate::state::Stores;

/// Register the three lifecycle sweeps on their UTC schedules.
pub fn build_job_registry(
    config: &Config,
    stores: &Stores,
    storage: Arc<dyn Storage>,
    push: Option<Arc<dyn PushSender>>,
) -> Result<JobRegistry> {
    let run_on_start = config.jobs_run_on_start;
    let mut registry = JobRegistry::new();

    registry.register(JobDefinition {
        name: JobName::VideoDistribution,
        schedule: Schedule::hourly_at(0)?,
        handler: Arc::new(DistributionSweep::new(
            stores.videos.clone(),
            config.retention_days(),
        )),
        run_on_start,
    })?;

    registry.register(JobDefinition {
        name: JobName::CheckInReminder,
        schedule: Schedule::daily_at(9, 0)?,
        handler: Arc::new(NotificationSweep::new(stores.videos.clone(), push)),
        run_on_start,
    })?;

    registry.register(JobDefinition {
        name: JobName::VideoExpiration,
        schedule: Schedule::daily_at(0, 0)?,
        handler: Arc::new(ExpirationSweep::new(stores.videos.clone(), storage)),
        run_on_start,
    })?;

    Ok(registry)
}

/// Start the scheduler unless jobs are disabled.
pub fn start_jobs(
    config: &Config,
    stores: &Stores,
    storage: Arc<dyn Storage>,
) -> Result<Option<JobScheduler>> {
    if !config.jobs_enabled {
        tracing::info!("Background jobs disabled");
        return Ok(None);
    }

    let push = create_push_sender(config).context("Failed to initialize push sender")?;
    let registry = build_job_registry(config, stores, storage, push)
        .context("Failed to register background jobs")?;

    Ok(Some(JobScheduler::start(registry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stores, test_config};
    use vigil_db::test_helpers::MockStore;
    use vigil_storage::LocalStorage;

    #[tokio::test]
    async fn test_sweeps_registered_on_their_schedules() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let store = MockStore::new();

        let registry = build_job_registry(&test_config(), &stores(&store), storage, None).unwrap();

        assert_eq!(registry.len(), 3);
        let schedule = |name| registry.get(name).unwrap().schedule.to_string();
        assert_eq!(schedule(JobName::VideoDistribution), "0 * * * *");
        assert_eq!(schedule(JobName::CheckInReminder), "0 9 * * *");
        assert_eq!(schedule(JobName::VideoExpiration), "0 0 * * *");
    }
}
