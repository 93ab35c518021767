//! Cron scheduler for the periodic maintenance sweep.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use authgate_core::config::WorkerConfig;
use authgate_core::error::AppError;

use crate::jobs::maintenance::MaintenanceJob;

/// Cron-based scheduler that runs [`MaintenanceJob`] on a fixed schedule
pub struct MaintenanceScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// The sweep to run
    job: Arc<MaintenanceJob>,
    /// Schedule settings
    config: WorkerConfig,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler")
            .field("sweep_cron", &self.config.sweep_cron)
            .finish()
    }
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler
    pub async fn new(job: Arc<MaintenanceJob>, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            job,
            config,
        })
    }

    /// Register the sweep at the configured cron expression
    pub async fn register(&self) -> Result<(), AppError> {
        let job = Arc::clone(&self.job);
        let cron = CronJob::new_async(self.config.sweep_cron.as_str(), move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                tracing::debug!("Running scheduled maintenance sweep");
                let report = job.run().await;
                if !report.is_clean() {
                    tracing::warn!(
                        "Maintenance sweep finished with failed steps: {:?}",
                        report.failed_steps
                    );
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid sweep schedule '{}': {}",
                self.config.sweep_cron, e
            ))
        })?;

        self.scheduler
            .add(cron)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {}", e)))?;

        tracing::info!("Registered: maintenance_sweep ({})", self.config.sweep_cron);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler shut down");
        Ok(())
    }
}
