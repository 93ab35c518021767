//! One-shot maintenance sweep.

use authgate_core::config::AppConfig;
use authgate_core::error::AppError;
use authgate_worker::MaintenanceJob;

use crate::output::{self, OutputFormat};

/// Execute the sweep command
pub async fn execute(config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let job = MaintenanceJob::new(
        engine.ledger,
        engine.lockout,
        engine.revocation,
        engine.clock,
    );

    let report = job.run().await;
    match format {
        OutputFormat::Json => output::print_item(&report, format),
        OutputFormat::Table => {
            println!("Maintenance sweep:");
            output::print_kv("Expired credentials", &report.expired_credentials.to_string());
            output::print_kv("Elapsed lockouts", &report.elapsed_lockouts.to_string());
            output::print_kv("Revocation cleanup", &report.revocation_cleaned.to_string());
        }
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(AppError::internal(format!(
            "Sweep steps failed: {}",
            report.failed_steps.join(", ")
        )))
    }
}
