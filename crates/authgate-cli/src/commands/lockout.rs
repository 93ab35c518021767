//! Account lockout commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use authgate_core::config::AppConfig;
use authgate_core::error::AppError;
use authgate_entity::lockout::LockoutRecord;

use crate::output::{self, OutputFormat};

/// Arguments for lockout commands
#[derive(Debug, Args)]
pub struct LockoutArgs {
    /// Lockout subcommand
    #[command(subcommand)]
    pub command: LockoutCommand,
}

/// Lockout subcommands
#[derive(Debug, Subcommand)]
pub enum LockoutCommand {
    /// Show a principal's lockout status
    Status {
        /// Principal name
        username: String,
    },
    /// Lift a principal's lockout and reset the failure count
    Unlock {
        /// Principal name
        username: String,
    },
    /// List principals currently locked out
    List,
}

/// Lockout display row
#[derive(Debug, Serialize, Tabled)]
struct LockoutRow {
    /// Username
    username: String,
    /// Failed Attempts
    failed_count: i32,
    /// Locked Until
    lockout_until: String,
}

impl From<&LockoutRecord> for LockoutRow {
    fn from(r: &LockoutRecord) -> Self {
        Self {
            username: r.username.clone(),
            failed_count: r.failed_count,
            lockout_until: output::optional_timestamp(r.lockout_until),
        }
    }
}

/// Execute lockout commands
pub async fn execute(
    args: &LockoutArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    if !engine.lockout.settings().enabled {
        output::print_warning("Lockout is disabled in this configuration.");
    }

    match &args.command {
        LockoutCommand::Status { username } => {
            let status = engine.lockout.is_locked_out(username).await?;
            match format {
                OutputFormat::Json => output::print_item(&status, format),
                OutputFormat::Table => {
                    println!("Lockout status for '{}':", username);
                    output::print_kv("Locked out", &status.is_locked_out.to_string());
                    output::print_kv("Failed attempts", &status.failed_count.to_string());
                    output::print_kv(
                        "Locked until",
                        &output::optional_timestamp(status.lockout_until),
                    );
                }
            }
        }
        LockoutCommand::Unlock { username } => {
            if engine.lockout.unlock_user(username).await? {
                output::print_success(&format!("User '{}' unlocked", username));
            } else {
                output::print_warning(&format!("User '{}' had no lockout record", username));
            }
        }
        LockoutCommand::List => {
            let records = engine.lockout.locked_principals().await?;
            let rows: Vec<LockoutRow> = records.iter().map(LockoutRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
