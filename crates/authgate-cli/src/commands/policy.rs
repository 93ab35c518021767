//! Device login policy preview.

use clap::{Args, Subcommand};

use authgate_core::config::AppConfig;
use authgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for policy commands
#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Policy subcommand
    #[command(subcommand)]
    pub command: PolicyCommand,
}

/// Policy subcommands
#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// Would a login from this device be admitted right now?
    Check {
        /// Principal name
        subject: String,
        /// Device id of the prospective login
        #[arg(short, long)]
        device: Option<String>,
    },
}

/// Execute policy commands
pub async fn execute(
    args: &PolicyArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;

    match &args.command {
        PolicyCommand::Check { subject, device } => {
            let check = engine
                .enforcer
                .check_login_policy(subject, device.as_deref())
                .await?;
            match format {
                OutputFormat::Json => output::print_item(&check, format),
                OutputFormat::Table if check.allowed => {
                    output::print_success(&format!("A login by '{}' would be admitted", subject));
                    if let Some(message) = &check.message {
                        output::print_kv("Note", message);
                    }
                }
                OutputFormat::Table => {
                    output::print_warning(&format!("A login by '{}' would be refused", subject));
                    output::print_kv("Reason", check.message.as_deref().unwrap_or("-"));
                }
            }
        }
    }

    Ok(())
}
