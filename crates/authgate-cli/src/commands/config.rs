//! Configuration inspection commands.

use clap::{Args, Subcommand};

use authgate_core::config::AppConfig;
use authgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration and summarize the policy in force
    Validate,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            shown.database.url = "****".to_string();
            output::print_item(&shown, format);
        }
        ConfigCommand::Validate => {
            config.validate()?;
            let policy = &config.login_policy;

            output::print_success("Configuration is valid.");
            output::print_kv("Cache provider", &config.cache.provider);
            output::print_kv("On store failure", &config.revocation.on_store_failure.to_string());
            output::print_kv(
                "Multiple devices",
                &policy.allow_multiple_devices.to_string(),
            );
            output::print_kv(
                "Max devices",
                &match policy.max_devices {
                    0 => "unlimited".to_string(),
                    n => n.to_string(),
                },
            );
            output::print_kv("New device policy", &policy.new_device_policy.to_string());
            output::print_kv("Lockout enabled", &config.lockout.enabled.to_string());
            if config.cache.provider != "redis" {
                output::print_warning(
                    "In-memory cache: revocations and leases are not shared between instances.",
                );
            }
        }
    }

    Ok(())
}
