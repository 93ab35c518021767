//! CLI command definitions and dispatch.

pub mod config;
pub mod lockout;
pub mod migrate;
pub mod policy;
pub mod session;
pub mod sweep;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use authgate_auth::AuthEngine;
use authgate_core::config::AppConfig;
use authgate_core::error::AppError;
use authgate_database::DatabasePool;

/// AuthGate: token revocation, device login policy, and lockout administration
#[derive(Debug, Parser)]
#[command(name = "authgate", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file (extension optional)
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay, read from `config/<env>.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Session listing and revocation
    Sessions(session::SessionArgs),
    /// Account lockout inspection and unlock
    Lockout(lockout::LockoutArgs),
    /// Device login policy preview
    Policy(policy::PolicyArgs),
    /// Run one maintenance sweep now
    Sweep,
    /// Configuration inspection
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(&self.config, &self.env)?;
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Sessions(args) => session::execute(args, &config, self.format).await,
            Commands::Lockout(args) => lockout::execute(args, &config, self.format).await,
            Commands::Policy(args) => policy::execute(args, &config, self.format).await,
            Commands::Sweep => sweep::execute(&config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(base: &str, env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load_from(base, env)
}

/// Helper: connect to the stores and wire the engine
pub async fn connect_engine(config: &AppConfig) -> Result<AuthEngine, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    AuthEngine::connect(config, &pool).await
}

/// Helper: ask for confirmation unless `force` is set
pub fn confirm(prompt: &str, force: bool) -> Result<bool, AppError> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))
}
