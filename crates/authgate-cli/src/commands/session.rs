//! Session listing and revocation commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use authgate_core::config::AppConfig;
use authgate_core::error::AppError;
use authgate_entity::session::Session;

use crate::output::{self, OutputFormat};

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List a principal's active sessions
    List {
        /// Principal name
        subject: String,
        /// Credential id to flag as the current session
        #[arg(long)]
        current: Option<Uuid>,
    },
    /// Revoke a single credential
    Revoke {
        /// Credential id
        id: Uuid,
    },
    /// Revoke every credential a principal holds on one device
    RevokeDevice {
        /// Principal name
        subject: String,
        /// Device id
        device_id: String,
    },
    /// Revoke everything a principal holds, including unrecorded credentials
    RevokeAll {
        /// Principal name
        subject: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Session display row
#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    /// Session ID
    id: String,
    /// Device
    device: String,
    /// Origin
    origin: String,
    /// Login
    login_at: String,
    /// Last Active
    last_active: String,
    /// Expires
    expires: String,
    /// Current
    current: String,
}

impl From<&Session> for SessionRow {
    fn from(s: &Session) -> Self {
        let device = match (&s.device_name, &s.device_id) {
            (Some(name), Some(id)) => format!("{} ({})", name, id),
            (None, Some(id)) => id.clone(),
            (Some(name), None) => name.clone(),
            (None, None) => "-".to_string(),
        };
        Self {
            id: s.session_id.to_string(),
            device,
            origin: s.origin_address.clone().unwrap_or_else(|| "-".to_string()),
            login_at: output::timestamp(s.login_at),
            last_active: output::timestamp(s.last_active_at),
            expires: output::timestamp(s.expires_at),
            current: if s.is_current { "✓" } else { "" }.to_string(),
        }
    }
}

/// Execute session commands
pub async fn execute(
    args: &SessionArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;

    match &args.command {
        SessionCommand::List { subject, current } => {
            let sessions = engine.enforcer.get_user_sessions(subject, *current).await?;
            match format {
                OutputFormat::Json => output::print_item(&sessions, format),
                OutputFormat::Table => {
                    let rows: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        SessionCommand::Revoke { id } => {
            let outcome = engine.enforcer.revoke_token(*id).await?;
            if outcome.affected == 0 {
                output::print_warning(&format!("Credential {} was not valid; nothing revoked", id));
            } else {
                output::print_success(&format!("Credential {} revoked", id));
            }
        }
        SessionCommand::RevokeDevice { subject, device_id } => {
            let outcome = engine
                .enforcer
                .revoke_device_tokens(subject, device_id)
                .await?;
            output::print_success(&format!(
                "Revoked {} credential(s) for '{}' on device '{}'",
                outcome.affected, subject, device_id
            ));
        }
        SessionCommand::RevokeAll { subject, force } => {
            let prompt = format!("Revoke ALL credentials held by '{}'?", subject);
            if !super::confirm(&prompt, *force)? {
                println!("Cancelled.");
                return Ok(());
            }

            let outcome = engine.enforcer.revoke_all_user_tokens(subject).await?;
            output::print_success(&format!(
                "Revoked {} recorded credential(s) for '{}'; earlier unrecorded ones are blacklisted",
                outcome.affected, subject
            ));
        }
    }

    Ok(())
}
