//! Maintenance worker configuration.

use serde::{Deserialize, Serialize};

/// Background maintenance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the maintenance scheduler runs in the daemon.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression for the sweep (seconds first).
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_cron: default_sweep_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_cron() -> String {
    "0 */15 * * * *".to_string()
}
