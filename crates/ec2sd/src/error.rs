//! CLI error types with miette diagnostics.
//!
//! Maps config, inventory, and discovery errors into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ec2sd_config::ConfigError;
use ec2sd_core::{DiscoveryError, InventoryError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const INVENTORY: i32 = 3;
    pub const DISCOVERY: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(
        code(ec2sd::invalid_config),
        help(
            "Fix the value in your config file or its EC2SD_{env} environment override.\n\
             Run: ec2sd config to see the effective configuration."
        )
    )]
    Validation {
        field: String,
        reason: String,
        env: String,
    },

    #[error("Could not load configuration")]
    #[diagnostic(
        code(ec2sd::config_load),
        help("Check the TOML syntax and value types in {path}.")
    )]
    ConfigLoad {
        path: String,
        #[source]
        source: ConfigError,
    },

    // ── Inventory ────────────────────────────────────────────────────
    #[error("Could not load instance pages")]
    #[diagnostic(
        code(ec2sd::inventory),
        help("Pages must be `aws ec2 describe-instances --output json` output.")
    )]
    Inventory(#[source] InventoryError),

    // ── Discovery ────────────────────────────────────────────────────
    #[error("Discovery refresh failed")]
    #[diagnostic(code(ec2sd::refresh_failed))]
    Refresh(#[source] DiscoveryError),

    // ── Output ───────────────────────────────────────────────────────
    #[error("Could not render output: {0}")]
    #[diagnostic(code(ec2sd::output))]
    Output(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::ConfigLoad { .. } => exit_code::USAGE,
            Self::Inventory(_) => exit_code::INVENTORY,
            Self::Refresh(_) => exit_code::DISCOVERY,
            Self::Output(_) => exit_code::GENERAL,
        }
    }

    /// Wrap a config error, attributing load failures to `path`.
    pub fn config(err: ConfigError, path: &std::path::Path) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation {
                env: field.to_uppercase(),
                field,
                reason,
            },
            other => Self::ConfigLoad {
                path: path.display().to_string(),
                source: other,
            },
        }
    }
}

impl From<InventoryError> for CliError {
    fn from(err: InventoryError) -> Self {
        Self::Inventory(err)
    }
}

impl From<DiscoveryError> for CliError {
    fn from(err: DiscoveryError) -> Self {
        Self::Refresh(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}
