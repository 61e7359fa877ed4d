//! Command handlers: config loading -> engine -> JSON on stdout.

pub mod config;
pub mod filters;
pub mod run;

use std::path::PathBuf;

use ec2sd_config::Ec2SdConfig;
use ec2sd_core::DiscoveryConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// `--config`, or the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(ec2sd_config::config_path)
}

/// Load the config file plus `EC2SD_*` environment overrides.
pub fn load(global: &GlobalOpts) -> Result<Ec2SdConfig, CliError> {
    let path = config_path(global);
    ec2sd_config::load_config(Some(path.as_path())).map_err(|e| CliError::config(e, &path))
}

/// Load, validate, and translate into an engine configuration.
pub fn load_discovery_config(global: &GlobalOpts) -> Result<DiscoveryConfig, CliError> {
    let path = config_path(global);
    load(global)?
        .into_discovery_config()
        .map_err(|e| CliError::config(e, &path))
}
