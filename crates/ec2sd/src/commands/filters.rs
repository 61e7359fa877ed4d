use crate::cli::GlobalOpts;
use crate::error::CliError;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_discovery_config(global)?;
    println!("{}", serde_json::to_string_pretty(&config.filters)?);
    Ok(())
}
