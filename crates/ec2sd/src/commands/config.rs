use crate::cli::GlobalOpts;
use crate::error::CliError;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let rendered = super::load(global)?
        .to_redacted_toml()
        .map_err(|e| CliError::config(e, &super::config_path(global)))?;
    print!("{rendered}");
    Ok(())
}
