//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::resolve_settings;
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", trustguard_config::config_path().display());
        }

        // Effective values after file, environment and flag overrides.
        ConfigCommand::Show => {
            let settings = resolve_settings(global)?;
            settings.to_session_settings()?;

            let rendered = toml::to_string_pretty(&settings).map_err(|e| CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize settings: {e}"),
            })?;
            print!("{rendered}");
            println!("# state_dir = {:?}", settings.state_dir().display().to_string());
        }
    }
    Ok(())
}
