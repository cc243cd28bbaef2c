//! Config command - read and write user settings

use crate::{FanoutError, cli::ConfigCommands, config::FanoutConfig};

type Result<T> = std::result::Result<T, FanoutError>;

/// Split `KEY=VALUE`
///
/// # Errors
/// Returns `FanoutError::InvalidInput` if there is no `=` or the key is empty
pub fn parse_setting(setting: &str) -> Result<(&str, &str)> {
    match setting.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(FanoutError::InvalidInput(format!(
            "Expected KEY=VALUE, got '{setting}'"
        ))),
    }
}

/// Execute the config command
///
/// # Errors
/// Returns an error if the key is unknown, the value does not parse, or the
/// configuration cannot be saved
pub fn execute(config: &mut FanoutConfig, command: &ConfigCommands, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Get { key } => {
            let value = config.get(key)?;
            if quiet {
                println!("{value}");
            } else {
                println!("{key} = {value}");
            }
        }
        ConfigCommands::Set { setting } => {
            let (key, value) = parse_setting(setting)?;
            config.set(key, value)?;
            config.save()?;
            if !quiet {
                println!("Set {key} = {}", config.get(key)?);
            }
        }
    }
    Ok(())
}
