//! Information display handlers

use crate::AppConfig;
use crate::Result;

/// Print the effective configuration as TOML, secrets masked
pub fn handle_config_command(config: &AppConfig) -> Result<()> {
    println!("📋 finagents Configuration");
    println!("===========================\n");
    println!("{}", config.to_toml()?);
    Ok(())
}
