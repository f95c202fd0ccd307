//! Config command implementation.

use crate::cli::ConfigArgs;
use crate::config::preset_config;
use crate::error::Result;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs) -> Result<()> {
    print!("{}", render_preset(&args)?);
    Ok(())
}

fn render_preset(args: &ConfigArgs) -> Result<String> {
    Ok(preset_config(args.preset).to_toml()?)
}
