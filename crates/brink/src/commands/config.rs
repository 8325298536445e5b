//! Config command - manage the configuration file.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{ConfigError, config_path, write_template};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a template config file (never overwrites)
    Init,

    /// Print the config file location
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs) -> Result<()> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;

    match args.command {
        ConfigCommand::Init => {
            if write_template(&path)? {
                println!("Wrote {}", path.display());
            } else {
                println!("{} already exists, leaving it unchanged", path.display());
            }
        }
        ConfigCommand::Path => println!("{}", path.display()),
    }

    Ok(())
}
