//! Brink - command-line access to Brink Home ventilation systems.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;

mod commands;
mod config;

use commands::{login, params, set, systems};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Brink - read and control Brink Home ventilation systems
#[derive(Parser)]
#[command(name = "brink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Service origin (default: https://www.brink-home.com)
    #[arg(long, global = true, env = "BRINK_BASE_URL")]
    pub base_url: Option<String>,

    /// Account username
    #[arg(short, long, global = true, env = "BRINK_USERNAME")]
    pub username: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "BRINK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and verify the account credentials
    Login(login::LoginArgs),

    /// List ventilation systems on the account
    Systems(systems::SystemsArgs),

    /// Show the parameters of a system
    Params(params::ParamsArgs),

    /// Write a parameter value
    Set(set::SetArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + daily JSON file
    let filter = if cli.verbose {
        "brink=debug,brink_client=debug,brink_oauth=debug,info"
    } else {
        "brink=info,brink_client=info,brink_oauth=info,warn"
    };

    let file_appender = config::config_dir().and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("brink.log")
            .build(dir.join("logs"))
            .ok()
    });
    let (file_layer, _guard) = match file_appender {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "brink=trace,brink_client=trace,brink_oauth=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_layer)
        .init();

    let Cli {
        json,
        base_url,
        username,
        password,
        command,
        ..
    } = cli;

    // Loaded per command so `brink config` still works with a broken file
    let context = move || -> Result<commands::Context> {
        let config = config::load_config()?;
        Ok(commands::Context {
            json_output: json || config.output.json,
            base_url,
            username,
            password,
            config,
        })
    };

    match command {
        Commands::Login(args) => login::run(args, &context()?).await,
        Commands::Systems(args) => systems::run(args, &context()?).await,
        Commands::Params(args) => params::run(args, &context()?).await,
        Commands::Set(args) => set::run(args, &context()?).await,
        Commands::Config(args) => commands::config::run(args).await,
    }
}
