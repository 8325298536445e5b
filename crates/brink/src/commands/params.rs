//! Params command - show the parameters of one system.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the params command.
#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// System ID (see `brink systems`)
    pub system_id: i64,

    /// Only show parameters whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Run the params command.
pub async fn run(args: ParamsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let mut parameters = client.parameters().list(args.system_id).await?;

    if let Some(filter) = &args.filter {
        let needle = filter.to_lowercase();
        parameters.retain(|name, _| name.to_lowercase().contains(&needle));
    }

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&parameters)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!(
        "{} {}",
        style("Parameters of system").bold(),
        style(args.system_id).bold()
    );
    println!("{}", dim.apply_to("─".repeat(60)));
    for parameter in parameters.values() {
        let unit = if parameter.unit.is_empty() {
            String::new()
        } else {
            format!(" {}", parameter.unit)
        };
        println!(
            "  {:>6}  {:<40} {}{}",
            dim.apply_to(parameter.id),
            parameter.name,
            parameter.display_value(),
            unit
        );
    }
    println!();

    Ok(())
}
