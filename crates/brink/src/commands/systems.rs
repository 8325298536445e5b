//! Systems command - list ventilation systems on the account.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the systems command.
#[derive(Args, Debug)]
pub struct SystemsArgs {}

/// Run the systems command.
pub async fn run(_args: SystemsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let systems = client.systems().list().await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&systems)?);
        return Ok(());
    }

    if systems.is_empty() {
        println!("No systems found.");
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Systems").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    for system in &systems {
        let owner = if system.is_owner { " (owner)" } else { "" };
        println!("  {:>8}  {}{}", system.system_id, system.name, owner);
        if !system.serial_number.is_empty() {
            println!(
                "  {:>8}  {} {}",
                "",
                dim.apply_to("serial:"),
                system.serial_number
            );
        }
    }
    println!();

    Ok(())
}
