//! Set command - write a parameter value.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::Context;

/// Arguments for the set command.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Parameter ID (see `brink params`)
    pub parameter_id: i64,

    /// New value, as shown in the raw parameter value
    pub value: String,
}

/// Run the set command.
pub async fn run(args: SetArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    client
        .parameters()
        .set(args.parameter_id, &args.value)
        .await?;

    if ctx.json_output {
        let output = json!({
            "parameter_id": args.parameter_id,
            "value": args.value,
            "updated": true,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Parameter {} set to {}", args.parameter_id, args.value);
    }

    Ok(())
}
