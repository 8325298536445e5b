//! Login command - verify credentials against the identity server.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::Context;

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {}

/// Login result for JSON output.
#[derive(Debug, Serialize)]
struct LoginOutput {
    authenticated: bool,
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Run the login command.
pub async fn run(_args: LoginArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let username = ctx.display_username();

    match client.login().await {
        Ok(()) => {
            if ctx.json_output {
                let output = LoginOutput {
                    authenticated: true,
                    username,
                    error: None,
                    message: None,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let green = Style::new().green();
                println!("{} Logged in as {}", green.apply_to("●"), username);
            }
            Ok(())
        }
        Err(e) => {
            let message = match &e {
                brink_client::Error::Auth(auth) => auth.login_message().map(str::to_string),
                _ => None,
            };

            if ctx.json_output {
                let output = LoginOutput {
                    authenticated: false,
                    username,
                    error: Some(e.to_string()),
                    message,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let red = Style::new().red();
                eprintln!("{} Login failed: {}", red.apply_to("●"), e);
            }
            Err(e.into())
        }
    }
}
