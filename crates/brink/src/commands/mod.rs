//! CLI command handlers.

pub mod config;
pub mod login;
pub mod params;
pub mod set;
pub mod systems;

use anyhow::Result;
use brink_client::BrinkClient;

use crate::config::{BrinkConfig, Credentials};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded config file (defaults when absent).
    pub config: BrinkConfig,
    /// Service origin override.
    pub base_url: Option<String>,
    /// Username from the command line or environment.
    pub username: Option<String>,
    /// Password from the command line or environment.
    pub password: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
}

impl Context {
    /// Resolve credentials and build a portal client.
    ///
    /// Prompts for the password on the terminal when it is not configured.
    pub fn client(&self) -> Result<BrinkClient> {
        let credentials = Credentials::resolve(
            self.username.clone(),
            self.password.clone(),
            &self.config,
            |username| rpassword::prompt_password(format!("Password for {}: ", username)),
        )?;

        let mut builder = BrinkClient::builder()
            .username(credentials.username)
            .password(credentials.password);

        if let Some(url) = self
            .base_url
            .as_ref()
            .or(self.config.service.base_url.as_ref())
        {
            builder = builder.base_url(url.clone());
        }

        Ok(builder.build()?)
    }

    /// Username that will be used, for display.
    pub fn display_username(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.config.account.username.clone())
            .unwrap_or_default()
    }
}
