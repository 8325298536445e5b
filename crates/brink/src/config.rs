//! CLI configuration file and credential resolution.
//!
//! ```toml
//! [account]
//! username = "me@example.com"
//! # password = "..."   # prefer BRINK_PASSWORD or the interactive prompt
//!
//! [service]
//! # base_url = "https://www.brink-home.com"
//!
//! [output]
//! json = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "BRINK_CONFIG_DIR";

/// Application directory name under the XDG config dir.
const APP_NAME: &str = "brink";

/// Default config filename.
const CONFIG_FILE: &str = "config.toml";

/// Written by `brink config init`.
pub const TEMPLATE: &str = r#"# Brink Home CLI configuration

[account]
# username = "me@example.com"
# password is read from BRINK_PASSWORD or prompted for when unset
# password = ""

[service]
# base_url = "https://www.brink-home.com"

[output]
json = false
"#;

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading configuration or credentials.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a config file.
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Missing required setting.
    #[error("missing {field}: {hint}")]
    MissingField {
        field: &'static str,
        hint: &'static str,
    },

    /// No config directory could be determined.
    #[error("could not determine config directory (set BRINK_CONFIG_DIR)")]
    NoConfigDir,
}

/// Root configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrinkConfig {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: bool,
}

impl BrinkConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// Config directory: `$BRINK_CONFIG_DIR`, else `<xdg config>/brink`.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Path of the config file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE))
}

/// Load the config file, or defaults when none exists.
pub fn load_config() -> Result<BrinkConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(BrinkConfig::default()),
    }
}

/// Load a config file, or defaults when it does not exist.
pub fn load_config_from(path: &Path) -> Result<BrinkConfig> {
    if !path.exists() {
        return Ok(BrinkConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;

    BrinkConfig::from_toml(&content)
}

/// Write [`TEMPLATE`] to `path` unless a file is already there.
///
/// Returns `false` when the file existed.
pub fn write_template(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    let write_err = |source: std::io::Error| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, TEMPLATE).map_err(write_err)?;
    Ok(true)
}

/// Account credentials for one run.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Resolve credentials: command line / environment first, then the
    /// config file, then `prompt` for the password.
    pub fn resolve<P>(
        username: Option<String>,
        password: Option<String>,
        config: &BrinkConfig,
        prompt: P,
    ) -> Result<Self>
    where
        P: FnOnce(&str) -> std::io::Result<String>,
    {
        let username = username
            .or_else(|| config.account.username.clone())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingField {
                field: "username",
                hint: "pass --username, set BRINK_USERNAME or add it to [account]",
            })?;

        let password = match password.or_else(|| config.account.password.clone()) {
            Some(password) if !password.is_empty() => password,
            _ => prompt(&username)
                .ok()
                .filter(|p| !p.is_empty())
                .ok_or(ConfigError::MissingField {
                    field: "password",
                    hint: "pass --password, set BRINK_PASSWORD or enter it when prompted",
                })?,
        };

        Ok(Self { username, password })
    }
}
