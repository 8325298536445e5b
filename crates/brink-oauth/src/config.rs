//! Endpoint configuration for the Brink Home identity server.

use url::Url;

use crate::error::Result;

/// Production service origin.
pub const DEFAULT_BASE_URL: &str = "https://www.brink-home.com";

/// Path of the authorization endpoint below the service origin.
const AUTHORIZE_PATH: &str = "/idsrv/connect/authorize";

/// Path of the token endpoint below the service origin.
const TOKEN_PATH: &str = "/idsrv/connect/token";

/// OAuth configuration for the Brink Home portal.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Service origin. Relative redirects and form actions resolve against it.
    pub base_url: Url,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::brink_home()
    }
}

impl OAuthConfig {
    /// Configuration used by the Brink Home web app.
    pub fn brink_home() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            client_id: "spa".to_string(),
            redirect_uri: format!("{}/app", DEFAULT_BASE_URL),
            scope: "openid api role locale".to_string(),
        }
    }

    /// Same client settings, pointed at a different origin.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            ..Self::brink_home()
        })
    }

    pub fn authorize_url(&self) -> Result<Url> {
        Ok(self.base_url.join(AUTHORIZE_PATH)?)
    }

    pub fn token_url(&self) -> Result<Url> {
        Ok(self.base_url.join(TOKEN_PATH)?)
    }

    /// Resolve a location against the service origin.
    ///
    /// Absolute URLs are used as-is; relative ones (usually "/"-prefixed)
    /// are joined to the origin.
    pub fn resolve(&self, location: &str) -> Result<Url> {
        match Url::parse(location) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.base_url.join(location)?),
            Err(e) => Err(e.into()),
        }
    }
}
