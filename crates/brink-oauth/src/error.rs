//! Error types for the login flow.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while authenticating or refreshing a session.
///
/// None of these are fatal to the process. [`crate::OAuthSession::refresh`]
/// only returns an error once both the refresh grant and a full
/// re-authentication have failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    /// The authorization endpoint answered 400.
    #[error("Authorization request rejected: {0}")]
    MalformedAuthorizationRequest(String),

    /// The authorization endpoint, or the redirect it issued, did not yield a login page.
    #[error("Login page unavailable (HTTP {0})")]
    LoginPageUnavailable(u16),

    /// No `<form action=...>` could be located on the login page.
    #[error("Could not find login form")]
    LoginFormNotFound,

    /// The credential POST was not answered with a redirect.
    #[error("Login rejected (HTTP {status}){}", message_suffix(.message))]
    CredentialsRejected {
        status: u16,
        message: Option<String>,
    },

    /// The redirect chain after login ended without an authorization code.
    #[error("Could not obtain authorization code")]
    CodeNotObtained,

    /// The token endpoint refused the authorization code.
    #[error("Token exchange failed (HTTP {status}): {body}")]
    TokenExchangeFailed { status: u16, body: String },

    /// The refresh grant failed. Always recovered by re-authenticating.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The token endpoint answered 200 with a body we could not use.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Transport-level failure at one of the call sites.
    #[error("Network error: {0}")]
    Network(String),

    /// Unusable endpoint configuration.
    #[error("Config error: {0}")]
    Config(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl OAuthError {
    /// Message scraped from the login page, if the server supplied one.
    pub fn login_message(&self) -> Option<&str> {
        match self {
            OAuthError::CredentialsRejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}

impl From<url::ParseError> for OAuthError {
    fn from(e: url::ParseError) -> Self {
        OAuthError::Config(e.to_string())
    }
}
