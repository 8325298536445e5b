//! Login and token lifecycle for one Brink Home account.
//!
//! The identity server has no machine login API, so [`OAuthSession::authenticate`]
//! drives the browser flow by hand: authorize, scrape the login form, post
//! the credentials, walk the redirects to the authorization code and
//! exchange it with the PKCE verifier.

use std::fmt;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, LOCATION};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::OAuthConfig;
use crate::error::{OAuthError, Result};
use crate::pkce::{PkceChallenge, generate_state};
use crate::redirect::{RedirectFollower, RedirectState, truncate};
use crate::scrape::{
    ANTIFORGERY_FIELD, RETURN_URL_FIELD, extract_antiforgery_token, extract_code,
    extract_error_message, extract_form_action, extract_return_url, query_param,
};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// The refresh grant was refused; a full login is about to follow.
    RefreshFailed,
}

/// Token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Informational. Anything that is not a non-negative number or numeric
    /// string reads as `None`.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<u64>,
}

fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(whole_seconds)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().and_then(whole_seconds),
        _ => None,
    };
    Ok(seconds)
}

fn whole_seconds(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then_some(value as u64)
}

/// An authenticated (or authenticating) session for one credential pair.
///
/// Tokens live in memory only. Calls must not overlap: `authenticate` and
/// `refresh` take `&mut self`, so sharing a session across tasks needs an
/// outer lock.
pub struct OAuthSession {
    http: reqwest::Client,
    config: OAuthConfig,
    username: String,
    password: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    state: SessionState,
    last_error: Option<OAuthError>,
}

impl fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSession")
            .field("base_url", &self.config.base_url.as_str())
            .field("username", &self.username)
            .field("state", &self.state)
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

impl OAuthSession {
    /// Session against the production service.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_config(OAuthConfig::default(), username, password)
    }

    pub fn with_config(
        config: OAuthConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        // Redirects are walked by hand and the login form needs its cookies.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .cookie_store(true)
            .user_agent(concat!("brink-oauth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            username: username.into(),
            password: password.into(),
            access_token: None,
            refresh_token: None,
            expires_in: None,
            state: SessionState::Unauthenticated,
            last_error: None,
        })
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Lifetime reported with the last token, in seconds. Informational only.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// Diagnostic from the most recent failed login or refresh.
    pub fn last_error(&self) -> Option<&OAuthError> {
        self.last_error.as_ref()
    }

    /// Headers for portal API calls: empty until authenticated, otherwise a
    /// single bearer `Authorization` header.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.access_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Access token is not a valid header value"),
            }
        }
        headers
    }

    /// Run the full login flow and store the resulting tokens.
    ///
    /// On failure the session is left unauthenticated with no tokens, the
    /// cause is logged and kept in [`last_error`](Self::last_error).
    pub async fn authenticate(&mut self) -> Result<()> {
        self.state = SessionState::Authenticating;

        match self.login().await {
            Ok(tokens) => {
                self.store_tokens(tokens);
                self.state = SessionState::Authenticated;
                self.last_error = None;
                tracing::info!(username = %self.username, "OAuth authentication successful");
                tracing::debug!(
                    expires_in = ?self.expires_in,
                    has_refresh_token = self.refresh_token.is_some(),
                    "Token details"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "OAuth authentication failed");
                self.access_token = None;
                self.refresh_token = None;
                self.expires_in = None;
                self.state = SessionState::Unauthenticated;
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Renew the access token, falling back to a full login.
    ///
    /// Without a refresh token, or when the refresh grant fails for any
    /// reason, this re-runs [`authenticate`](Self::authenticate). An error
    /// therefore means both paths are exhausted.
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(refresh_token) = self.refresh_token.clone() else {
            tracing::warn!("No refresh token available, re-authenticating");
            return self.authenticate().await;
        };

        tracing::debug!("Refreshing access token");

        match self.refresh_grant(&refresh_token).await {
            Ok(tokens) => {
                self.access_token = Some(tokens.access_token);
                self.expires_in = tokens.expires_in;
                // Servers may rotate the refresh token.
                if let Some(rotated) = tokens.refresh_token {
                    self.refresh_token = Some(rotated);
                }
                self.state = SessionState::Authenticated;
                self.last_error = None;
                tracing::info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                let e = match e {
                    OAuthError::RefreshFailed(_) => e,
                    other => OAuthError::RefreshFailed(other.to_string()),
                };
                tracing::warn!(error = %e, "Falling back to full re-authentication");
                self.state = SessionState::RefreshFailed;
                self.last_error = Some(e);
                self.authenticate().await
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Login flow
    // ─────────────────────────────────────────────────────────────────────────

    async fn login(&self) -> Result<TokenResponse> {
        let pkce = PkceChallenge::generate();
        let state = generate_state();
        let nonce = generate_state();

        let mut auth_url = self.config.authorize_url()?;
        auth_url
            .query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", &state)
            .append_pair("nonce", &nonce)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("response_mode", "query");

        tracing::debug!("Requesting authorization page");
        let response = self.http.get(auth_url).send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Authorization response");

        let html = match status.as_u16() {
            400 => {
                let body = response.text().await.unwrap_or_default();
                return Err(OAuthError::MalformedAuthorizationRequest(body));
            }
            302 => {
                let location = location_header(&response);
                tracing::debug!(location = %truncate(&location, 200), "Authorization redirect");

                if let Some(code) = extract_code(&location) {
                    tracing::debug!("Authorization code issued without login");
                    return self.exchange_code(&code, &pkce.verifier).await;
                }

                self.fetch_login_page(&location).await?
            }
            200 => response.text().await?,
            other => return Err(OAuthError::LoginPageUnavailable(other)),
        };

        let code = self.submit_credentials(&html).await?;
        self.exchange_code(&code, &pkce.verifier).await
    }

    async fn fetch_login_page(&self, location: &str) -> Result<String> {
        if location.is_empty() {
            return Err(OAuthError::LoginPageUnavailable(StatusCode::FOUND.as_u16()));
        }

        let url = self.config.resolve(location)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(OAuthError::LoginPageUnavailable(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Post the credentials through the scraped login form and follow the
    /// redirects to the authorization code.
    async fn submit_credentials(&self, html: &str) -> Result<String> {
        let form_action = extract_form_action(html).ok_or(OAuthError::LoginFormNotFound)?;
        tracing::debug!(form_action = %truncate(&form_action, 200), "Extracted login form");

        let antiforgery_token = extract_antiforgery_token(html);
        if antiforgery_token.is_empty() {
            tracing::debug!("Login form has no anti-forgery token");
        }

        let mut return_url = extract_return_url(html);
        if return_url.is_empty()
            && let Some(from_action) = query_param(&form_action, RETURN_URL_FIELD)
        {
            return_url = from_action;
        }
        tracing::debug!(return_url = %truncate(&return_url, 200), "Extracted return URL");

        let login_url = self.config.resolve(&form_action)?;
        let form = [
            ("Username", self.username.as_str()),
            ("Password", self.password.as_str()),
            (RETURN_URL_FIELD, return_url.as_str()),
            (ANTIFORGERY_FIELD, antiforgery_token.as_str()),
            ("button", "login"),
            ("RememberLogin", "false"),
        ];

        tracing::debug!("Submitting login credentials");
        let response = self.http.post(login_url).form(&form).send().await?;
        let status = response.status();

        if status != StatusCode::FOUND {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            if let Some(message) = &message {
                tracing::error!(message = %message, "Login error");
            }
            return Err(OAuthError::CredentialsRejected {
                status: status.as_u16(),
                message,
            });
        }

        let location = location_header(&response);
        match RedirectFollower::new(&self.http, &self.config)
            .follow(&location)
            .await
        {
            RedirectState::Found(code) => Ok(code),
            other => {
                tracing::debug!(outcome = ?other, "Redirect chain ended without code");
                Err(OAuthError::CodeNotObtained)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Token endpoint
    // ─────────────────────────────────────────────────────────────────────────

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        tracing::debug!("Exchanging authorization code for tokens");

        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url()?)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(OAuthError::TokenExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }

        parse_token_response(&body)
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http
            .post(self.config.token_url()?)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(OAuthError::RefreshFailed(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        parse_token_response(&response.text().await?)
    }

    fn store_tokens(&mut self, tokens: TokenResponse) {
        self.access_token = Some(tokens.access_token);
        self.refresh_token = tokens.refresh_token;
        self.expires_in = tokens.expires_in;
    }
}

fn location_header(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn parse_token_response(body: &str) -> Result<TokenResponse> {
    let tokens: TokenResponse =
        serde_json::from_str(body).map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;
    if tokens.access_token.is_empty() {
        return Err(OAuthError::InvalidResponse(
            "empty access_token".to_string(),
        ));
    }
    Ok(tokens)
}
