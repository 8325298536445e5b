//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use brink_oauth::{OAuthConfig, OAuthSession};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use tokio::sync::Mutex;
use url::Url;

use crate::api::{ParametersApi, SystemsApi};
use crate::error::{Error, Result};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Portal API root below the service origin.
const API_PATH: &str = "portal/api/v1.1/";

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Brink Home portal client.
///
/// Owns the OAuth session. Requests log in lazily, and a 401 triggers one
/// session refresh followed by one retry.
///
/// # Example
///
/// ```no_run
/// use brink_client::BrinkClient;
///
/// # async fn example() -> brink_client::Result<()> {
/// let client = BrinkClient::builder()
///     .username("me@example.com")
///     .password("secret")
///     .build()?;
///
/// for system in client.systems().list().await? {
///     let parameters = client.parameters().list(system.system_id).await?;
///     println!("{}: {} parameters", system.name, parameters.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrinkClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client for portal API calls.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests.
    pub(crate) api_url: Url,
    /// Request timeout.
    pub(crate) timeout: Duration,
    /// Serializes use of the session.
    pub(crate) session: Mutex<OAuthSession>,
}

impl std::fmt::Debug for BrinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrinkClient")
            .field("api_url", &self.inner.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BrinkClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Wrap an existing session, using its origin for API calls.
    pub fn with_session(session: OAuthSession) -> Result<Self> {
        let api_url = session.config().base_url.join(API_PATH)?;
        let http = build_http(None)?;
        Ok(Self::from_parts(http, api_url, DEFAULT_TIMEOUT, session))
    }

    fn from_parts(
        http: reqwest::Client,
        api_url: Url,
        timeout: Duration,
        session: OAuthSession,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http,
                api_url,
                timeout,
                session: Mutex::new(session),
            }),
        }
    }

    /// Get the API base URL.
    pub fn api_url(&self) -> &Url {
        &self.inner.api_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the systems API.
    pub fn systems(&self) -> SystemsApi {
        SystemsApi::new(self.clone())
    }

    /// Access the parameters API.
    pub fn parameters(&self) -> ParametersApi {
        ParametersApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a full login now.
    pub async fn login(&self) -> Result<()> {
        self.inner.session.lock().await.authenticate().await?;
        Ok(())
    }

    /// Refresh the access token, logging in again if needed.
    pub async fn refresh_token(&self) -> Result<()> {
        self.inner.session.lock().await.refresh().await?;
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.lock().await.is_authenticated()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.api_url.join(path).map_err(Error::from)
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let response = self
            .send(|http| http.get(url.clone()).query(query))
            .await?;
        self.handle_response(response).await
    }

    /// Make a GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let response = self.send(|http| http.get(url.clone())).await?;
        self.handle_response(response).await
    }

    /// Make a PUT request, ignoring the response body.
    pub(crate) async fn put<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let response = self.send(|http| http.put(url.clone()).json(body)).await?;

        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        Ok(())
    }

    /// Send an authorized request.
    ///
    /// Logs in first when the session holds no token. A 401 refreshes the
    /// session and the request is rebuilt and sent once more.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let headers = {
            let mut session = self.inner.session.lock().await;
            if !session.is_authenticated() {
                tracing::debug!("No access token, logging in");
                session.authenticate().await?;
            }
            session.auth_headers()
        };

        let response = self.dispatch(&build, headers).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("Request unauthorized, refreshing session");
        let headers = {
            let mut session = self.inner.session.lock().await;
            session.refresh().await?;
            session.auth_headers()
        };

        self.dispatch(&build, headers).await
    }

    async fn dispatch<F>(&self, build: &F, headers: HeaderMap) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let response = build(&self.inner.http)
            .headers(headers)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        tracing::debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            "Portal response"
        );
        Ok(response)
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let path = response.url().path().to_string();
        let mut message = response.text().await.unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }

        tracing::error!(status, path = %path, "Portal request failed");

        if status == 404 {
            Error::NotFound(path)
        } else {
            if message.is_empty() {
                message = format!("HTTP {}", status);
            }
            Error::Api { status, message }
        }
    }
}

/// Builder for creating a BrinkClient.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Override the service origin (defaults to the production portal).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the account username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the account password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<BrinkClient> {
        let username = self
            .username
            .ok_or_else(|| Error::Config("username is required".to_string()))?;
        let password = self
            .password
            .ok_or_else(|| Error::Config("password is required".to_string()))?;

        let config = match &self.base_url {
            Some(url) => OAuthConfig::with_base_url(url)
                .map_err(|e| Error::Config(format!("invalid base_url: {}", e)))?,
            None => OAuthConfig::default(),
        };
        let api_url = config.base_url.join(API_PATH)?;
        let session = OAuthSession::with_config(config, username, password)?;
        let http = build_http(self.user_agent)?;

        Ok(BrinkClient::from_parts(http, api_url, self.timeout, session))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn build_http(user_agent: Option<String>) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );

    let user_agent =
        user_agent.unwrap_or_else(|| format!("brink-client/{}", env!("CARGO_PKG_VERSION")));

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(user_agent)
        .build()?)
}
