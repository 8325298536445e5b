//! Manual redirect-chain following after the credential POST.

use reqwest::header::LOCATION;

use crate::config::OAuthConfig;
use crate::scrape::extract_code;

/// Maximum number of GETs issued while looking for an authorization code.
pub const MAX_REDIRECTS: usize = 10;

/// Position in the redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectState {
    /// Still walking; `hops` GETs have been issued so far.
    Following { location: String, hops: usize },
    /// A location carried an authorization code.
    Found(String),
    /// The chain stopped without a code (200, unexpected status, empty
    /// location or transport error).
    DeadEnd(String),
    /// The hop bound was reached without a code.
    Exhausted,
}

impl RedirectState {
    pub fn start(location: impl Into<String>) -> Self {
        RedirectState::Following {
            location: location.into(),
            hops: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RedirectState::Following { .. })
    }

    /// The authorization code, if the chain ended on one.
    pub fn code(&self) -> Option<&str> {
        match self {
            RedirectState::Found(code) => Some(code.as_str()),
            _ => None,
        }
    }
}

/// Walks a bounded chain of 302s looking for `?code=` in a location.
///
/// The client passed in must have automatic redirects disabled.
#[derive(Debug)]
pub struct RedirectFollower<'a> {
    http: &'a reqwest::Client,
    config: &'a OAuthConfig,
    max_hops: usize,
}

impl<'a> RedirectFollower<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a OAuthConfig) -> Self {
        Self {
            http,
            config,
            max_hops: MAX_REDIRECTS,
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Follow the chain from `initial_location` to a terminal state.
    pub async fn follow(&self, initial_location: &str) -> RedirectState {
        let mut state = RedirectState::start(initial_location);
        while !state.is_terminal() {
            state = self.step(state).await;
        }
        state
    }

    /// Advance the chain by at most one request.
    pub async fn step(&self, state: RedirectState) -> RedirectState {
        let RedirectState::Following { location, hops } = state else {
            return state;
        };

        if location.is_empty() {
            return RedirectState::DeadEnd("redirect without location".to_string());
        }

        if let Some(code) = extract_code(&location) {
            tracing::debug!(hops, "Found authorization code in redirect");
            return RedirectState::Found(code);
        }

        if hops >= self.max_hops {
            tracing::debug!(hops, "Redirect limit reached without authorization code");
            return RedirectState::Exhausted;
        }

        let url = match self.config.resolve(&location) {
            Ok(url) => url,
            Err(e) => return RedirectState::DeadEnd(format!("invalid location: {}", e)),
        };

        let hops = hops + 1;
        tracing::debug!(hops, location = %truncate(url.as_str(), 100), "Following redirect");

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Error following redirect");
                return RedirectState::DeadEnd(format!("request failed: {}", e));
            }
        };

        let status = response.status();
        tracing::debug!(hops, status = status.as_u16(), "Redirect response");

        match status.as_u16() {
            302 => {
                let next = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                RedirectState::Following {
                    location: next,
                    hops,
                }
            }
            200 => RedirectState::DeadEnd("chain ended with 200".to_string()),
            other => RedirectState::DeadEnd(format!("unexpected status {}", other)),
        }
    }
}

/// Shorten a URL for log output without splitting a UTF-8 character.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn no_redirect_client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_code_in_initial_location_needs_no_request() {
        let server = MockServer::start().await;
        let config = OAuthConfig::with_base_url(&server.uri()).unwrap();
        let http = no_redirect_client();

        let state = RedirectFollower::new(&http, &config)
            .follow("https://host/app?code=XYZ&state=S")
            .await;

        assert_eq!(state, RedirectState::Found("XYZ".to_string()));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follows_relative_redirects_to_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/idsrv/redirect1"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/idsrv/redirect2"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/idsrv/redirect2"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "https://host/app?code=ABC"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = OAuthConfig::with_base_url(&server.uri()).unwrap();
        let http = no_redirect_client();
        let state = RedirectFollower::new(&http, &config)
            .follow("/idsrv/redirect1")
            .await;

        assert_eq!(state.code(), Some("ABC"));
    }

    #[tokio::test]
    async fn test_endless_redirects_stop_after_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .expect(MAX_REDIRECTS as u64)
            .mount(&server)
            .await;

        let config = OAuthConfig::with_base_url(&server.uri()).unwrap();
        let http = no_redirect_client();
        let state = RedirectFollower::new(&http, &config).follow("/loop").await;

        assert_eq!(state, RedirectState::Exhausted);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_custom_hop_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .expect(3)
            .mount(&server)
            .await;

        let config = OAuthConfig::with_base_url(&server.uri()).unwrap();
        let http = no_redirect_client();
        let state = RedirectFollower::new(&http, &config)
            .with_max_hops(3)
            .follow("/loop")
            .await;

        assert_eq!(state, RedirectState::Exhausted);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_200_is_dead_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>consent</html>"))
            .mount(&server)
            .await;

        let config = OAuthConfig::with_base_url(&server.uri()).unwrap();
        let http = no_redirect_client();
        let state = RedirectFollower::new(&http, &config)
            .follow("/consent")
            .await;

        assert!(matches!(state, RedirectState::DeadEnd(_)));
        assert_eq!(state.code(), None);
    }

    #[tokio::test]
    async fn test_unexpected_status_is_dead_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let config = OAuthConfig::with_base_url(&server.uri()).unwrap();
        let http = no_redirect_client();
        let state = RedirectFollower::new(&http, &config).follow("/gone").await;

        assert_eq!(
            state,
            RedirectState::DeadEnd("unexpected status 404".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_location_header_is_dead_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nowhere"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let config = OAuthConfig::with_base_url(&server.uri()).unwrap();
        let http = no_redirect_client();
        let state = RedirectFollower::new(&http, &config)
            .follow("/nowhere")
            .await;

        assert!(matches!(state, RedirectState::DeadEnd(_)));
    }

    #[tokio::test]
    async fn test_network_error_is_dead_end() {
        // Nothing listens on port 1.
        let config = OAuthConfig::with_base_url("http://127.0.0.1:1").unwrap();
        let http = no_redirect_client();
        let state = RedirectFollower::new(&http, &config)
            .follow("/idsrv/redirect1")
            .await;

        assert!(matches!(state, RedirectState::DeadEnd(_)));
    }

    #[tokio::test]
    async fn test_step_on_terminal_state_is_noop() {
        let config = OAuthConfig::default();
        let http = no_redirect_client();
        let follower = RedirectFollower::new(&http, &config);

        assert_eq!(
            follower.step(RedirectState::Exhausted).await,
            RedirectState::Exhausted
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("aé", 2), "a");
    }
}
