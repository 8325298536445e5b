//! Automated OpenID Connect login for the Brink Home portal.
//!
//! The portal only offers a browser login, so this crate emulates it:
//! authorization request with PKCE, scraping of the HTML login form,
//! credential submission, manual redirect following and code exchange.
//! On top of that it keeps the access token alive through refresh grants,
//! falling back to a fresh login whenever a refresh is refused.
//!
//! # Components
//!
//! - [`pkce`]: verifier/challenge and `state`/`nonce` generation
//! - [`scrape`]: independent extractors for the login page and redirect URLs
//! - [`redirect`]: bounded redirect-chain walker
//! - [`session`]: the login state machine and token lifecycle
//!
//! # Example
//!
//! ```no_run
//! use brink_oauth::OAuthSession;
//!
//! # async fn example() -> brink_oauth::Result<()> {
//! let mut session = OAuthSession::new("me@example.com", "secret")?;
//! session.authenticate().await?;
//!
//! let headers = session.auth_headers();
//! // ... call the portal API, and on 401:
//! session.refresh().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pkce;
pub mod redirect;
pub mod scrape;
pub mod session;

pub use config::OAuthConfig;
pub use error::{OAuthError, Result};
pub use pkce::PkceChallenge;
pub use redirect::{MAX_REDIRECTS, RedirectFollower, RedirectState};
pub use session::{OAuthSession, SessionState, TokenResponse};
