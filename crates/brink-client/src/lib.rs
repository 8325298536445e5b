//! Typed client for the Brink Home portal API.
//!
//! Authentication is delegated to [`brink_oauth::OAuthSession`]: the client
//! attaches the session's bearer header to every request and, when the
//! portal answers 401, refreshes the session and retries once.
//!
//! # API Coverage
//!
//! - **Systems**: list the ventilation systems shared with the account
//! - **Parameters**: read the flattened UI description, write values

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::{ParametersApi, SystemsApi};
pub use client::{BrinkClient, ClientBuilder};
pub use error::{Error, Result};
pub use types::{ListItem, Parameter, Parameters, System};

pub use brink_oauth::{OAuthError, SessionState};
