//! Systems API.

use crate::client::BrinkClient;
use crate::error::Result;
use crate::types::{System, SystemsPage};

/// Page size requested when listing systems.
const PAGE_SIZE: u32 = 10;

/// Systems API client.
pub struct SystemsApi {
    client: BrinkClient,
}

impl SystemsApi {
    pub(crate) fn new(client: BrinkClient) -> Self {
        Self { client }
    }

    /// List the systems shared with the account.
    pub async fn list(&self) -> Result<Vec<System>> {
        let page: SystemsPage = self
            .client
            .get_with_query("systems", &[("pageSize", PAGE_SIZE)])
            .await?;

        let systems: Vec<System> = page.items.into_iter().map(System::from).collect();
        tracing::debug!(count = systems.len(), "Found systems");
        Ok(systems)
    }
}
