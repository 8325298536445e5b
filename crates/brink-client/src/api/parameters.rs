//! Parameters API.

use crate::client::BrinkClient;
use crate::error::Result;
use crate::types::{Parameters, SetValueRequest, UiDescription};

/// Parameters API client.
pub struct ParametersApi {
    client: BrinkClient,
}

impl ParametersApi {
    pub(crate) fn new(client: BrinkClient) -> Self {
        Self { client }
    }

    /// All parameters of a system, keyed by name.
    pub async fn list(&self, system_id: i64) -> Result<Parameters> {
        let description: UiDescription = self
            .client
            .get(&format!("systems/{}/uidescription", system_id))
            .await?;

        let parameters = description.into_parameters();
        tracing::debug!(system_id, count = parameters.len(), "Extracted parameters");
        Ok(parameters)
    }

    /// Write a parameter value.
    pub async fn set(&self, parameter_id: i64, value: impl ToString) -> Result<()> {
        let request = SetValueRequest {
            value: value.to_string(),
        };
        self.client
            .put(&format!("parameters/{}", parameter_id), &request)
            .await?;

        tracing::info!(parameter_id, value = %request.value, "Parameter updated");
        Ok(())
    }

    /// Set the ventilation level parameter.
    pub async fn set_ventilation_level(&self, parameter_id: i64, level: i64) -> Result<()> {
        self.set(parameter_id, level).await
    }

    /// Set the operating mode parameter.
    pub async fn set_mode(&self, parameter_id: i64, mode: i64) -> Result<()> {
        self.set(parameter_id, mode).await
    }
}
