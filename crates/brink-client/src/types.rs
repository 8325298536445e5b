//! Portal API types.
//!
//! Wire types mirror the JSON the portal returns (camelCase, most fields
//! optional). The public types flatten them into what callers need.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// A ventilation system the account has access to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct System {
    pub system_id: i64,
    /// Same as `system_id` on this API version.
    pub gateway_id: i64,
    pub name: String,
    pub serial_number: String,
    pub is_owner: bool,
    pub access_level: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SystemsPage {
    #[serde(default)]
    pub items: Vec<SystemItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SystemItem {
    pub system_share_id: i64,
    #[serde(default)]
    pub system_name: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub is_system_owner: bool,
    #[serde(default)]
    pub access_level: i64,
}

impl From<SystemItem> for System {
    fn from(item: SystemItem) -> Self {
        Self {
            system_id: item.system_share_id,
            gateway_id: item.system_share_id,
            name: item.system_name,
            serial_number: item.serial_number,
            is_owner: item.is_system_owner,
            access_level: item.access_level,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// One selectable option of a list-type parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub text: String,
}

/// A device parameter as exposed by the UI description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub id: i64,
    pub name: String,
    pub component_id: Option<i64>,
    pub value: Value,
    pub control_type: Option<Value>,
    pub read_write: Option<Value>,
    pub unit: String,
    pub value_state: Option<Value>,
    pub has_statistics: bool,
    pub list_items: Vec<ListItem>,
}

impl Parameter {
    /// Raw value rendered as text.
    pub fn raw_value(&self) -> String {
        value_text(&self.value)
    }

    /// Text of the matching list item for list parameters, otherwise the
    /// raw value.
    pub fn display_value(&self) -> String {
        let raw = self.raw_value();
        self.list_items
            .iter()
            .find(|item| value_text(&item.value) == raw)
            .map(|item| item.text.clone())
            .unwrap_or(raw)
    }
}

/// Parameters of one system keyed by name.
pub type Parameters = BTreeMap<String, Parameter>;

#[derive(Debug, Deserialize)]
pub(crate) struct UiDescription {
    #[serde(default)]
    pub root: UiNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UiNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub component_id: Option<i64>,
    #[serde(default)]
    pub navigation_items: Vec<UiNode>,
    #[serde(default)]
    pub parameter_groups: Vec<ParameterGroup>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParameterGroup {
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawParameter {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub control_type: Option<Value>,
    #[serde(default)]
    pub read_write: Option<Value>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub value_state: Option<Value>,
    #[serde(default)]
    pub has_statistics: bool,
    #[serde(default)]
    pub list_items: Vec<ListItem>,
}

impl UiDescription {
    /// Flatten components → pages → groups → parameters into a map.
    ///
    /// Later parameters with the same name replace earlier ones.
    pub(crate) fn into_parameters(self) -> Parameters {
        let mut parameters = Parameters::new();

        for component in self.root.navigation_items {
            let component_id = component.component_id;
            tracing::debug!(
                component = component.name.as_deref().unwrap_or_default(),
                component_id = ?component_id,
                "Processing component"
            );

            for page in component.navigation_items {
                for group in page.parameter_groups {
                    for raw in group.parameters {
                        let parameter = Parameter {
                            id: raw.id,
                            name: raw.name,
                            component_id,
                            value: raw.value,
                            control_type: raw.control_type,
                            read_write: raw.read_write,
                            unit: raw.unit.unwrap_or_default(),
                            value_state: raw.value_state,
                            has_statistics: raw.has_statistics,
                            list_items: raw.list_items,
                        };
                        parameters.insert(parameter.name.clone(), parameter);
                    }
                }
            }
        }

        parameters
    }
}

/// Body of a parameter write.
#[derive(Debug, Serialize)]
pub(crate) struct SetValueRequest {
    pub value: String,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
