//! Team resource.
//!
//! Teams carry per-severity notification lists. State holds them as
//! notification strings; the API wants notification objects under
//! `notificationLists`.

use serde_json::{json, Map, Value};

use super::validators::{check_notifications, notification_payload, notification_string};
use super::{copy_field, merge_state, require_str, ResourceHandler, TEAM_API_PATH};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

const SEVERITY_KEYS: &[(&str, &str)] = &[
    ("notifications_critical", "critical"),
    ("notifications_major", "major"),
    ("notifications_minor", "minor"),
    ("notifications_warning", "warning"),
    ("notifications_info", "info"),
];

/// `signalfx_team`: a group of members with default alert routing.
pub struct Team;

impl ResourceHandler for Team {
    fn type_name(&self) -> &'static str {
        "signalfx_team"
    }

    fn api_path(&self) -> &'static str {
        TEAM_API_PATH
    }

    fn schema(&self) -> Schema {
        let mut schema = Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "members",
                Attribute::optional_string_list().with_description("User IDs of team members"),
            );
        for (attr, _) in SEVERITY_KEYS {
            schema = schema.with_attribute(*attr, Attribute::optional_string_list());
        }
        schema
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        SEVERITY_KEYS
            .iter()
            .flat_map(|(attr, _)| check_notifications(config, attr))
            .collect()
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = Map::new();
        payload.insert("name".to_string(), json!(require_str(state, "name")?));
        copy_field(&mut payload, "description", state, "description");
        copy_field(&mut payload, "members", state, "members");

        let mut lists = Map::new();
        for (attr, api_key) in SEVERITY_KEYS {
            let Some(specs) = state.get(*attr).and_then(Value::as_array) else {
                continue;
            };
            let mut encoded = Vec::with_capacity(specs.len());
            for spec in specs {
                let spec = spec.as_str().ok_or_else(|| {
                    ProviderError::Validation(format!("{} entries must be strings", attr))
                })?;
                encoded.push(notification_payload(spec).map_err(ProviderError::Validation)?);
            }
            lists.insert((*api_key).to_string(), Value::Array(encoded));
        }
        if !lists.is_empty() {
            payload.insert("notificationLists".to_string(), Value::Object(lists));
        }

        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = Map::new();
        copy_field(&mut decoded, "id", response, "id");
        copy_field(&mut decoded, "name", response, "name");
        copy_field(&mut decoded, "description", response, "description");
        copy_field(&mut decoded, "members", response, "members");

        if let Some(lists) = response.get("notificationLists") {
            for (attr, api_key) in SEVERITY_KEYS {
                if let Some(entries) = lists.get(*api_key).and_then(Value::as_array) {
                    let specs: Vec<Value> = entries
                        .iter()
                        .filter_map(notification_string)
                        .map(Value::String)
                        .collect();
                    decoded.insert((*attr).to_string(), Value::Array(specs));
                }
            }
        }

        Ok(merge_state(prior, decoded))
    }
}
