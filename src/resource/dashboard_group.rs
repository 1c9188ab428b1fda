//! Dashboard group resource.
//!
//! Request body mirrors the dashboard groups API: name, description,
//! teams. The API assigns member dashboards; they come back as a computed
//! list.

use serde_json::{json, Map, Value};

use super::{copy_field, merge_state, require_str, ResourceHandler, DASHBOARD_GROUP_API_PATH};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// `signalfx_dashboard_group`: groups dashboards in the web UI.
pub struct DashboardGroup;

impl ResourceHandler for DashboardGroup {
    fn type_name(&self) -> &'static str {
        "signalfx_dashboard_group"
    }

    fn api_path(&self) -> &'static str {
        DASHBOARD_GROUP_API_PATH
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "teams",
                Attribute::optional_string_list()
                    .with_description("Team IDs to associate the group with"),
            )
            .with_attribute(
                "dashboards",
                Attribute::new(
                    crate::schema::AttributeType::list(crate::schema::AttributeType::String),
                    crate::schema::AttributeFlags::computed(),
                ),
            )
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = Map::new();
        payload.insert("name".to_string(), json!(require_str(state, "name")?));
        copy_field(&mut payload, "description", state, "description");
        copy_field(&mut payload, "teams", state, "teams");
        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = Map::new();
        copy_field(&mut decoded, "id", response, "id");
        copy_field(&mut decoded, "name", response, "name");
        copy_field(&mut decoded, "description", response, "description");
        copy_field(&mut decoded, "teams", response, "teams");
        copy_field(&mut decoded, "dashboards", response, "dashboards");
        Ok(merge_state(prior, decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let state = json!({
            "name": "Production",
            "description": "Prod dashboards",
            "teams": ["team-1", "team-2"]
        });
        let payload = DashboardGroup.to_payload(&state).unwrap();
        assert_eq!(payload["name"], "Production");
        assert_eq!(payload["teams"], json!(["team-1", "team-2"]));
        // Dashboards are API-assigned, never submitted.
        assert!(payload.get("dashboards").is_none());
    }

    #[test]
    fn test_from_api_records_dashboards() {
        let response = json!({
            "id": "group-1",
            "name": "Production",
            "dashboards": ["dash-1"]
        });
        let state = DashboardGroup.from_api(&response, &json!({})).unwrap();
        assert_eq!(state["id"], "group-1");
        assert_eq!(state["dashboards"], json!(["dash-1"]));
    }
}
