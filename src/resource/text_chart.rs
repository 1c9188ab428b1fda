//! Text chart resource: a markdown note placed on a dashboard.

use serde_json::{json, Map, Value};

use super::{copy_field, merge_state, require_str, ResourceHandler, CHART_API_PATH};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// `signalfx_text_chart`: markdown text rendered as a chart.
pub struct TextChart;

impl ResourceHandler for TextChart {
    fn type_name(&self) -> &'static str {
        "signalfx_text_chart"
    }

    fn api_path(&self) -> &'static str {
        CHART_API_PATH
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "markdown",
                Attribute::required_string().with_description("Markdown text to display"),
            )
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = Map::new();
        payload.insert("name".to_string(), json!(require_str(state, "name")?));
        copy_field(&mut payload, "description", state, "description");
        payload.insert(
            "options".to_string(),
            json!({"type": "Text", "markdown": require_str(state, "markdown")?}),
        );
        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = Map::new();
        copy_field(&mut decoded, "id", response, "id");
        copy_field(&mut decoded, "name", response, "name");
        copy_field(&mut decoded, "description", response, "description");
        if let Some(options) = response.get("options") {
            copy_field(&mut decoded, "markdown", options, "markdown");
        }
        Ok(merge_state(prior, decoded))
    }
}
