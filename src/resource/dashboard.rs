//! Dashboard resource.

use serde_json::{json, Map, Value};

use super::validators::check_time_range;
use super::{
    copy_field, merge_state, require_str, time_object, ResourceHandler, DASHBOARD_API_PATH,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};

/// `signalfx_dashboard`: a collection of charts with shared filters and
/// time window.
pub struct Dashboard;

impl ResourceHandler for Dashboard {
    fn type_name(&self) -> &'static str {
        "signalfx_dashboard"
    }

    fn api_path(&self) -> &'static str {
        DASHBOARD_API_PATH
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "dashboard_group",
                Attribute::required_string()
                    .with_description("ID of the dashboard group that holds this dashboard")
                    .with_force_new(),
            )
            .with_attribute("time_range", Attribute::optional_string())
            .with_attribute("start_time", Attribute::optional_int64())
            .with_attribute("end_time", Attribute::optional_int64())
            .with_block(
                "chart",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("chart_id", Attribute::required_string())
                        .with_attribute("row", Attribute::optional_int64())
                        .with_attribute("column", Attribute::optional_int64())
                        .with_attribute(
                            "width",
                            Attribute::optional_int64().with_default(json!(12)),
                        )
                        .with_attribute(
                            "height",
                            Attribute::optional_int64().with_default(json!(1)),
                        ),
                ),
            )
            .with_block(
                "filter",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("property", Attribute::required_string())
                        .with_attribute("values", Attribute::optional_string_list())
                        .with_attribute("negated", Attribute::optional_bool()),
                ),
            )
            .with_block(
                "variable",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("property", Attribute::required_string())
                        .with_attribute("alias", Attribute::optional_string())
                        .with_attribute("values", Attribute::optional_string_list()),
                ),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        check_time_range(config).into_iter().collect()
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = Map::new();
        payload.insert("name".to_string(), json!(require_str(state, "name")?));
        copy_field(&mut payload, "description", state, "description");
        payload.insert(
            "groupId".to_string(),
            json!(require_str(state, "dashboard_group")?),
        );

        if let Some(charts) = state.get("chart").and_then(Value::as_array) {
            let entries: Vec<Value> = charts
                .iter()
                .map(|chart| {
                    let mut entry = Map::new();
                    copy_field(&mut entry, "chartId", chart, "chart_id");
                    copy_field(&mut entry, "row", chart, "row");
                    copy_field(&mut entry, "column", chart, "column");
                    copy_field(&mut entry, "width", chart, "width");
                    copy_field(&mut entry, "height", chart, "height");
                    Value::Object(entry)
                })
                .collect();
            payload.insert("charts".to_string(), Value::Array(entries));
        }

        let mut filters = Map::new();
        if let Some(time) = time_object(state) {
            filters.insert("time".to_string(), time);
        }
        if let Some(sources) = state.get("filter").and_then(Value::as_array) {
            let entries: Vec<Value> = sources
                .iter()
                .map(|filter| {
                    let mut entry = Map::new();
                    copy_field(&mut entry, "property", filter, "property");
                    copy_field(&mut entry, "values", filter, "values");
                    copy_field(&mut entry, "NOT", filter, "negated");
                    Value::Object(entry)
                })
                .collect();
            filters.insert("sources".to_string(), Value::Array(entries));
        }
        if let Some(variables) = state.get("variable").and_then(Value::as_array) {
            let entries: Vec<Value> = variables
                .iter()
                .map(|variable| {
                    let mut entry = Map::new();
                    copy_field(&mut entry, "property", variable, "property");
                    copy_field(&mut entry, "alias", variable, "alias");
                    copy_field(&mut entry, "value", variable, "values");
                    Value::Object(entry)
                })
                .collect();
            filters.insert("variables".to_string(), Value::Array(entries));
        }
        if !filters.is_empty() {
            payload.insert("filters".to_string(), Value::Object(filters));
        }

        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = Map::new();
        copy_field(&mut decoded, "id", response, "id");
        copy_field(&mut decoded, "name", response, "name");
        copy_field(&mut decoded, "description", response, "description");
        copy_field(&mut decoded, "dashboard_group", response, "groupId");

        if let Some(charts) = response.get("charts").and_then(Value::as_array) {
            let entries: Vec<Value> = charts
                .iter()
                .map(|chart| {
                    let mut entry = Map::new();
                    copy_field(&mut entry, "chart_id", chart, "chartId");
                    copy_field(&mut entry, "row", chart, "row");
                    copy_field(&mut entry, "column", chart, "column");
                    copy_field(&mut entry, "width", chart, "width");
                    copy_field(&mut entry, "height", chart, "height");
                    Value::Object(entry)
                })
                .collect();
            decoded.insert("chart".to_string(), Value::Array(entries));
        }

        Ok(merge_state(prior, decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> Value {
        json!({
            "name": "Service overview",
            "dashboard_group": "group-1",
            "time_range": "-1h",
            "chart": [
                {"chart_id": "chart-1", "row": 0, "column": 0, "width": 6, "height": 1},
                {"chart_id": "chart-2", "row": 0, "column": 6, "width": 6, "height": 1}
            ],
            "filter": [
                {"property": "env", "values": ["prod"], "negated": false}
            ],
            "variable": [
                {"property": "service", "alias": "svc", "values": ["api"]}
            ]
        })
    }

    #[test]
    fn test_payload_shape() {
        let payload = Dashboard.to_payload(&state()).unwrap();
        assert_eq!(payload["groupId"], "group-1");
        assert_eq!(payload["charts"][0]["chartId"], "chart-1");
        assert_eq!(payload["charts"][1]["column"], 6);
        assert_eq!(payload["filters"]["time"]["range"], 3_600_000);
        assert_eq!(payload["filters"]["sources"][0]["property"], "env");
        assert_eq!(payload["filters"]["sources"][0]["NOT"], false);
        assert_eq!(payload["filters"]["variables"][0]["alias"], "svc");
    }

    #[test]
    fn test_group_required() {
        let err = Dashboard
            .to_payload(&json!({"name": "dash"}))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_from_api_decodes_charts() {
        let response = json!({
            "id": "dash-1",
            "name": "Service overview",
            "groupId": "group-1",
            "charts": [{"chartId": "chart-1", "row": 0, "column": 0, "width": 6, "height": 1}]
        });
        let state = Dashboard.from_api(&response, &json!({})).unwrap();
        assert_eq!(state["id"], "dash-1");
        assert_eq!(state["dashboard_group"], "group-1");
        assert_eq!(state["chart"][0]["chart_id"], "chart-1");
    }

    #[test]
    fn test_schema_marks_group_force_new() {
        let schema = Dashboard.schema();
        assert!(schema.block.attributes["dashboard_group"].force_new);
    }
}
