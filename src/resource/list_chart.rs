//! List chart resource.

use serde_json::{json, Map, Value};

use super::validators::{check_enum, check_max_delay, check_sort_by, COLOR_BY_VALUES, UNIT_PREFIXES};
use super::{
    chart_common_state, chart_payload, copy_field, decode_legend_fields, legend_options_payload,
    merge_state, ResourceHandler, CHART_API_PATH,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// `signalfx_list_chart`: current values of metrics as a sortable list.
pub struct ListChart;

impl ResourceHandler for ListChart {
    fn type_name(&self) -> &'static str {
        "signalfx_list_chart"
    }

    fn api_path(&self) -> &'static str {
        CHART_API_PATH
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("program_text", Attribute::required_string())
            .with_attribute("unit_prefix", Attribute::optional_string())
            .with_attribute("color_by", Attribute::optional_string())
            .with_attribute("max_delay", Attribute::optional_int64())
            .with_attribute("disable_sampling", Attribute::optional_bool())
            .with_attribute(
                "refresh_interval",
                Attribute::optional_int64()
                    .with_description("How often (ms) to refresh the values of the list"),
            )
            .with_attribute(
                "sort_by",
                Attribute::optional_string()
                    .with_description("Property to sort by, prefixed with + or -"),
            )
            .with_attribute(
                "legend_fields_to_hide",
                Attribute::optional_string_list()
                    .with_description("Properties to hide from the chart legend"),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        diagnostics.extend(check_enum(config, "unit_prefix", UNIT_PREFIXES));
        diagnostics.extend(check_enum(config, "color_by", COLOR_BY_VALUES));
        diagnostics.extend(check_max_delay(config));
        diagnostics.extend(check_sort_by(config));
        diagnostics
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut options = Map::new();
        options.insert("type".to_string(), json!("List"));
        copy_field(&mut options, "unitPrefix", state, "unit_prefix");
        copy_field(&mut options, "colorBy", state, "color_by");
        copy_field(&mut options, "refreshInterval", state, "refresh_interval");
        copy_field(&mut options, "sortBy", state, "sort_by");
        if let Some(legend) = legend_options_payload(state) {
            options.insert("legendOptions".to_string(), legend);
        }

        let mut program_options = Map::new();
        copy_field(&mut program_options, "maxDelay", state, "max_delay");
        copy_field(
            &mut program_options,
            "disableSampling",
            state,
            "disable_sampling",
        );
        if !program_options.is_empty() {
            options.insert("programOptions".to_string(), Value::Object(program_options));
        }

        chart_payload(state, options)
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = chart_common_state(response);
        let options = response.get("options").cloned().unwrap_or(Value::Null);
        copy_field(&mut decoded, "unit_prefix", &options, "unitPrefix");
        copy_field(&mut decoded, "color_by", &options, "colorBy");
        copy_field(&mut decoded, "refresh_interval", &options, "refreshInterval");
        copy_field(&mut decoded, "sort_by", &options, "sortBy");
        if let Some(program_options) = options.get("programOptions") {
            copy_field(&mut decoded, "max_delay", program_options, "maxDelay");
            copy_field(
                &mut decoded,
                "disable_sampling",
                program_options,
                "disableSampling",
            );
        }
        decode_legend_fields(&mut decoded, &options);
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
            "name": "Active hosts",
            "program_text": "data('host.up').publish()",
            "color_by": "Metric",
            "sort_by": "-value",
            "refresh_interval": 5000
        });
        let payload = ListChart.to_payload(&state).unwrap();
        let options = &payload["options"];
        assert_eq!(options["type"], "List");
        assert_eq!(options["sortBy"], "-value");
        assert_eq!(options["refreshInterval"], 5000);
        assert_eq!(options["colorBy"], "Metric");
    }

    #[test]
    fn test_legend_fields_round_trip() {
        let state = json!({
            "name": "Active hosts",
            "program_text": "data('host.up').publish()",
            "legend_fields_to_hide": ["sf_metric", "host"]
        });
        let payload = ListChart.to_payload(&state).unwrap();
        assert_eq!(
            payload["options"]["legendOptions"]["fields"],
            json!([
                {"property": "sf_metric", "enabled": false},
                {"property": "host", "enabled": false}
            ])
        );

        let response = json!({
            "id": "chart-2",
            "name": "Active hosts",
            "programText": "data('host.up').publish()",
            "options": {"type": "List", "legendOptions": {"fields": [
                {"property": "sf_metric", "enabled": false},
                {"property": "host", "enabled": false}
            ]}}
        });
        let decoded = ListChart.from_api(&response, &json!({})).unwrap();
        assert_eq!(decoded["legend_fields_to_hide"], json!(["sf_metric", "host"]));
    }

    #[test]
    fn test_validate_sort_by() {
        assert!(ListChart.validate(&json!({"sort_by": "-value"})).is_empty());
        assert_eq!(ListChart.validate(&json!({"sort_by": "value"})).len(), 1);
    }

    #[test]
    fn test_from_api() {
        let response = json!({
            "id": "chart-2",
            "name": "Active hosts",
            "programText": "data('host.up').publish()",
            "options": {"type": "List", "sortBy": "-value"}
        });
        let state = ListChart.from_api(&response, &json!({})).unwrap();
        assert_eq!(state["id"], "chart-2");
        assert_eq!(state["sort_by"], "-value");
    }
}
