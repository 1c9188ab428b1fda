//! Single value chart resource.

use serde_json::{json, Map, Value};

use super::validators::{
    check_enum, check_max_delay, COLOR_BY_VALUES, SECONDARY_VISUALIZATIONS, UNIT_PREFIXES,
};
use super::{
    chart_common_state, chart_payload, copy_field, merge_state, ResourceHandler, CHART_API_PATH,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// `signalfx_single_value_chart`: the latest value of a single metric.
pub struct SingleValueChart;

impl ResourceHandler for SingleValueChart {
    fn type_name(&self) -> &'static str {
        "signalfx_single_value_chart"
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
            .with_attribute("refresh_interval", Attribute::optional_int64())
            .with_attribute(
                "max_precision",
                Attribute::optional_int64()
                    .with_description("Maximum number of digits to display"),
            )
            .with_attribute("is_timestamp_hidden", Attribute::optional_bool())
            .with_attribute(
                "show_spark_line",
                Attribute::optional_bool()
                    .with_description("Show a trend line below the current value"),
            )
            .with_attribute("secondary_visualization", Attribute::optional_string())
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        diagnostics.extend(check_enum(config, "unit_prefix", UNIT_PREFIXES));
        diagnostics.extend(check_enum(config, "color_by", COLOR_BY_VALUES));
        diagnostics.extend(check_enum(
            config,
            "secondary_visualization",
            SECONDARY_VISUALIZATIONS,
        ));
        diagnostics.extend(check_max_delay(config));
        diagnostics
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut options = Map::new();
        options.insert("type".to_string(), json!("SingleValue"));
        copy_field(&mut options, "unitPrefix", state, "unit_prefix");
        copy_field(&mut options, "colorBy", state, "color_by");
        copy_field(&mut options, "refreshInterval", state, "refresh_interval");
        copy_field(&mut options, "maximumPrecision", state, "max_precision");
        copy_field(&mut options, "timestampHidden", state, "is_timestamp_hidden");
        copy_field(&mut options, "showSparkLine", state, "show_spark_line");
        copy_field(
            &mut options,
            "secondaryVisualization",
            state,
            "secondary_visualization",
        );

        let mut program_options = Map::new();
        copy_field(&mut program_options, "maxDelay", state, "max_delay");
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
        copy_field(&mut decoded, "max_precision", &options, "maximumPrecision");
        copy_field(&mut decoded, "is_timestamp_hidden", &options, "timestampHidden");
        copy_field(&mut decoded, "show_spark_line", &options, "showSparkLine");
        copy_field(
            &mut decoded,
            "secondary_visualization",
            &options,
            "secondaryVisualization",
        );
        if let Some(program_options) = options.get("programOptions") {
            copy_field(&mut decoded, "max_delay", program_options, "maxDelay");
        }
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
            "name": "Error rate",
            "program_text": "data('errors.count').publish()",
            "show_spark_line": true,
            "secondary_visualization": "Radial",
            "max_precision": 2
        });
        let payload = SingleValueChart.to_payload(&state).unwrap();
        let options = &payload["options"];
        assert_eq!(options["type"], "SingleValue");
        assert_eq!(options["showSparkLine"], true);
        assert_eq!(options["secondaryVisualization"], "Radial");
        assert_eq!(options["maximumPrecision"], 2);
    }

    #[test]
    fn test_validate_secondary_visualization() {
        assert!(SingleValueChart
            .validate(&json!({"secondary_visualization": "Sparkline"}))
            .is_empty());
        assert_eq!(
            SingleValueChart
                .validate(&json!({"secondary_visualization": "Blinking"}))
                .len(),
            1
        );
    }

    #[test]
    fn test_from_api() {
        let response = json!({
            "id": "chart-3",
            "name": "Error rate",
            "programText": "data('errors.count').publish()",
            "options": {"type": "SingleValue", "showSparkLine": true}
        });
        let state = SingleValueChart.from_api(&response, &json!({})).unwrap();
        assert_eq!(state["id"], "chart-3");
        assert_eq!(state["show_spark_line"], true);
    }
}
