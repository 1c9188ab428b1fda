//! Heatmap chart resource.

use serde_json::{json, Map, Value};

use super::validators::{check_color, check_max_delay, check_sort_by, check_enum, UNIT_PREFIXES};
use super::{
    chart_common_state, chart_payload, copy_field, merge_state, ResourceHandler, CHART_API_PATH,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};

/// `signalfx_heatmap_chart`: metrics as a grid of colored squares.
pub struct HeatmapChart;

impl ResourceHandler for HeatmapChart {
    fn type_name(&self) -> &'static str {
        "signalfx_heatmap_chart"
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
            .with_attribute("max_delay", Attribute::optional_int64())
            .with_attribute("refresh_interval", Attribute::optional_int64())
            .with_attribute("disable_sampling", Attribute::optional_bool())
            .with_attribute("hide_timestamp", Attribute::optional_bool())
            .with_attribute(
                "group_by",
                Attribute::optional_string_list()
                    .with_description("Dimensions to group the squares by"),
            )
            .with_attribute("sort_by", Attribute::optional_string())
            .with_block(
                "color_range",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("min_value", Attribute::optional_float64())
                        .with_attribute("max_value", Attribute::optional_float64())
                        .with_attribute("color", Attribute::required_string()),
                ),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        diagnostics.extend(check_enum(config, "unit_prefix", UNIT_PREFIXES));
        diagnostics.extend(check_max_delay(config));
        diagnostics.extend(check_sort_by(config));
        if let Some(color) = config
            .get("color_range")
            .and_then(|range| range.get("color"))
            .and_then(Value::as_str)
        {
            diagnostics.extend(check_color(color, "color_range.color"));
        }
        diagnostics
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut options = Map::new();
        options.insert("type".to_string(), json!("Heatmap"));
        copy_field(&mut options, "unitPrefix", state, "unit_prefix");
        copy_field(&mut options, "refreshInterval", state, "refresh_interval");
        copy_field(&mut options, "timestampHidden", state, "hide_timestamp");
        copy_field(&mut options, "groupBy", state, "group_by");
        copy_field(&mut options, "sortBy", state, "sort_by");

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

        if let Some(range) = state.get("color_range").filter(|v| v.is_object()) {
            let mut color_range = Map::new();
            copy_field(&mut color_range, "min", range, "min_value");
            copy_field(&mut color_range, "max", range, "max_value");
            copy_field(&mut color_range, "color", range, "color");
            options.insert("colorBy".to_string(), json!("Range"));
            options.insert("colorRange".to_string(), Value::Object(color_range));
        }

        chart_payload(state, options)
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = chart_common_state(response);
        let options = response.get("options").cloned().unwrap_or(Value::Null);
        copy_field(&mut decoded, "unit_prefix", &options, "unitPrefix");
        copy_field(&mut decoded, "refresh_interval", &options, "refreshInterval");
        copy_field(&mut decoded, "hide_timestamp", &options, "timestampHidden");
        copy_field(&mut decoded, "group_by", &options, "groupBy");
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
        if let Some(range) = options.get("colorRange") {
            let mut color_range = Map::new();
            copy_field(&mut color_range, "min_value", range, "min");
            copy_field(&mut color_range, "max_value", range, "max");
            copy_field(&mut color_range, "color", range, "color");
            decoded.insert("color_range".to_string(), Value::Object(color_range));
        }
        Ok(merge_state(prior, decoded))
    }
}
