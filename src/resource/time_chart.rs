//! Time series chart resource.

use serde_json::{json, Map, Value};

use super::validators::{
    check_color, check_enum, check_max_delay, check_time_range, color_index, color_name,
    COLOR_BY_VALUES, PLOT_TYPES, UNIT_PREFIXES,
};
use super::{
    chart_common_state, chart_payload, copy_field, decode_legend_fields, legend_options_payload,
    merge_state, time_object, ResourceHandler, CHART_API_PATH,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};

/// `signalfx_time_chart`: a chart plotting metrics over time.
pub struct TimeChart;

impl ResourceHandler for TimeChart {
    fn type_name(&self) -> &'static str {
        "signalfx_time_chart"
    }

    fn api_path(&self) -> &'static str {
        CHART_API_PATH
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Name of the chart"),
            )
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "program_text",
                Attribute::required_string()
                    .with_description("Signalflow program text for the chart"),
            )
            .with_attribute(
                "plot_type",
                Attribute::optional_string()
                    .with_default(json!("LineChart"))
                    .with_description("Default visualization for the chart's plots"),
            )
            .with_attribute("unit_prefix", Attribute::optional_string())
            .with_attribute("color_by", Attribute::optional_string())
            .with_attribute("minimum_resolution", Attribute::optional_int64())
            .with_attribute(
                "max_delay",
                Attribute::optional_int64()
                    .with_description("How long (ms) to wait for late datapoints"),
            )
            .with_attribute("disable_sampling", Attribute::optional_bool())
            .with_attribute("stacked", Attribute::optional_bool())
            .with_attribute("show_event_lines", Attribute::optional_bool())
            .with_attribute(
                "time_range",
                Attribute::optional_string()
                    .with_description("Relative time window, e.g. -1h"),
            )
            .with_attribute("start_time", Attribute::optional_int64())
            .with_attribute("end_time", Attribute::optional_int64())
            .with_attribute(
                "legend_fields_to_hide",
                Attribute::optional_string_list()
                    .with_description("Properties to hide from the chart legend"),
            )
            .with_block(
                "histogram_options",
                NestedBlock::single(Block::new().with_attribute(
                    "color_theme",
                    Attribute::optional_string()
                        .with_description("Color theme for histogram plots"),
                )),
            )
            .with_block(
                "axis_left",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("label", Attribute::optional_string())
                        .with_attribute("min_value", Attribute::optional_float64())
                        .with_attribute("max_value", Attribute::optional_float64())
                        .with_attribute("high_watermark", Attribute::optional_float64())
                        .with_attribute("low_watermark", Attribute::optional_float64()),
                ),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        diagnostics.extend(check_enum(config, "plot_type", PLOT_TYPES));
        diagnostics.extend(check_enum(config, "unit_prefix", UNIT_PREFIXES));
        diagnostics.extend(check_enum(config, "color_by", COLOR_BY_VALUES));
        diagnostics.extend(check_max_delay(config));
        diagnostics.extend(check_time_range(config));
        if let Some(theme) = config
            .get("histogram_options")
            .and_then(|block| block.get("color_theme"))
            .and_then(Value::as_str)
        {
            diagnostics.extend(check_color(theme, "histogram_options.color_theme"));
        }
        diagnostics
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut options = Map::new();
        options.insert("type".to_string(), json!("TimeSeriesChart"));
        copy_field(&mut options, "defaultPlotType", state, "plot_type");
        copy_field(&mut options, "unitPrefix", state, "unit_prefix");
        copy_field(&mut options, "colorBy", state, "color_by");
        copy_field(&mut options, "stacked", state, "stacked");
        copy_field(&mut options, "showEventLines", state, "show_event_lines");

        let mut program_options = Map::new();
        copy_field(
            &mut program_options,
            "minimumResolution",
            state,
            "minimum_resolution",
        );
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

        if let Some(time) = time_object(state) {
            options.insert("time".to_string(), time);
        }

        if let Some(legend) = legend_options_payload(state) {
            options.insert("legendOptions".to_string(), legend);
        }

        if let Some(index) = state
            .get("histogram_options")
            .and_then(|block| block.get("color_theme"))
            .and_then(Value::as_str)
            .and_then(color_index)
        {
            options.insert(
                "histogramChartOptions".to_string(),
                json!({"colorThemeIndex": index}),
            );
        }

        if let Some(axis) = state.get("axis_left").filter(|v| v.is_object()) {
            let mut axes = Map::new();
            copy_field(&mut axes, "label", axis, "label");
            copy_field(&mut axes, "min", axis, "min_value");
            copy_field(&mut axes, "max", axis, "max_value");
            copy_field(&mut axes, "highWatermark", axis, "high_watermark");
            copy_field(&mut axes, "lowWatermark", axis, "low_watermark");
            options.insert("axes".to_string(), json!([Value::Object(axes)]));
        }

        chart_payload(state, options)
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = chart_common_state(response);
        let options = response.get("options").cloned().unwrap_or(Value::Null);
        copy_field(&mut decoded, "plot_type", &options, "defaultPlotType");
        copy_field(&mut decoded, "unit_prefix", &options, "unitPrefix");
        copy_field(&mut decoded, "color_by", &options, "colorBy");
        copy_field(&mut decoded, "stacked", &options, "stacked");
        copy_field(&mut decoded, "show_event_lines", &options, "showEventLines");
        if let Some(program_options) = options.get("programOptions") {
            copy_field(
                &mut decoded,
                "minimum_resolution",
                program_options,
                "minimumResolution",
            );
            copy_field(&mut decoded, "max_delay", program_options, "maxDelay");
            copy_field(
                &mut decoded,
                "disable_sampling",
                program_options,
                "disableSampling",
            );
        }
        decode_legend_fields(&mut decoded, &options);
        if let Some(name) = options
            .get("histogramChartOptions")
            .and_then(|histogram| histogram.get("colorThemeIndex"))
            .and_then(Value::as_u64)
            .and_then(|index| color_name(index as usize))
        {
            decoded.insert("histogram_options".to_string(), json!({"color_theme": name}));
        }
        Ok(merge_state(prior, decoded))
    }
}
