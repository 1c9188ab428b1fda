//! Detector resource: a signalflow program plus alerting rules.

use serde_json::{json, Map, Value};

use super::validators::{
    check_enum, check_max_delay, check_notifications, check_time_range, notification_payload,
    notification_string, SEVERITIES,
};
use super::{
    copy_field, merge_state, require_str, time_object, ResourceHandler, DETECTOR_API_PATH,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};

/// `signalfx_detector`: fires alerts when its rules' conditions are met.
pub struct Detector;

impl ResourceHandler for Detector {
    fn type_name(&self) -> &'static str {
        "signalfx_detector"
    }

    fn api_path(&self) -> &'static str {
        DETECTOR_API_PATH
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("program_text", Attribute::required_string())
            .with_attribute("max_delay", Attribute::optional_int64())
            .with_attribute("show_data_markers", Attribute::optional_bool())
            .with_attribute("show_event_lines", Attribute::optional_bool())
            .with_attribute("disable_sampling", Attribute::optional_bool())
            .with_attribute("time_range", Attribute::optional_string())
            .with_attribute("start_time", Attribute::optional_int64())
            .with_attribute("end_time", Attribute::optional_int64())
            .with_block(
                "rule",
                NestedBlock::list(
                    Block::new()
                        .with_attribute(
                            "detect_label",
                            Attribute::required_string()
                                .with_description("Label of the detect() statement this rule fires on"),
                        )
                        .with_attribute("severity", Attribute::required_string())
                        .with_attribute("description", Attribute::optional_string())
                        .with_attribute("disabled", Attribute::optional_bool())
                        .with_attribute("notifications", Attribute::optional_string_list())
                        .with_attribute("parameterized_body", Attribute::optional_string())
                        .with_attribute("parameterized_subject", Attribute::optional_string())
                        .with_attribute("runbook_url", Attribute::optional_string())
                        .with_attribute("tip", Attribute::optional_string()),
                )
                .with_min_items(1),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        diagnostics.extend(check_max_delay(config));
        diagnostics.extend(check_time_range(config));
        if let Some(rules) = config.get("rule").and_then(Value::as_array) {
            for (i, rule) in rules.iter().enumerate() {
                if let Some(diag) = check_enum(rule, "severity", SEVERITIES) {
                    let path = format!("rule.{}.severity", i);
                    diagnostics.push(diag.with_attribute(path));
                }
                for diag in check_notifications(rule, "notifications") {
                    let nested = diag.attribute.clone().unwrap_or_default();
                    diagnostics.push(diag.with_attribute(format!("rule.{}.{}", i, nested)));
                }
            }
        }
        diagnostics
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = Map::new();
        payload.insert("name".to_string(), json!(require_str(state, "name")?));
        copy_field(&mut payload, "description", state, "description");
        payload.insert(
            "programText".to_string(),
            json!(require_str(state, "program_text")?),
        );
        copy_field(&mut payload, "maxDelay", state, "max_delay");

        let rules = state
            .get("rule")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Validation("detector requires at least one rule".to_string()))?;
        let mut encoded_rules = Vec::with_capacity(rules.len());
        for rule in rules {
            let mut entry = Map::new();
            entry.insert(
                "detectLabel".to_string(),
                json!(require_str(rule, "detect_label")?),
            );
            entry.insert("severity".to_string(), json!(require_str(rule, "severity")?));
            copy_field(&mut entry, "description", rule, "description");
            copy_field(&mut entry, "disabled", rule, "disabled");
            copy_field(&mut entry, "parameterizedBody", rule, "parameterized_body");
            copy_field(&mut entry, "parameterizedSubject", rule, "parameterized_subject");
            copy_field(&mut entry, "runbookUrl", rule, "runbook_url");
            copy_field(&mut entry, "tip", rule, "tip");
            if let Some(specs) = rule.get("notifications").and_then(Value::as_array) {
                let mut notifications = Vec::with_capacity(specs.len());
                for spec in specs {
                    let spec = spec.as_str().ok_or_else(|| {
                        ProviderError::Validation("notifications must be strings".to_string())
                    })?;
                    let encoded = notification_payload(spec).map_err(ProviderError::Validation)?;
                    notifications.push(encoded);
                }
                entry.insert("notifications".to_string(), Value::Array(notifications));
            }
            encoded_rules.push(Value::Object(entry));
        }
        payload.insert("rules".to_string(), Value::Array(encoded_rules));

        let mut visualization = Map::new();
        copy_field(&mut visualization, "showDataMarkers", state, "show_data_markers");
        copy_field(&mut visualization, "showEventLines", state, "show_event_lines");
        copy_field(&mut visualization, "disableSampling", state, "disable_sampling");
        if let Some(time) = time_object(state) {
            visualization.insert("time".to_string(), time);
        }
        if !visualization.is_empty() {
            payload.insert(
                "visualizationOptions".to_string(),
                Value::Object(visualization),
            );
        }

        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = Map::new();
        copy_field(&mut decoded, "id", response, "id");
        copy_field(&mut decoded, "name", response, "name");
        copy_field(&mut decoded, "description", response, "description");
        copy_field(&mut decoded, "program_text", response, "programText");
        copy_field(&mut decoded, "max_delay", response, "maxDelay");

        if let Some(rules) = response.get("rules").and_then(Value::as_array) {
            let entries: Vec<Value> = rules
                .iter()
                .map(|rule| {
                    let mut entry = Map::new();
                    copy_field(&mut entry, "detect_label", rule, "detectLabel");
                    copy_field(&mut entry, "severity", rule, "severity");
                    copy_field(&mut entry, "description", rule, "description");
                    copy_field(&mut entry, "disabled", rule, "disabled");
                    copy_field(&mut entry, "parameterized_body", rule, "parameterizedBody");
                    copy_field(&mut entry, "parameterized_subject", rule, "parameterizedSubject");
                    copy_field(&mut entry, "runbook_url", rule, "runbookUrl");
                    copy_field(&mut entry, "tip", rule, "tip");
                    if let Some(notifications) = rule.get("notifications").and_then(Value::as_array)
                    {
                        let specs: Vec<Value> = notifications
                            .iter()
                            .filter_map(notification_string)
                            .map(Value::String)
                            .collect();
                        entry.insert("notifications".to_string(), Value::Array(specs));
                    }
                    Value::Object(entry)
                })
                .collect();
            decoded.insert("rule".to_string(), Value::Array(entries));
        }

        Ok(merge_state(prior, decoded))
    }
}
