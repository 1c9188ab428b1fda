//! Resource handlers for SignalFx entity types.
//!
//! Every handler follows the same pattern: a schema declaring the
//! attributes users may set, optional field validators, a `to_payload`
//! translation from state (snake_case attributes) to the API request body
//! (camelCase fields), and a `from_api` translation back. CRUD itself is
//! generic and lives in the provider: create POSTs the collection path,
//! read/update/delete address `{path}/{id}`.

use serde_json::{json, Map, Value};

use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

pub mod dashboard;
pub mod dashboard_group;
pub mod detector;
pub mod heatmap_chart;
pub mod integration;
pub mod list_chart;
pub mod single_value_chart;
pub mod team;
pub mod text_chart;
pub mod time_chart;
pub mod validators;

/// API path for charts.
pub const CHART_API_PATH: &str = "/v2/chart";
/// API path for dashboards.
pub const DASHBOARD_API_PATH: &str = "/v2/dashboard";
/// API path for dashboard groups.
pub const DASHBOARD_GROUP_API_PATH: &str = "/v2/dashboardgroup";
/// API path for detectors.
pub const DETECTOR_API_PATH: &str = "/v2/detector";
/// API path for integrations (shared by all integration types).
pub const INTEGRATION_API_PATH: &str = "/v2/integration";
/// API path for teams.
pub const TEAM_API_PATH: &str = "/v2/team";

/// Contract every resource handler implements.
///
/// Handlers are pure translation: no I/O, no shared state. The provider
/// owns the HTTP calls.
pub trait ResourceHandler: Send + Sync + 'static {
    /// Resource type name, e.g. `signalfx_heatmap_chart`.
    fn type_name(&self) -> &'static str;

    /// Collection path on the API, e.g. `/v2/chart`.
    fn api_path(&self) -> &'static str;

    /// Schema of the resource.
    fn schema(&self) -> Schema;

    /// Field-level checks beyond structural schema validation.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Build the API request body from resource state.
    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError>;

    /// Translate an API response into resource state.
    ///
    /// `prior` is the state the operation started from; attributes the API
    /// does not echo back (sensitive keys, client-only bookkeeping) are
    /// preserved from it.
    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError>;
}

/// All handlers the provider registers.
pub fn all_handlers() -> Vec<Box<dyn ResourceHandler>> {
    vec![
        Box::new(time_chart::TimeChart),
        Box::new(list_chart::ListChart),
        Box::new(single_value_chart::SingleValueChart),
        Box::new(heatmap_chart::HeatmapChart),
        Box::new(text_chart::TextChart),
        Box::new(dashboard::Dashboard),
        Box::new(dashboard_group::DashboardGroup),
        Box::new(detector::Detector),
        Box::new(team::Team),
        Box::new(integration::PagerDutyIntegration),
        Box::new(integration::SlackIntegration),
        Box::new(integration::GcpIntegration),
        Box::new(integration::WebhookIntegration),
    ]
}

// ---------------------------------------------------------------------------
// Shared translation helpers
// ---------------------------------------------------------------------------

/// Fetch a required string attribute, or fail with a validation error.
pub(crate) fn require_str<'a>(state: &'a Value, key: &str) -> Result<&'a str, ProviderError> {
    state
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Validation(format!("missing required attribute '{}'", key)))
}

/// Copy `src[src_key]` to `dest[dest_key]` if present and non-null.
///
/// Used in both directions: state key to API field and back.
pub(crate) fn copy_field(dest: &mut Map<String, Value>, dest_key: &str, src: &Value, src_key: &str) {
    if let Some(v) = src.get(src_key) {
        if !v.is_null() {
            dest.insert(dest_key.to_string(), v.clone());
        }
    }
}

/// Merge decoded API fields over the prior state.
///
/// Prior-only attributes (sensitive values the API never echoes,
/// client-side bookkeeping) survive; decoded fields win on conflict.
pub(crate) fn merge_state(prior: &Value, decoded: Map<String, Value>) -> Value {
    let mut state = match prior {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in decoded {
        state.insert(key, value);
    }
    Value::Object(state)
}

/// Parse a relative time expression such as `-15m` or `-1h` into
/// milliseconds. Supported units: s, m, h, d, w.
pub(crate) fn relative_time_ms(expr: &str) -> Option<i64> {
    let rest = expr.strip_prefix('-')?;
    let (unit_start, unit) = rest.char_indices().last()?;
    let count: i64 = rest[..unit_start].parse().ok()?;
    let unit_ms = match unit {
        's' => 1_000,
        'm' => 60_000,
        'h' => 3_600_000,
        'd' => 86_400_000,
        'w' => 604_800_000,
        _ => return None,
    };
    count.checked_mul(unit_ms)
}

/// Build the API `time` object from state, if any time attributes are set.
///
/// `time_range` (relative, e.g. `-1h`) wins over `start_time`/`end_time`
/// (absolute, seconds since epoch; the API wants milliseconds).
pub(crate) fn time_object(state: &Value) -> Option<Value> {
    if let Some(range) = state.get("time_range").and_then(Value::as_str) {
        let ms = relative_time_ms(range)?;
        return Some(json!({"type": "relative", "range": ms}));
    }
    let start = state.get("start_time").and_then(Value::as_i64)?;
    let end = state.get("end_time").and_then(Value::as_i64)?;
    Some(json!({"type": "absolute", "start": start * 1000, "end": end * 1000}))
}

/// Build the API `legendOptions` object from `legend_fields_to_hide`.
///
/// Each listed property becomes a disabled legend field; properties not
/// listed stay visible by API default, so they are not sent.
pub(crate) fn legend_options_payload(state: &Value) -> Option<Value> {
    let fields = state.get("legend_fields_to_hide")?.as_array()?;
    let entries: Vec<Value> = fields
        .iter()
        .filter_map(Value::as_str)
        .map(|property| json!({"property": property, "enabled": false}))
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(json!({"fields": entries}))
}

/// Decode the disabled legend fields from an API `legendOptions` object
/// back into `legend_fields_to_hide`.
pub(crate) fn decode_legend_fields(decoded: &mut Map<String, Value>, options: &Value) {
    let Some(fields) = options
        .get("legendOptions")
        .and_then(|legend| legend.get("fields"))
        .and_then(Value::as_array)
    else {
        return;
    };
    let hidden: Vec<Value> = fields
        .iter()
        .filter(|field| field.get("enabled").and_then(Value::as_bool) == Some(false))
        .filter_map(|field| field.get("property").cloned())
        .collect();
    if !hidden.is_empty() {
        decoded.insert("legend_fields_to_hide".to_string(), Value::Array(hidden));
    }
}

/// Decode the fields every chart response carries: id, name, description,
/// program text.
pub(crate) fn chart_common_state(response: &Value) -> Map<String, Value> {
    let mut decoded = Map::new();
    copy_field(&mut decoded, "id", response, "id");
    copy_field(&mut decoded, "name", response, "name");
    copy_field(&mut decoded, "description", response, "description");
    copy_field(&mut decoded, "program_text", response, "programText");
    decoded
}

/// Assemble a chart payload: common fields plus the chart-type-specific
/// `options` object.
pub(crate) fn chart_payload(
    state: &Value,
    options: Map<String, Value>,
) -> Result<Value, ProviderError> {
    let mut payload = Map::new();
    payload.insert("name".to_string(), json!(require_str(state, "name")?));
    copy_field(&mut payload, "description", state, "description");
    payload.insert(
        "programText".to_string(),
        json!(require_str(state, "program_text")?),
    );
    payload.insert("options".to_string(), Value::Object(options));
    Ok(Value::Object(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relative_time_ms() {
        assert_eq!(relative_time_ms("-15m"), Some(900_000));
        assert_eq!(relative_time_ms("-1h"), Some(3_600_000));
        assert_eq!(relative_time_ms("-1d"), Some(86_400_000));
        assert_eq!(relative_time_ms("-2w"), Some(1_209_600_000));
        assert_eq!(relative_time_ms("-30s"), Some(30_000));
        assert_eq!(relative_time_ms("15m"), None);
        assert_eq!(relative_time_ms("-15x"), None);
        assert_eq!(relative_time_ms("-"), None);
    }

    #[test]
    fn test_relative_time_ms_multibyte_unit() {
        assert_eq!(relative_time_ms("-1µ"), None);
        assert_eq!(relative_time_ms("-µ"), None);
        assert_eq!(relative_time_ms("-1時間"), None);
    }

    #[test]
    fn test_relative_time_ms_overflow() {
        assert_eq!(relative_time_ms("-9223372036854775807w"), None);
        assert_eq!(relative_time_ms("-99999999999999999999s"), None);
    }

    #[test]
    fn test_time_object_relative() {
        let time = time_object(&json!({"time_range": "-1h"})).unwrap();
        assert_eq!(time, json!({"type": "relative", "range": 3_600_000}));
    }

    #[test]
    fn test_time_object_absolute() {
        let time = time_object(&json!({"start_time": 100, "end_time": 200})).unwrap();
        assert_eq!(
            time,
            json!({"type": "absolute", "start": 100_000, "end": 200_000})
        );
    }

    #[test]
    fn test_time_object_absent() {
        assert!(time_object(&json!({})).is_none());
        assert!(time_object(&json!({"start_time": 100})).is_none());
    }

    #[test]
    fn test_merge_state_preserves_prior_only_fields() {
        let prior = json!({"api_key": "secret", "name": "old"});
        let mut decoded = Map::new();
        decoded.insert("name".to_string(), json!("new"));
        decoded.insert("id".to_string(), json!("abc"));

        let merged = merge_state(&prior, decoded);
        assert_eq!(merged["api_key"], "secret");
        assert_eq!(merged["name"], "new");
        assert_eq!(merged["id"], "abc");
    }

    #[test]
    fn test_require_str() {
        assert_eq!(require_str(&json!({"name": "x"}), "name").unwrap(), "x");
        let err = require_str(&json!({}), "name").unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_chart_payload_common_fields() {
        let state = json!({
            "name": "CPU",
            "description": "CPU usage",
            "program_text": "data('cpu.total.idle').publish()"
        });
        let payload = chart_payload(&state, Map::new()).unwrap();
        assert_eq!(payload["name"], "CPU");
        assert_eq!(payload["description"], "CPU usage");
        assert_eq!(payload["programText"], "data('cpu.total.idle').publish()");
        assert!(payload["options"].is_object());
    }

    #[test]
    fn test_all_handlers_unique_type_names() {
        let handlers = all_handlers();
        let mut names: Vec<_> = handlers.iter().map(|h| h.type_name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"signalfx_time_chart"));
        assert!(names.contains(&"signalfx_gcp_integration"));
    }
}
