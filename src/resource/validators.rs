//! Field validators shared across resource schemas.
//!
//! These are pure, single-field predicate checks that run before a payload
//! is submitted: enumerated values, numeric ranges, and the notification
//! string format. Structural checks (types, required attributes) are the
//! job of [`crate::validation`].

use serde_json::{json, Value};

use super::relative_time_ms;
use crate::schema::Diagnostic;

/// Colors accepted by chart palettes.
pub const CHART_COLORS: &[&str] = &[
    "gray",
    "blue",
    "azure",
    "navy",
    "brown",
    "orange",
    "yellow",
    "iris",
    "magenta",
    "pink",
    "purple",
    "violet",
    "lilac",
    "emerald",
    "green",
    "aquamarine",
    "red",
    "gold",
    "greenyellow",
    "chartreuse",
    "jade",
];

/// Plot types accepted by time charts.
pub const PLOT_TYPES: &[&str] = &["LineChart", "AreaChart", "ColumnChart", "Histogram"];

/// Secondary visualizations accepted by single value charts.
pub const SECONDARY_VISUALIZATIONS: &[&str] = &["None", "Radial", "Linear", "Sparkline"];

/// Unit prefixes accepted by charts.
pub const UNIT_PREFIXES: &[&str] = &["Metric", "Binary"];

/// Coloring modes accepted by charts.
pub const COLOR_BY_VALUES: &[&str] = &["Dimension", "Metric", "Scale"];

/// Severities accepted by detector rules.
pub const SEVERITIES: &[&str] = &["Critical", "Major", "Minor", "Warning", "Info"];

/// Poll rates (ms) accepted by cloud integrations.
pub const POLL_RATES: &[i64] = &[60_000, 300_000];

/// Upper bound (ms) for `max_delay`.
pub const MAX_DELAY_CEILING: i64 = 900_000;

/// Check that a string attribute, if present, is one of the allowed values.
pub fn check_enum(config: &Value, key: &str, allowed: &[&str]) -> Option<Diagnostic> {
    let value = config.get(key)?.as_str()?;
    if allowed.contains(&value) {
        return None;
    }
    Some(
        Diagnostic::error(format!("'{}' is not a valid value for {}", value, key))
            .with_detail(format!("must be one of: {}", allowed.join(", ")))
            .with_attribute(key),
    )
}

/// Check that a chart color is in the palette.
pub fn check_color(value: &str, attribute: &str) -> Option<Diagnostic> {
    if CHART_COLORS.contains(&value) {
        return None;
    }
    Some(
        Diagnostic::error(format!("'{}' is not a valid chart color", value))
            .with_detail(format!("must be one of: {}", CHART_COLORS.join(", ")))
            .with_attribute(attribute),
    )
}

/// Index of a color name in the palette, as the API's theme index.
pub fn color_index(name: &str) -> Option<usize> {
    CHART_COLORS.iter().position(|color| *color == name)
}

/// Color name for an API theme index.
pub fn color_name(index: usize) -> Option<&'static str> {
    CHART_COLORS.get(index).copied()
}

/// Check that an integer attribute, if present, lies in `min..=max`.
pub fn check_int_range(config: &Value, key: &str, min: i64, max: i64) -> Option<Diagnostic> {
    let value = config.get(key)?.as_i64()?;
    if (min..=max).contains(&value) {
        return None;
    }
    Some(
        Diagnostic::error(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        ))
        .with_attribute(key),
    )
}

/// Check `max_delay` is within the API-accepted range.
pub fn check_max_delay(config: &Value) -> Option<Diagnostic> {
    check_int_range(config, "max_delay", 0, MAX_DELAY_CEILING)
}

/// Check `poll_rate` is one of the supported rates.
pub fn check_poll_rate(config: &Value) -> Option<Diagnostic> {
    let value = config.get("poll_rate")?.as_i64()?;
    if POLL_RATES.contains(&value) {
        return None;
    }
    Some(
        Diagnostic::error(format!("{} is not a valid poll_rate", value))
            .with_detail("must be one of: 60000, 300000")
            .with_attribute("poll_rate"),
    )
}

/// Check `sort_by`, if present, starts with an explicit direction.
pub fn check_sort_by(config: &Value) -> Option<Diagnostic> {
    let value = config.get("sort_by")?.as_str()?;
    if (value.starts_with('+') || value.starts_with('-')) && value.len() > 1 {
        return None;
    }
    Some(
        Diagnostic::error(format!("'{}' is not a valid sort_by", value))
            .with_detail("must be a property name prefixed with + (ascending) or - (descending)")
            .with_attribute("sort_by"),
    )
}

/// Check `time_range`, if present, is a valid relative time expression.
pub fn check_time_range(config: &Value) -> Option<Diagnostic> {
    let value = config.get("time_range")?.as_str()?;
    if relative_time_ms(value).is_some() {
        return None;
    }
    Some(
        Diagnostic::error(format!("'{}' is not a valid relative time", value))
            .with_detail("expected a value like -15m, -1h, -1d or -1w")
            .with_attribute("time_range"),
    )
}

/// Parse a notification string into the API notification object.
///
/// The string format is `System,arg[,arg]`, for example
/// `Email,ops@example.com` or `Slack,credentialId,channel`.
pub fn notification_payload(spec: &str) -> Result<Value, String> {
    let parts: Vec<&str> = spec.split(',').collect();
    match parts.as_slice() {
        ["Email", email] => Ok(json!({"type": "Email", "email": email})),
        ["PagerDuty", credential_id] => {
            Ok(json!({"type": "PagerDuty", "credentialId": credential_id}))
        }
        ["Slack", credential_id, channel] => {
            Ok(json!({"type": "Slack", "credentialId": credential_id, "channel": channel}))
        }
        ["Webhook", secret, url] => Ok(json!({"type": "Webhook", "secret": secret, "url": url})),
        ["Team", team] => Ok(json!({"type": "Team", "team": team})),
        ["TeamEmail", team] => Ok(json!({"type": "TeamEmail", "team": team})),
        ["XMatters", credential_id] => {
            Ok(json!({"type": "XMatters", "credentialId": credential_id}))
        }
        ["VictorOps", credential_id, routing_key] => Ok(
            json!({"type": "VictorOps", "credentialId": credential_id, "routingKey": routing_key}),
        ),
        _ => Err(format!("invalid notification string '{}'", spec)),
    }
}

/// Render an API notification object back into its string form.
///
/// Returns `None` for notification types this provider does not model.
pub fn notification_string(notification: &Value) -> Option<String> {
    let kind = notification.get("type")?.as_str()?;
    let field = |name: &str| {
        notification
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    match kind {
        "Email" => Some(format!("Email,{}", field("email")?)),
        "PagerDuty" => Some(format!("PagerDuty,{}", field("credentialId")?)),
        "Slack" => Some(format!(
            "Slack,{},{}",
            field("credentialId")?,
            field("channel")?
        )),
        "Webhook" => Some(format!("Webhook,{},{}", field("secret")?, field("url")?)),
        "Team" => Some(format!("Team,{}", field("team")?)),
        "TeamEmail" => Some(format!("TeamEmail,{}", field("team")?)),
        "XMatters" => Some(format!("XMatters,{}", field("credentialId")?)),
        "VictorOps" => Some(format!(
            "VictorOps,{},{}",
            field("credentialId")?,
            field("routingKey")?
        )),
        _ => None,
    }
}

/// Validate every entry of a notifications list attribute.
pub fn check_notifications(config: &Value, key: &str) -> Vec<Diagnostic> {
    let Some(entries) = config.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let spec = entry.as_str()?;
            notification_payload(spec).err().map(|message| {
                Diagnostic::error(message).with_attribute(format!("{}.{}", key, i))
            })
        })
        .collect()
}
