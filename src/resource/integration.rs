//! Integration resources.
//!
//! All integration types share one collection path; the request body's
//! `type` field tells the API which kind is being managed. Credentials
//! (API keys, webhook secrets) are write-only: the API never echoes them
//! back, so `from_api` relies on the prior-state merge to keep them.

use serde_json::{json, Map, Value};

use super::validators::check_poll_rate;
use super::{copy_field, merge_state, require_str, ResourceHandler, INTEGRATION_API_PATH};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};

fn integration_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string())
        .with_attribute(
            "enabled",
            Attribute::required_bool().with_description("Whether the integration is active"),
        )
}

fn integration_payload(state: &Value, kind: &str) -> Result<Map<String, Value>, ProviderError> {
    let enabled = state
        .get("enabled")
        .and_then(Value::as_bool)
        .ok_or_else(|| ProviderError::Validation("missing required attribute 'enabled'".to_string()))?;
    let mut payload = Map::new();
    payload.insert("name".to_string(), json!(require_str(state, "name")?));
    payload.insert("type".to_string(), json!(kind));
    payload.insert("enabled".to_string(), json!(enabled));
    Ok(payload)
}

fn integration_state(response: &Value) -> Map<String, Value> {
    let mut decoded = Map::new();
    copy_field(&mut decoded, "id", response, "id");
    copy_field(&mut decoded, "name", response, "name");
    copy_field(&mut decoded, "enabled", response, "enabled");
    decoded
}

/// `signalfx_pagerduty_integration`: routes alerts to PagerDuty.
pub struct PagerDutyIntegration;

impl ResourceHandler for PagerDutyIntegration {
    fn type_name(&self) -> &'static str {
        "signalfx_pagerduty_integration"
    }

    fn api_path(&self) -> &'static str {
        INTEGRATION_API_PATH
    }

    fn schema(&self) -> Schema {
        integration_schema().with_attribute(
            "api_key",
            Attribute::optional_string().sensitive(),
        )
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = integration_payload(state, "PagerDuty")?;
        copy_field(&mut payload, "apiKey", state, "api_key");
        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        // apiKey is never echoed; the prior-state merge keeps it.
        Ok(merge_state(prior, integration_state(response)))
    }
}

/// `signalfx_slack_integration`: routes alerts to Slack.
pub struct SlackIntegration;

impl ResourceHandler for SlackIntegration {
    fn type_name(&self) -> &'static str {
        "signalfx_slack_integration"
    }

    fn api_path(&self) -> &'static str {
        INTEGRATION_API_PATH
    }

    fn schema(&self) -> Schema {
        integration_schema().with_attribute(
            "webhook_url",
            Attribute::required_string().sensitive(),
        )
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = integration_payload(state, "Slack")?;
        payload.insert(
            "webhookUrl".to_string(),
            json!(require_str(state, "webhook_url")?),
        );
        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        Ok(merge_state(prior, integration_state(response)))
    }
}

/// `signalfx_gcp_integration`: ingests Stackdriver metrics from GCP
/// projects.
pub struct GcpIntegration;

impl ResourceHandler for GcpIntegration {
    fn type_name(&self) -> &'static str {
        "signalfx_gcp_integration"
    }

    fn api_path(&self) -> &'static str {
        INTEGRATION_API_PATH
    }

    fn schema(&self) -> Schema {
        integration_schema()
            .with_attribute(
                "poll_rate",
                Attribute::optional_int64()
                    .with_description("Polling interval in milliseconds"),
            )
            .with_attribute(
                "services",
                Attribute::optional_string_list()
                    .with_description("GCP service metric sets to ingest"),
            )
            .with_attribute(
                "synced",
                Attribute::optional_bool()
                    .with_default(json!(true))
                    .with_description("Client-side bookkeeping flag; never submitted"),
            )
            .with_attribute(
                "last_updated",
                Attribute::computed_float64()
                    .with_description("Latest timestamp the integration was updated"),
            )
            .with_block(
                "project_service_keys",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("project_id", Attribute::required_string())
                        .with_attribute(
                            "project_key",
                            Attribute::required_string().sensitive(),
                        ),
                ),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        check_poll_rate(config).into_iter().collect()
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = integration_payload(state, "GCP")?;
        copy_field(&mut payload, "pollRate", state, "poll_rate");
        copy_field(&mut payload, "services", state, "services");
        if let Some(keys) = state.get("project_service_keys").and_then(Value::as_array) {
            let mut entries = Vec::with_capacity(keys.len());
            for key in keys {
                let mut entry = Map::new();
                entry.insert(
                    "projectId".to_string(),
                    json!(require_str(key, "project_id")?),
                );
                entry.insert(
                    "projectKey".to_string(),
                    json!(require_str(key, "project_key")?),
                );
                entries.push(Value::Object(entry));
            }
            payload.insert("projectServiceKeys".to_string(), Value::Array(entries));
        }
        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = integration_state(response);
        copy_field(&mut decoded, "poll_rate", response, "pollRate");
        copy_field(&mut decoded, "services", response, "services");
        copy_field(&mut decoded, "last_updated", response, "lastUpdated");
        // projectServiceKeys come back with projectKey redacted; keep the
        // prior block untouched.
        Ok(merge_state(prior, decoded))
    }
}

/// `signalfx_webhook_integration`: POSTs alert events to an arbitrary URL.
pub struct WebhookIntegration;

impl ResourceHandler for WebhookIntegration {
    fn type_name(&self) -> &'static str {
        "signalfx_webhook_integration"
    }

    fn api_path(&self) -> &'static str {
        INTEGRATION_API_PATH
    }

    fn schema(&self) -> Schema {
        integration_schema()
            .with_attribute("url", Attribute::optional_string())
            .with_attribute(
                "shared_secret",
                Attribute::optional_string().sensitive(),
            )
            .with_block(
                "headers",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("header_key", Attribute::required_string())
                        .with_attribute("header_value", Attribute::required_string()),
                ),
            )
    }

    fn to_payload(&self, state: &Value) -> Result<Value, ProviderError> {
        let mut payload = integration_payload(state, "Webhook")?;
        copy_field(&mut payload, "url", state, "url");
        copy_field(&mut payload, "sharedSecret", state, "shared_secret");
        if let Some(headers) = state.get("headers").and_then(Value::as_array) {
            let mut entries = Vec::with_capacity(headers.len());
            for header in headers {
                let mut entry = Map::new();
                entry.insert(
                    "name".to_string(),
                    json!(require_str(header, "header_key")?),
                );
                entry.insert(
                    "value".to_string(),
                    json!(require_str(header, "header_value")?),
                );
                entries.push(Value::Object(entry));
            }
            payload.insert("headers".to_string(), Value::Array(entries));
        }
        Ok(Value::Object(payload))
    }

    fn from_api(&self, response: &Value, prior: &Value) -> Result<Value, ProviderError> {
        let mut decoded = integration_state(response);
        copy_field(&mut decoded, "url", response, "url");
        if let Some(headers) = response.get("headers").and_then(Value::as_array) {
            let entries: Vec<Value> = headers
                .iter()
                .map(|header| {
                    let mut entry = Map::new();
                    copy_field(&mut entry, "header_key", header, "name");
                    copy_field(&mut entry, "header_value", header, "value");
                    Value::Object(entry)
                })
                .collect();
            decoded.insert("headers".to_string(), Value::Array(entries));
        }
        Ok(merge_state(prior, decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagerduty_payload() {
        let state = json!({"name": "PD", "enabled": true, "api_key": "1234567890"});
        let payload = PagerDutyIntegration.to_payload(&state).unwrap();
        assert_eq!(payload["type"], "PagerDuty");
        assert_eq!(payload["enabled"], true);
        assert_eq!(payload["apiKey"], "1234567890");
    }

    #[test]
    fn test_pagerduty_api_key_survives_read() {
        let prior = json!({"id": "int-1", "name": "PD", "enabled": true, "api_key": "1234567890"});
        let response = json!({"id": "int-1", "name": "PD", "type": "PagerDuty", "enabled": true});
        let state = PagerDutyIntegration.from_api(&response, &prior).unwrap();
        assert_eq!(state["api_key"], "1234567890");
    }

    #[test]
    fn test_enabled_required() {
        let err = PagerDutyIntegration
            .to_payload(&json!({"name": "PD"}))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_slack_payload() {
        let state = json!({
            "name": "Slack",
            "enabled": false,
            "webhook_url": "https://hooks.example.com/abc"
        });
        let payload = SlackIntegration.to_payload(&state).unwrap();
        assert_eq!(payload["type"], "Slack");
        assert_eq!(payload["webhookUrl"], "https://hooks.example.com/abc");
    }

    #[test]
    fn test_gcp_payload() {
        let state = json!({
            "name": "GCP prod",
            "enabled": true,
            "poll_rate": 300000,
            "services": ["compute"],
            "project_service_keys": [
                {"project_id": "my-project", "project_key": "{\"type\":\"service_account\"}"}
            ]
        });
        let payload = GcpIntegration.to_payload(&state).unwrap();
        assert_eq!(payload["type"], "GCP");
        assert_eq!(payload["pollRate"], 300000);
        assert_eq!(payload["projectServiceKeys"][0]["projectId"], "my-project");
    }

    #[test]
    fn test_gcp_synced_not_submitted() {
        let state = json!({"name": "GCP", "enabled": true, "synced": true});
        let payload = GcpIntegration.to_payload(&state).unwrap();
        assert!(payload.get("synced").is_none());
    }

    #[test]
    fn test_gcp_last_updated_decoded_not_submitted() {
        let response = json!({
            "id": "int-2",
            "name": "GCP prod",
            "enabled": true,
            "lastUpdated": 1566184950000.0
        });
        let state = GcpIntegration.from_api(&response, &json!({})).unwrap();
        assert_eq!(state["last_updated"], 1566184950000.0);

        let payload = GcpIntegration.to_payload(&state).unwrap();
        assert!(payload.get("lastUpdated").is_none());
        assert!(payload.get("last_updated").is_none());
    }

    #[test]
    fn test_gcp_poll_rate_validated() {
        let bad = json!({"name": "GCP", "enabled": true, "poll_rate": 1234});
        let diagnostics = GcpIntegration.validate(&bad);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("poll_rate"));
    }

    #[test]
    fn test_gcp_project_keys_survive_read() {
        let prior = json!({
            "id": "int-2",
            "name": "GCP prod",
            "enabled": true,
            "project_service_keys": [{"project_id": "my-project", "project_key": "secret"}]
        });
        let response = json!({"id": "int-2", "name": "GCP prod", "enabled": true, "pollRate": 300000});
        let state = GcpIntegration.from_api(&response, &prior).unwrap();
        assert_eq!(
            state["project_service_keys"][0]["project_key"],
            "secret"
        );
        assert_eq!(state["poll_rate"], 300000);
    }

    #[test]
    fn test_webhook_payload_and_read() {
        let state = json!({
            "name": "Hook",
            "enabled": true,
            "url": "https://example.com/hook",
            "shared_secret": "s3cret",
            "headers": [{"header_key": "X-Env", "header_value": "prod"}]
        });
        let payload = WebhookIntegration.to_payload(&state).unwrap();
        assert_eq!(payload["type"], "Webhook");
        assert_eq!(payload["sharedSecret"], "s3cret");
        assert_eq!(payload["headers"][0]["name"], "X-Env");

        let response = json!({
            "id": "int-3",
            "name": "Hook",
            "enabled": true,
            "url": "https://example.com/hook",
            "headers": [{"name": "X-Env", "value": "prod"}]
        });
        let decoded = WebhookIntegration.from_api(&response, &state).unwrap();
        assert_eq!(decoded["shared_secret"], "s3cret");
        assert_eq!(decoded["headers"][0]["header_key"], "X-Env");
    }
}
