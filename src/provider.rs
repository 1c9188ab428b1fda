//! The SignalFx provider: schema, lifecycle, and resource CRUD.
//!
//! [`ProviderService`] is the contract a provider exposes to whatever
//! drives it (a plugin host, the test harness). [`SignalFxProvider`] is
//! the implementation: it registers every resource handler and runs their
//! payload translations through one HTTP client. CRUD is uniform across
//! resource types: create POSTs the handler's collection path, read,
//! update and delete address `{path}/{id}`.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::client::SignalFxClient;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::resource::{all_handlers, ResourceHandler};
use crate::schema::{Attribute, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema};
use crate::types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
use crate::validation::{apply_defaults, validate};

/// Trait a provider implementation exposes.
///
/// Uses plain Rust types end to end; wire encoding is the host's concern.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// The provider's schema, including every resource type.
    fn schema(&self) -> ProviderSchema;

    /// Provider metadata. Derived from the schema by default.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        resources.sort();
        ProviderMetadata { resources }
    }

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    async fn read(&self, resource_type: &str, current_state: Value)
        -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value)
        -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "import not supported for resource type: {}",
            resource_type
        )))
    }
}

/// Schema of the provider configuration block.
fn provider_config_schema() -> Schema {
    Schema::v0()
        .with_attribute(
            "auth_token",
            Attribute::optional_string()
                .sensitive()
                .with_description("SignalFx auth token; falls back to SFX_AUTH_TOKEN"),
        )
        .with_attribute(
            "api_url",
            Attribute::optional_string()
                .with_description("API base URL; falls back to SFX_API_URL"),
        )
}

/// The SignalFx provider.
pub struct SignalFxProvider {
    handlers: HashMap<&'static str, Box<dyn ResourceHandler>>,
    client: RwLock<Option<Arc<SignalFxClient>>>,
}

impl SignalFxProvider {
    /// Create a provider with every resource handler registered.
    pub fn new() -> Self {
        let handlers = all_handlers()
            .into_iter()
            .map(|h| (h.type_name(), h))
            .collect();
        Self {
            handlers,
            client: RwLock::new(None),
        }
    }

    fn handler(&self, resource_type: &str) -> Result<&dyn ResourceHandler, ProviderError> {
        self.handlers
            .get(resource_type)
            .map(|h| h.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn client(&self) -> Result<Arc<SignalFxClient>, ProviderError> {
        let guard = self
            .client
            .read()
            .map_err(|_| ProviderError::Configuration("client lock poisoned".to_string()))?;
        guard
            .clone()
            .ok_or_else(|| ProviderError::Configuration("provider is not configured".to_string()))
    }

    fn set_client(&self, client: SignalFxClient) -> Result<(), ProviderError> {
        let mut guard = self
            .client
            .write()
            .map_err(|_| ProviderError::Configuration("client lock poisoned".to_string()))?;
        *guard = Some(Arc::new(client));
        Ok(())
    }

    /// The `{path}/{id}` address of an existing resource.
    fn instance_path(
        handler: &dyn ResourceHandler,
        state: &Value,
    ) -> Result<String, ProviderError> {
        let id = state.get("id").and_then(Value::as_str).ok_or_else(|| {
            ProviderError::Validation(format!(
                "{} state has no id; resource was never created",
                handler.type_name()
            ))
        })?;
        Ok(format!("{}/{}", handler.api_path(), id))
    }

    /// Diff prior against planned state attribute by attribute.
    fn diff(
        schema: &Schema,
        prior: &Value,
        planned: &Value,
    ) -> (Vec<AttributeChange>, bool) {
        let empty = serde_json::Map::new();
        let before = prior.as_object().unwrap_or(&empty);
        let after = planned.as_object().unwrap_or(&empty);

        let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
        let mut changes = Vec::new();
        let mut requires_replace = false;
        for key in keys {
            let old = before.get(key.as_str());
            let new = after.get(key.as_str());
            if old == new {
                continue;
            }
            if schema
                .block
                .attributes
                .get(key.as_str())
                .is_some_and(|attr| attr.force_new)
            {
                requires_replace = true;
            }
            changes.push(AttributeChange::new(
                key.clone(),
                old.cloned(),
                new.cloned(),
            ));
        }
        (changes, requires_replace)
    }
}

impl Default for SignalFxProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for SignalFxProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(provider_config_schema());
        for (name, handler) in &self.handlers {
            schema = schema.with_resource(*name, handler.schema());
        }
        schema
    }

    #[instrument(skip(self, config))]
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resolved = ProviderConfig::from_value(&config);
        match resolved.validate() {
            Ok(()) => Ok(vec![]),
            Err(e) => Ok(vec![Diagnostic::error(e.to_string())]),
        }
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let resolved = ProviderConfig::from_value(&config);
        match SignalFxClient::new(&resolved) {
            Ok(client) => {
                self.set_client(client)?;
                info!(api_url = %resolved.api_url, "provider configured");
                Ok(vec![])
            }
            Err(e) => Ok(vec![Diagnostic::error(e.to_string())]),
        }
    }

    #[instrument(skip(self, config))]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let handler = self.handler(resource_type)?;
        let mut diagnostics = validate(&handler.schema(), &config);
        diagnostics.extend(handler.validate(&config));
        debug!(
            resource_type,
            diagnostics = diagnostics.len(),
            "resource config validated"
        );
        Ok(diagnostics)
    }

    #[instrument(skip(self, prior_state, proposed_state, config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let handler = self.handler(resource_type)?;
        let schema = handler.schema();
        let _ = config;

        // Destroy: proposed state is null.
        if proposed_state.is_null() {
            let prior = prior_state.unwrap_or(Value::Null);
            let (changes, _) = Self::diff(&schema, &prior, &Value::Null);
            return Ok(PlanResult::with_changes(Value::Null, changes, false));
        }

        let mut planned = apply_defaults(&schema, &proposed_state);

        let Some(prior) = prior_state.filter(|p| !p.is_null()) else {
            // Create: every configured attribute is an addition.
            let (changes, _) = Self::diff(&schema, &Value::Null, &planned);
            return Ok(PlanResult::with_changes(planned, changes, false));
        };

        // Computed attributes the user cannot set carry over from prior
        // state so they do not show up as spurious removals.
        if let (Some(planned_map), Some(prior_map)) = (planned.as_object().cloned(), prior.as_object()) {
            let mut merged = planned_map;
            for (name, attr) in &schema.block.attributes {
                if attr.flags.computed && !merged.contains_key(name) {
                    if let Some(value) = prior_map.get(name) {
                        merged.insert(name.clone(), value.clone());
                    }
                }
            }
            planned = Value::Object(merged);
        }

        let (changes, requires_replace) = Self::diff(&schema, &prior, &planned);
        info!(
            resource_type,
            changes = changes.len(),
            requires_replace,
            "plan computed"
        );
        if changes.is_empty() {
            return Ok(PlanResult::no_change(planned));
        }
        Ok(PlanResult::with_changes(planned, changes, requires_replace))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let handler = self.handler(resource_type)?;
        let diagnostics = handler.validate(&planned_state);
        if let Some(diag) = diagnostics
            .iter()
            .find(|d| d.severity == DiagnosticSeverity::Error)
        {
            return Err(ProviderError::Validation(diag.summary.clone()));
        }
        let payload = handler.to_payload(&planned_state)?;
        let response = self.client()?.post_json(handler.api_path(), &payload).await?;
        let state = handler.from_api(&response, &planned_state)?;
        info!(resource_type, id = state.get("id").and_then(|v| v.as_str()), "resource created");
        Ok(state)
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let handler = self.handler(resource_type)?;
        let path = Self::instance_path(handler, &current_state)?;
        let response = self.client()?.get_json(&path).await?;
        handler.from_api(&response, &current_state)
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let handler = self.handler(resource_type)?;
        let diagnostics = handler.validate(&planned_state);
        if let Some(diag) = diagnostics
            .iter()
            .find(|d| d.severity == DiagnosticSeverity::Error)
        {
            return Err(ProviderError::Validation(diag.summary.clone()));
        }
        let path = Self::instance_path(handler, &prior_state)?;
        let payload = handler.to_payload(&planned_state)?;
        let response = self.client()?.put_json(&path, &payload).await?;
        let state = handler.from_api(&response, &planned_state)?;
        info!(resource_type, "resource updated");
        Ok(state)
    }

    #[instrument(skip(self, current_state))]
    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let handler = self.handler(resource_type)?;
        let path = Self::instance_path(handler, &current_state)?;
        self.client()?.delete(&path).await?;
        info!(resource_type, "resource deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let handler = self.handler(resource_type)?;
        let path = format!("{}/{}", handler.api_path(), id);
        let response = self.client()?.get_json(&path).await?;
        let state = handler.from_api(&response, &Value::Object(Default::default()))?;
        info!(resource_type, id, "resource imported");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_covers_all_resources() {
        let provider = SignalFxProvider::new();
        let schema = provider.schema();
        assert!(schema.resources.contains_key("signalfx_time_chart"));
        assert!(schema.resources.contains_key("signalfx_detector"));
        assert!(schema.resources.contains_key("signalfx_team"));
        assert!(schema.resources.contains_key("signalfx_gcp_integration"));
        assert!(schema
            .provider
            .block
            .attributes
            .get("auth_token")
            .is_some_and(|a| a.flags.sensitive));
    }

    #[test]
    fn test_metadata_sorted() {
        let provider = SignalFxProvider::new();
        let metadata = provider.metadata();
        let mut sorted = metadata.resources.clone();
        sorted.sort();
        assert_eq!(metadata.resources, sorted);
        assert_eq!(metadata.resources.len(), 13);
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = SignalFxProvider::new();
        let err = provider
            .validate_resource_config("signalfx_unicorn", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_crud_requires_configure() {
        let provider = SignalFxProvider::new();
        let err = provider
            .read("signalfx_team", json!({"id": "team-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_validate_provider_config_missing_token() {
        let provider = SignalFxProvider::new();
        // Explicit empty token keeps the env fallback out of the picture.
        let diagnostics = provider
            .validate_provider_config(json!({"auth_token": "", "api_url": "ftp://nope"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
    }

    #[tokio::test]
    async fn test_plan_create_lists_additions() {
        let provider = SignalFxProvider::new();
        let proposed = json!({
            "name": "Runbook",
            "markdown": "# hello"
        });
        let plan = provider
            .plan("signalfx_text_chart", None, proposed, Value::Null)
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.before.is_none()));
    }

    #[tokio::test]
    async fn test_plan_update_detects_modification() {
        let provider = SignalFxProvider::new();
        let prior = json!({"id": "chart-1", "name": "old", "markdown": "# a"});
        let proposed = json!({"name": "new", "markdown": "# a"});
        let plan = provider
            .plan("signalfx_text_chart", Some(prior), proposed, Value::Null)
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "name");
        // id is computed and carries over.
        assert_eq!(plan.planned_state["id"], "chart-1");
    }

    #[tokio::test]
    async fn test_plan_no_change() {
        let provider = SignalFxProvider::new();
        let prior = json!({"id": "chart-1", "name": "same", "markdown": "# a"});
        let proposed = json!({"name": "same", "markdown": "# a"});
        let plan = provider
            .plan("signalfx_text_chart", Some(prior), proposed, Value::Null)
            .await
            .unwrap();
        assert!(plan.changes.is_empty());
        assert!(!plan.requires_replace);
    }

    #[tokio::test]
    async fn test_plan_force_new_requires_replace() {
        let provider = SignalFxProvider::new();
        let prior = json!({"id": "dash-1", "name": "d", "dashboard_group": "group-1"});
        let proposed = json!({"name": "d", "dashboard_group": "group-2"});
        let plan = provider
            .plan("signalfx_dashboard", Some(prior), proposed, Value::Null)
            .await
            .unwrap();
        assert!(plan.requires_replace);
    }

    #[tokio::test]
    async fn test_plan_destroy() {
        let provider = SignalFxProvider::new();
        let prior = json!({"id": "chart-1", "name": "x", "markdown": "# a"});
        let plan = provider
            .plan("signalfx_text_chart", Some(prior), Value::Null, Value::Null)
            .await
            .unwrap();
        assert!(plan.planned_state.is_null());
        assert_eq!(plan.changes.len(), 3);
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
    }

    #[tokio::test]
    async fn test_plan_applies_defaults() {
        let provider = SignalFxProvider::new();
        let proposed = json!({
            "name": "CPU",
            "program_text": "data('cpu.total.idle').publish()"
        });
        let plan = provider
            .plan("signalfx_time_chart", None, proposed, Value::Null)
            .await
            .unwrap();
        assert_eq!(plan.planned_state["plot_type"], "LineChart");
    }
}
