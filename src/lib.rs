//! Provider for managing SignalFx resources as declarative configuration.
//!
//! The provider turns resource configuration (charts, dashboards,
//! detectors, teams, integrations) into calls against the SignalFx REST
//! API. Each resource type is a [`resource::ResourceHandler`]: a schema,
//! field validators, and the two payload translations (state to API
//! request, API response to state). Everything else is generic:
//! [`SignalFxProvider`] validates configuration, plans attribute-level
//! diffs, and runs CRUD through one HTTP client.
//!
//! # Quick Start
//!
//! ```ignore
//! use signalfx_provider::{ProviderService, SignalFxProvider};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = SignalFxProvider::new();
//! provider.configure(json!({"auth_token": "abc123"})).await?;
//!
//! let state = provider
//!     .create(
//!         "signalfx_text_chart",
//!         json!({"name": "Runbook", "markdown": "# On call"}),
//!     )
//!     .await?;
//! println!("created chart {}", state["id"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! The provider needs an auth token and (optionally) an API base URL,
//! from the configuration block or the `SFX_AUTH_TOKEN` / `SFX_API_URL`
//! environment variables. See [`config`].
//!
//! # Resource Types
//!
//! Five chart types (`signalfx_time_chart`, `signalfx_list_chart`,
//! `signalfx_single_value_chart`, `signalfx_heatmap_chart`,
//! `signalfx_text_chart`), `signalfx_dashboard`,
//! `signalfx_dashboard_group`, `signalfx_detector`, `signalfx_team`, and
//! four integrations (PagerDuty, Slack, GCP, Webhook).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::SignalFxClient;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, try_init_logging};
pub use provider::{ProviderService, SignalFxProvider};
pub use resource::ResourceHandler;
pub use schema::{Diagnostic, ProviderSchema};
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for downstream ProviderService implementations
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
