//! End-to-end provider tests against an in-process mock of the SignalFx
//! API.
//!
//! The mock speaks just enough of the API surface for the provider: POST
//! to a collection assigns an id and stores the body, GET/PUT/DELETE
//! address `{collection}/{id}`, and every request must carry the
//! `X-SF-TOKEN` header.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use signalfx_provider::testing::{
    assert_plan_creates, assert_plan_no_changes, assert_plan_replaces, ProviderTester,
};
use signalfx_provider::{ProviderError, SignalFxProvider};

const TEST_TOKEN: &str = "test-token";

#[derive(Clone, Default)]
struct MockApi {
    resources: Arc<RwLock<HashMap<String, Value>>>,
    next_id: Arc<AtomicUsize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("X-SF-TOKEN")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| token == TEST_TOKEN)
}

fn app() -> Router {
    let api = MockApi::default();
    Router::new()
        .route("/v2/{collection}", post(create_resource))
        .route(
            "/v2/{collection}/{id}",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .with_state(api)
}

async fn create_resource(
    State(api): State<MockApi>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let id = format!("{}-{}", collection, api.next_id.fetch_add(1, Ordering::SeqCst));
    let mut stored = body;
    stored["id"] = json!(id.clone());
    api.resources
        .write()
        .await
        .insert(format!("{}/{}", collection, id), stored.clone());
    Ok(Json(stored))
}

async fn get_resource(
    State(api): State<MockApi>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    api.resources
        .read()
        .await
        .get(&format!("{}/{}", collection, id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_resource(
    State(api): State<MockApi>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let key = format!("{}/{}", collection, id);
    let mut resources = api.resources.write().await;
    if !resources.contains_key(&key) {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut stored = body;
    stored["id"] = json!(id);
    resources.insert(key, stored.clone());
    Ok(Json(stored))
}

async fn delete_resource(
    State(api): State<MockApi>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    api.resources
        .write()
        .await
        .remove(&format!("{}/{}", collection, id))
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Start the mock API on an ephemeral port and return its base URL.
async fn spawn_mock_api() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn configured_tester() -> ProviderTester<SignalFxProvider> {
    let base_url = spawn_mock_api().await;
    let tester = ProviderTester::new(SignalFxProvider::new());
    tester
        .configure(json!({"auth_token": TEST_TOKEN, "api_url": base_url}))
        .await
        .unwrap();
    tester
}

#[tokio::test]
async fn text_chart_full_crud() {
    let tester = configured_tester().await;

    let created = tester
        .lifecycle_create(
            "signalfx_text_chart",
            json!({"name": "Runbook", "markdown": "# On call"}),
        )
        .await
        .unwrap();
    assert_eq!(created["name"], "Runbook");
    assert_eq!(created["markdown"], "# On call");
    let id = created["id"].as_str().unwrap().to_string();

    let updated = tester
        .lifecycle_update(
            "signalfx_text_chart",
            created,
            json!({"name": "Runbook", "markdown": "# On call\nUpdated."}),
        )
        .await
        .unwrap();
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["markdown"], "# On call\nUpdated.");

    tester
        .lifecycle_delete("signalfx_text_chart", updated.clone())
        .await
        .unwrap();

    let err = tester
        .read("signalfx_text_chart", updated)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn time_chart_applies_plot_type_default() {
    let tester = configured_tester().await;
    let state = tester
        .lifecycle_create(
            "signalfx_time_chart",
            json!({
                "name": "CPU",
                "program_text": "data('cpu.total.idle').publish()",
                "time_range": "-15m"
            }),
        )
        .await
        .unwrap();
    assert_eq!(state["plot_type"], "LineChart");
    assert_eq!(state["time_range"], "-15m");
    assert!(state["id"].is_string());
}

#[tokio::test]
async fn detector_rules_round_trip() {
    let tester = configured_tester().await;
    let config = json!({
        "name": "CPU detector",
        "program_text": "detect(when(data('cpu') > 90)).publish('cpu high')",
        "rule": [{
            "detect_label": "cpu high",
            "severity": "Critical",
            "notifications": ["Email,ops@example.com", "Slack,cred1,alerts"]
        }]
    });

    let state = tester
        .lifecycle_create("signalfx_detector", config)
        .await
        .unwrap();
    assert_eq!(state["rule"][0]["severity"], "Critical");
    assert_eq!(
        state["rule"][0]["notifications"],
        json!(["Email,ops@example.com", "Slack,cred1,alerts"])
    );
}

#[tokio::test]
async fn gcp_integration_keeps_service_keys() {
    let tester = configured_tester().await;
    let state = tester
        .lifecycle_create(
            "signalfx_gcp_integration",
            json!({
                "name": "GCP prod",
                "enabled": true,
                "poll_rate": 300000,
                "project_service_keys": [
                    {"project_id": "my-project", "project_key": "service-account-json"}
                ]
            }),
        )
        .await
        .unwrap();
    // The key never leaves the prior state even though the mock echoes
    // only what the handler submits back under camelCase names.
    assert_eq!(
        state["project_service_keys"][0]["project_key"],
        "service-account-json"
    );
    assert_eq!(state["poll_rate"], 300000);
}

#[tokio::test]
async fn dashboard_group_and_dashboard() {
    let tester = configured_tester().await;

    let group = tester
        .lifecycle_create(
            "signalfx_dashboard_group",
            json!({"name": "Production", "description": "Prod dashboards"}),
        )
        .await
        .unwrap();
    let group_id = group["id"].as_str().unwrap().to_string();

    let dashboard = tester
        .lifecycle_create(
            "signalfx_dashboard",
            json!({
                "name": "Service overview",
                "dashboard_group": group_id,
                "chart": [{"chart_id": "chart-1", "row": 0, "column": 0, "width": 6, "height": 1}]
            }),
        )
        .await
        .unwrap();
    assert_eq!(dashboard["dashboard_group"], group["id"]);
    assert_eq!(dashboard["chart"][0]["chart_id"], "chart-1");

    // Moving a dashboard to another group is a replacement.
    let plan = tester
        .plan_update(
            "signalfx_dashboard",
            dashboard.clone(),
            json!({
                "name": "Service overview",
                "dashboard_group": "another-group",
                "chart": dashboard["chart"].clone()
            }),
        )
        .await
        .unwrap();
    assert_plan_replaces(&plan);
}

#[tokio::test]
async fn team_import_by_id() {
    let tester = configured_tester().await;
    let created = tester
        .lifecycle_create(
            "signalfx_team",
            json!({
                "name": "On call",
                "members": ["user-1"],
                "notifications_critical": ["PagerDuty,cred1"]
            }),
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let imported = tester
        .import_resource("signalfx_team", id)
        .await
        .unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].resource_type, "signalfx_team");
    assert_eq!(imported[0].state["id"], created["id"]);
    assert_eq!(imported[0].state["name"], "On call");
    assert_eq!(
        imported[0].state["notifications_critical"],
        json!(["PagerDuty,cred1"])
    );
}

#[tokio::test]
async fn plan_before_and_after_apply() {
    let tester = configured_tester().await;
    let config = json!({"name": "note", "markdown": "# hi"});

    let plan = tester
        .plan_create("signalfx_text_chart", config.clone())
        .await
        .unwrap();
    assert_plan_creates(&plan);

    let state = tester
        .create("signalfx_text_chart", plan.planned_state)
        .await
        .unwrap();

    // Re-planning the same config against the fresh state is a no-op.
    let plan = tester
        .plan_update("signalfx_text_chart", state, config)
        .await
        .unwrap();
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn create_rejects_invalid_field_values() {
    let tester = configured_tester().await;
    let err = tester
        .create(
            "signalfx_heatmap_chart",
            json!({
                "name": "heat",
                "program_text": "data('cpu').publish()",
                "color_range": {"color": "taupe"}
            }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation(_)));
}

#[tokio::test]
async fn bad_token_is_permission_denied() {
    let base_url = spawn_mock_api().await;
    let tester = ProviderTester::new(SignalFxProvider::new());
    tester
        .configure(json!({"auth_token": "wrong-token", "api_url": base_url}))
        .await
        .unwrap();

    let err = tester
        .create(
            "signalfx_text_chart",
            json!({"name": "note", "markdown": "# hi"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::PermissionDenied(_)));
}

#[tokio::test]
async fn slack_integration_crud() {
    let tester = configured_tester().await;
    let updated = tester
        .lifecycle_crud(
            "signalfx_slack_integration",
            json!({
                "name": "Slack alerts",
                "enabled": true,
                "webhook_url": "https://hooks.example.com/abc"
            }),
            json!({
                "name": "Slack alerts",
                "enabled": false,
                "webhook_url": "https://hooks.example.com/abc"
            }),
        )
        .await
        .unwrap();
    assert_eq!(updated["enabled"], false);
    // webhook_url is write-only on the API side; the provider keeps it.
    assert_eq!(updated["webhook_url"], "https://hooks.example.com/abc");
}
