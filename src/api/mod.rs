pub mod command;

pub use self::command::{Command, CommandError};

use crate::config::ApiConfig;
use crate::engine::{RequestEvent, RuleEnforcer, TabId, TrackerEngine};
use crate::observer::ObserverEvent;
use crate::stats::StatsCollector;
use axum::{
    extract::{Json as AxumJson, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

struct ApiState {
    engine: Arc<TrackerEngine>,
    stats: Arc<StatsCollector>,
    enforcer: Arc<dyn RuleEnforcer>,
    events: Sender<ObserverEvent>,
}

pub async fn start_api_server(
    engine: Arc<TrackerEngine>,
    stats: Arc<StatsCollector>,
    enforcer: Arc<dyn RuleEnforcer>,
    events: Sender<ObserverEvent>,
    config: ApiConfig,
) {
    let state = Arc::new(ApiState {
        engine,
        stats,
        enforcer,
        events,
    });

    let app = Router::new()
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/lists", post(mutate_list))
        .route("/api/stats", get(get_stats))
        .route("/api/rules", get(get_rules))
        .route("/api/request", post(post_request))
        .route("/api/tab-closed", post(post_tab_closed))
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("API Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr.as_str()).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

#[derive(Deserialize)]
struct SnapshotQuery {
    tab: Option<TabId>,
}

async fn get_snapshot(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SnapshotQuery>,
) -> impl IntoResponse {
    Json(state.engine.snapshot(query.tab))
}

#[derive(Deserialize)]
struct MutatePayload {
    list: String,
    op: String,
    domain: String,
}

async fn mutate_list(
    State(state): State<Arc<ApiState>>,
    AxumJson(payload): AxumJson<MutatePayload>,
) -> impl IntoResponse {
    match Command::from_parts(&payload.list, &payload.op, &payload.domain) {
        Ok(cmd) => {
            // The engine syncs enforcement before returning, so "ok" means
            // the rule set already reflects the change.
            let changed = cmd.apply(&state.engine).await;
            Json(serde_json::json!({ "status": "ok", "changed": changed })).into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn get_stats(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.stats.get_snapshot())
}

async fn get_rules(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.enforcer.active_rules().await {
        Ok(mut ids) => {
            ids.sort_unstable();
            Json(serde_json::json!({ "active_rule_ids": ids })).into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct RequestPayload {
    target_url: String,
    initiator_url: String,
    tab_id: Option<TabId>,
}

async fn post_request(
    State(state): State<Arc<ApiState>>,
    AxumJson(payload): AxumJson<RequestPayload>,
) -> impl IntoResponse {
    let event = ObserverEvent::Request(RequestEvent {
        target_url: payload.target_url,
        initiator_url: payload.initiator_url,
        tab: payload.tab_id,
    });
    match state.events.send(event).await {
        Ok(()) => Json(serde_json::json!({ "status": "accepted" })).into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "observer stopped" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct TabClosedPayload {
    tab_id: TabId,
}

async fn post_tab_closed(
    State(state): State<Arc<ApiState>>,
    AxumJson(payload): AxumJson<TabClosedPayload>,
) -> impl IntoResponse {
    match state.events.send(ObserverEvent::TabClosed(payload.tab_id)).await {
        Ok(()) => Json(serde_json::json!({ "status": "accepted" })).into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "observer stopped" })),
        )
            .into_response(),
    }
}
