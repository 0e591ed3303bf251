//! HTTP surface: health and version probes, the slash command endpoint,
//! and the Events API dispatch endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tracing::warn;

use crate::infrastructure::slack::SlackContext;
use crate::services::{CommandHandler, EventQueue};

/// Shared handler state for the HTTP routes.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<CommandHandler>,
    pub events: Arc<EventQueue>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status/health", get(health))
        .route("/api/status/version", get(version))
        .route("/api/command/haiku", post(command_haiku))
        .route("/api/event/dispatch", post(event_dispatch))
        .with_state(state)
}

async fn health() -> &'static str {
    ""
}

async fn version() -> Json<Value> {
    Json(json!({ "version": crate::VERSION }))
}

/// Slack slash command endpoint. Slack sends form-encoded payloads and
/// expects the response JSON within its timeout, so all work here is
/// synchronous with the request.
async fn command_haiku(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    // Slack periodically probes slash command URLs with ssl_check=1.
    if form.get("ssl_check").is_some_and(|v| !v.is_empty()) {
        return ().into_response();
    }

    let context = match (form.get("user_id"), form.get("channel_id"), form.get("team_id")) {
        (Some(user_id), Some(channel_id), Some(team_id)) => {
            SlackContext::new(user_id.as_str(), channel_id.as_str(), team_id.as_str())
        }
        _ => {
            warn!("failed to handle haiku slash command: missing context fields");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let command = form.get("command").map_or("", String::as_str);
    let text = form.get("text").map_or("", String::as_str).trim();

    let response = state.handler.handle(command, text, &context).await;
    Json(response.to_json()).into_response()
}

/// Slack Events API endpoint. Challenge requests are answered inline;
/// event callbacks are acknowledged immediately and handled by the worker
/// pool, which posts any response back through the Web API.
async fn event_dispatch(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    match payload.get("type").and_then(Value::as_str) {
        Some("url_verification") => payload
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
            .into_response(),
        Some("event_callback") => {
            state.events.enqueue(payload);
            ().into_response()
        }
        other => {
            warn!("received unknown Slack event type: {other:?}");
            ().into_response()
        }
    }
}
