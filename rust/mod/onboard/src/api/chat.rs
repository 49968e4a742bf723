use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use hexaboard_core::ServiceError;
use hexaboard_identity::Claims;

use crate::api::{AppState, require_self_or_admin};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/freshers/{id}/chat", post(send_message))
        .route("/freshers/{id}/chat/history", get(history))
        .route("/freshers/{id}/chat/analytics", get(analytics))
        .route("/freshers/{id}/chat/tips", get(tips))
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    text: String,
}

async fn send_message(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(body): Json<ChatBody>,
) -> Result<Json<crate::model::ChatMessage>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let reply = svc
        .chat_reply(&id, &body.text)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    50
}

async fn history(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let messages = svc
        .chat_history(&id, params.limit)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": messages})))
}

async fn analytics(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<crate::model::ChatAnalytics>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let analytics = svc.chat_analytics(&id).map_err(ServiceError::from)?;
    Ok(Json(analytics))
}

async fn tips(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let tips = svc.learning_tips(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": tips})))
}
