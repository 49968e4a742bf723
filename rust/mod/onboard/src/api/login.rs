use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use hexaboard_core::ServiceError;
use hexaboard_identity::Claims;

use crate::api::{AppState, require_admin};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/login-logs", get(login_logs))
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

/// Best-effort client address for the audit log.
fn client_ip(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn login(
    State(svc): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<LoginBody>,
) -> Result<Json<crate::model::LoginResponse>, ServiceError> {
    let ip = client_ip(&headers);
    let response = svc
        .login(&body.email, &body.password, &ip)
        .map_err(ServiceError::from)?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct LogParams {
    #[serde(default = "default_log_limit")]
    limit: usize,
}

fn default_log_limit() -> usize {
    100
}

async fn login_logs(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<LogParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let logs = svc.login_logs(params.limit).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": logs})))
}
