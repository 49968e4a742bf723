use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use hexaboard_core::{ListParams, ServiceError};
use hexaboard_identity::Claims;

use crate::api::{AppState, require_admin, require_self_or_admin};
use crate::model::NewFresher;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/freshers", get(list_freshers).post(create_fresher))
        .route("/freshers/bulk", post(bulk_import))
        .route("/freshers/{id}", get(get_fresher).delete(delete_fresher))
        .route("/freshers/{id}/reset-progress", post(reset_progress))
        .route("/freshers/{id}/assignments", get(get_assignments))
}

async fn list_freshers(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let result = svc.list_freshers(&params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

async fn create_fresher(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<NewFresher>,
) -> Result<(axum::http::StatusCode, Json<crate::model::Provisioned>), ServiceError> {
    require_admin(&claims)?;
    let provisioned = svc.provision_fresher(input).map_err(ServiceError::from)?;
    Ok((axum::http::StatusCode::CREATED, Json(provisioned)))
}

/// Bulk CSV import. The body is the raw CSV text; every row is
/// attempted and reported independently, never all-or-nothing.
async fn bulk_import(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: String,
) -> Result<Json<crate::model::CsvImportReport>, ServiceError> {
    require_admin(&claims)?;
    let report = svc.import_freshers_csv(&body).map_err(ServiceError::from)?;
    Ok(Json(report))
}

async fn get_fresher(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<crate::model::Fresher>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let fresher = svc.get_fresher(&id).map_err(ServiceError::from)?;
    Ok(Json(fresher))
}

async fn delete_fresher(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    require_admin(&claims)?;
    svc.delete_fresher(&id).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn reset_progress(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let reset = svc.reset_progress(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"resetCourses": reset})))
}

async fn get_assignments(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let tasks = svc.tasks_for_fresher(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": tasks})))
}
