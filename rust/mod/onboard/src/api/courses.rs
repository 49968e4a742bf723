use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use hexaboard_core::ServiceError;
use hexaboard_identity::Claims;

use crate::api::{AppState, require_admin, require_self_or_admin};
use crate::model::{AssignTarget, CourseDraft};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/freshers/{id}/courses",
            get(list_courses).post(assign_course),
        )
        .route("/freshers/{id}/courses/{course_id}", delete(delete_course))
        .route("/freshers/{id}/courses/{course_id}/progress", put(advance))
        .route("/freshers/{id}/courses/{course_id}/finish", post(finish))
}

async fn list_courses(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let courses = svc.courses_for_fresher(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": courses})))
}

async fn assign_course(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(draft): Json<CourseDraft>,
) -> Result<(axum::http::StatusCode, Json<crate::model::AssignOutcome>), ServiceError> {
    require_admin(&claims)?;
    let outcome = svc
        .assign_course(&draft, &AssignTarget::Individual { fresher_id: id })
        .map_err(ServiceError::from)?;
    Ok((axum::http::StatusCode::CREATED, Json(outcome)))
}

async fn delete_course(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, course_id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ServiceError> {
    require_admin(&claims)?;
    svc.delete_course(&id, &course_id).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceBody {
    new_index: usize,
}

async fn advance(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, course_id)): Path<(String, String)>,
    Json(body): Json<AdvanceBody>,
) -> Result<Json<crate::service::progress::ProgressState>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let state = svc
        .advance_lecture(&id, &course_id, body.new_index)
        .map_err(ServiceError::from)?;
    Ok(Json(state))
}

async fn finish(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, course_id)): Path<(String, String)>,
) -> Result<Json<crate::service::progress::ProgressState>, ServiceError> {
    require_self_or_admin(&claims, &id)?;
    let state = svc
        .finish_course(&id, &course_id)
        .map_err(ServiceError::from)?;
    Ok(Json(state))
}
