use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};

use hexaboard_core::{ListParams, ServiceError};
use hexaboard_identity::Claims;

use crate::api::{AppState, require_admin};
use crate::model::{AssignTarget, CourseDraft, CreateDepartment};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route("/departments/auto-assign", post(auto_assign))
        .route("/departments/{id}/freshers", get(department_freshers))
        .route("/departments/{id}/courses", post(assign_course_to_department))
        .route(
            "/departments/{id}/members/{fresher_id}",
            delete(remove_member),
        )
}

async fn list_departments(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let result = svc.list_departments(&params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

async fn create_department(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<CreateDepartment>,
) -> Result<(axum::http::StatusCode, Json<crate::model::Department>), ServiceError> {
    require_admin(&claims)?;
    let department = svc.create_department(input).map_err(ServiceError::from)?;
    Ok((axum::http::StatusCode::CREATED, Json(department)))
}

async fn auto_assign(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let assigned = svc.auto_assign_freshers().map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"assignedCount": assigned})))
}

async fn department_freshers(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&claims)?;
    let members = svc.department_members(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": members})))
}

async fn assign_course_to_department(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(draft): Json<CourseDraft>,
) -> Result<(axum::http::StatusCode, Json<crate::model::AssignOutcome>), ServiceError> {
    require_admin(&claims)?;
    let outcome = svc
        .assign_course(&draft, &AssignTarget::Department { department_id: id })
        .map_err(ServiceError::from)?;
    Ok((axum::http::StatusCode::CREATED, Json(outcome)))
}

async fn remove_member(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, fresher_id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ServiceError> {
    require_admin(&claims)?;
    svc.remove_member(&fresher_id, &id).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
