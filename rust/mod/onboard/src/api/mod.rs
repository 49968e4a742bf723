mod chat;
mod courses;
mod departments;
mod freshers;
mod login;
mod middleware;
mod stats;

use std::sync::Arc;

use axum::Router;

use hexaboard_core::ServiceError;
use hexaboard_identity::Claims;

use crate::service::OnboardService;

/// Shared application state.
pub type AppState = Arc<OnboardService>;

/// Build the complete onboard API router.
///
/// All routes are relative; the caller nests them under `/onboard`.
pub fn build_router(svc: Arc<OnboardService>) -> Router {
    let api = Router::new()
        .merge(login::routes())
        .merge(freshers::routes())
        .merge(departments::routes())
        .merge(courses::routes())
        .merge(stats::routes())
        .merge(chat::routes());

    Router::new()
        .nest("/onboard", api)
        .layer(axum::middleware::from_fn_with_state(
            svc.clone(),
            middleware::auth_middleware,
        ))
        .with_state(svc)
}

/// Reject callers without the administrative role claim.
pub(crate) fn require_admin(claims: &Claims) -> Result<(), ServiceError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied(
            "admin role required".to_string(),
        ))
    }
}

/// Allow the subject themselves, or an admin.
pub(crate) fn require_self_or_admin(claims: &Claims, id: &str) -> Result<(), ServiceError> {
    if claims.is_admin() || claims.sub == id {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied(
            "not allowed to access another fresher's resources".to_string(),
        ))
    }
}
