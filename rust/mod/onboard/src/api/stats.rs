use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};

use hexaboard_core::ServiceError;
use hexaboard_identity::Claims;

use crate::api::{AppState, require_admin};

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats/counts", get(counts))
}

async fn counts(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<crate::service::stats::Counts>, ServiceError> {
    require_admin(&claims)?;
    let counts = svc.counts().map_err(ServiceError::from)?;
    Ok(Json(counts))
}
