use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::HoursQuery;
use crate::db::bans_service;
use crate::web::models::BansDetailsResponse;
use crate::web::{AppError, AppState};

/// Banned addresses in the window, grouped per minute and address family.
async fn get_bans_details_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<HoursQuery>,
) -> Result<Json<BansDetailsResponse>, AppError> {
    let hours = params.validated()?;
    let pool = app_state.pool.clone();
    let rows = tokio::task::spawn_blocking(move || bans_service::query_bans(&pool, hours))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))??;
    Ok(Json(BansDetailsResponse::from_rows(hours, rows)))
}

pub fn bans_router() -> Router<Arc<AppState>> {
    Router::new().route("/bans-details", get(get_bans_details_handler))
}
