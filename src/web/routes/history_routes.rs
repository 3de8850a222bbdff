use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::HoursQuery;
use crate::db::metrics_service;
use crate::web::models::HistoryResponse;
use crate::web::{AppError, AppState};

/// Per-minute resource history plus window totals, shaped for the charts.
async fn get_history_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<HoursQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let hours = params.validated()?;
    let pool = app_state.pool.clone();
    let (points, totals) =
        tokio::task::spawn_blocking(move || metrics_service::query_samples(&pool, hours))
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))??;
    Ok(Json(HistoryResponse::from_rows(hours, points, totals)))
}

pub fn history_router() -> Router<Arc<AppState>> {
    Router::new().route("/history", get(get_history_handler))
}
