pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rust_embed::RustEmbed;
use tower_http::cors::{Any, CorsLayer};

use crate::db::DbPool;

pub use error::AppError;
use routes::{bans_routes, history_routes};

#[derive(RustEmbed, Clone)]
#[folder = "static"]
pub struct Assets;

/// Read-only view over the store shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

/// Serves the embedded dashboard; `/` maps to `index.html`.
async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

pub fn create_axum_router(pool: DbPool) -> Router {
    let app_state = Arc::new(AppState { pool });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest(
            "/api",
            history_routes::history_router().merge(bans_routes::bans_router()),
        )
        .fallback(static_handler)
        .with_state(app_state)
        .layer(cors)
}
