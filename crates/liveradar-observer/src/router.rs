//! Axum router construction for the radar HTTP surface.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- HTML radar page
/// - `GET /map` -- background PNG
/// - `GET /data` -- current snapshot
/// - `GET /players` -- current snapshot's player list
/// - `GET /status` -- ingestion progress summary
/// - `GET|POST /select?id=N` -- set or clear the highlighted player
/// - `GET /highlight` -- current highlight
///
/// Any origin may read every endpoint.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/map", get(handlers::get_map))
        .route("/data", get(handlers::get_data))
        .route("/players", get(handlers::list_players))
        .route("/status", get(handlers::get_status))
        .route(
            "/select",
            get(handlers::select_player).post(handlers::select_player),
        )
        .route("/highlight", get(handlers::get_highlight))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
