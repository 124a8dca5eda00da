//! Endpoint handlers for the radar HTTP surface.
//!
//! Snapshot handlers take one [`read`] from the publisher and build their
//! whole response from it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | HTML radar page |
//! | `GET` | `/map` | Background image (`image/png`) |
//! | `GET` | `/data` | Current snapshot `{players, bomb}` |
//! | `GET` | `/players` | Current player list (`?team=2\|3` filter) |
//! | `GET` | `/status` | Sequence, tick, publish time, counts, highlight |
//! | `GET`/`POST` | `/select` | Set (`?id=N`) or clear the highlight |
//! | `GET` | `/highlight` | Current highlight |
//!
//! [`read`]: liveradar_core::publisher::SnapshotPublisher::read

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Response};
use liveradar_types::{Highlight, PlayerId, PlayerMarker, Team};
use tracing::debug;

use crate::error::ObserverError;
use crate::state::AppState;

/// The radar page served at `/`.
const INDEX_HTML: &str = include_str!("../assets/index.html");

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `/select`.
#[derive(Debug, serde::Deserialize)]
pub struct SelectQuery {
    /// The player to highlight. Missing or non-numeric clears it.
    pub id: Option<String>,
}

/// Query parameters for `GET /players`.
#[derive(Debug, serde::Deserialize)]
pub struct PlayersQuery {
    /// Only list players of this team code (2 or 3).
    pub team: Option<u8>,
}

// ---------------------------------------------------------------------------
// Static content
// ---------------------------------------------------------------------------

/// Serve the HTML radar page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Serve the background image captured at startup.
pub async fn get_map(State(state): State<Arc<AppState>>) -> Response {
    (
        [(CONTENT_TYPE, "image/png"), (CACHE_CONTROL, "no-cache")],
        state.background.clone(),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Snapshot endpoints
// ---------------------------------------------------------------------------

/// Serve the current snapshot as `{ "players": [...], "bomb": {x, y} | null }`.
pub async fn get_data(State(state): State<Arc<AppState>>) -> Result<Response, ObserverError> {
    let snapshot = state.publisher.read();
    let body = serde_json::to_vec(snapshot.as_ref())?;
    Ok((
        [
            (CONTENT_TYPE, "application/json"),
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response())
}

/// List the current snapshot's players, optionally filtered by team.
pub async fn list_players(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlayersQuery>,
) -> Result<Json<Vec<PlayerMarker>>, ObserverError> {
    let team = params
        .team
        .map(|code| {
            Team::try_from(code)
                .ok()
                .filter(|t| t.is_playing_side())
                .ok_or_else(|| {
                    ObserverError::InvalidQuery(format!("team must be 2 or 3, got {code}"))
                })
        })
        .transpose()?;

    let snapshot = state.publisher.read();
    let players = snapshot
        .players
        .iter()
        .filter(|p| team.is_none_or(|t| p.team == t))
        .cloned()
        .collect();
    Ok(Json(players))
}

/// Summarize the current snapshot and highlight.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ObserverError> {
    let snapshot = state.publisher.read();
    let highlight = serde_json::to_value(state.publisher.highlight())?;
    Ok(Json(serde_json::json!({
        "sequence": snapshot.sequence,
        "tick": snapshot.tick,
        "publishedAt": snapshot.published_at,
        "players": snapshot.players.len(),
        "bomb": snapshot.bomb.is_some(),
        "map": state.map_name,
        "highlight": highlight,
    })))
}

// ---------------------------------------------------------------------------
// Highlight
// ---------------------------------------------------------------------------

/// Set the highlighted player from `?id=N`, or clear it.
pub async fn select_player(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectQuery>,
) -> Json<Highlight> {
    let user_id = params
        .id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .map(PlayerId);
    let highlight = state.publisher.set_highlight(user_id);
    debug!(user_id = ?highlight.user_id, version = highlight.version, "Highlight changed");
    Json(highlight)
}

/// The current highlight.
pub async fn get_highlight(State(state): State<Arc<AppState>>) -> Json<Highlight> {
    Json(state.publisher.highlight())
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> ObserverError {
    ObserverError::NotFound(format!("no route for {}", uri.path()))
}
