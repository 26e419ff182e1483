//! songlib-server library - song catalog service
//!
//! Stores songs with their release date, lyrics and link, enriching new
//! entries from a remote metadata service before they are persisted.

use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod catalog;
pub mod db;
pub mod metadata;
pub mod pagination;

pub use catalog::{CatalogError, CatalogService};

/// Browsers may cache preflight results for this long
const CORS_MAX_AGE: Duration = Duration::from_secs(20);

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

impl AppState {
    /// Create new application state
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

/// Build application router
///
/// Library routes live under `/api/v{api_version}`; `/health` stays at the root.
pub fn build_router(state: AppState, api_version: &str) -> Router {
    use axum::http::Method;
    use axum::routing::{delete, get, post, put};

    let library = Router::new()
        .route("/lib", get(api::list_songs))
        .route("/lib/add", put(api::add_song))
        .route("/lib/remove", delete(api::delete_song))
        .route("/lib/edit", post(api::edit_song))
        .route("/lib/:group_name/:song_name", get(api::song_lyrics));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .max_age(CORS_MAX_AGE);

    Router::new()
        .nest(&format!("/api/v{}", api_version), library)
        .merge(api::health_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
