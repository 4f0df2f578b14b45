pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

pub use auth::AdminAuth;
pub use handlers::AppState;

/// Create the media router.
/// - Public: /health, /api/media/resolve, /api/media/url, /api/media/placements
/// - Admin (bearer token): /api/media/assets, /api/media/links, /api/media/coverage
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/media/resolve", get(handlers::resolve))
        .route("/api/media/url", get(handlers::build_url))
        .route("/api/media/placements", get(handlers::list_placements))
        .route(
            "/api/media/assets",
            post(handlers::register_asset)
                .get(handlers::list_assets)
                .delete(handlers::delete_asset),
        )
        .route(
            "/api/media/links",
            get(handlers::list_links)
                .put(handlers::put_link)
                .delete(handlers::delete_link),
        )
        .route("/api/media/coverage", get(handlers::coverage))
}
