pub mod auth;
pub mod comments;
pub mod config;
pub mod core;
pub mod feed;
pub mod follow;
pub mod models;
pub mod posts;
pub mod profiles;
pub mod search;
pub mod store;
pub mod users;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::store::DynStore;

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub config: Arc<Config>,
}

/// Builds the full application router over the given state. Uploaded
/// images are served back from the same directories the handlers write
/// them to.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api/users", users::router())
        .nest("/api/profiles", profiles::router())
        .nest("/api/posts", posts::router())
        .nest("/api/comments", comments::router())
        .nest("/api/follows", follow::router())
        .nest("/api/feed", feed::router())
        .nest("/api/search", search::router())
        .nest("/api/auth", auth::router())
        .nest_service(
            "/profile/images",
            ServeDir::new(state.config.profile_image_dir()),
        )
        .nest_service("/post/images", ServeDir::new(state.config.post_image_dir()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state)
}

async fn root() -> &'static str {
    "perch api"
}
