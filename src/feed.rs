use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::core::errors::ApiError;
use crate::posts::populate_posts;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_feed))
        .route("/explore", get(get_explore))
}

/// The home feed: posts from followed users plus the reader's own,
/// newest first.
async fn get_feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let mut authors = user.following.clone();
    authors.push(user.id.clone());

    let posts = state.store.posts_by_users(&authors).await?;
    let views = populate_posts(&state.store, posts).await?;
    Ok(Json(json!({ "data": views })))
}

#[derive(Deserialize)]
struct ExploreParams {
    page: Option<u64>,
    limit: Option<i64>,
}

async fn get_explore(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ExploreParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.filter(|l| *l > 0).unwrap_or(20);
    let page = params.page.filter(|p| *p > 0).unwrap_or(1);
    let skip = page.saturating_sub(1).saturating_mul(limit as u64);

    let posts = state
        .store
        .posts_excluding_user(&user.id, skip, limit)
        .await?;
    let total_posts = state.store.count_posts_excluding_user(&user.id).await?;
    let total_pages = total_posts.div_ceil(limit as u64);

    let views = populate_posts(&state.store, posts).await?;
    Ok(Json(json!({
        "data": views,
        "pagination": {
            "totalPosts": total_posts,
            "totalPages": total_pages,
            "currentPage": page,
            "hasNextPage": page < total_pages,
        },
    })))
}
