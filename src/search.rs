use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::models::models::{ProfileSummary, UserSummary};
use crate::posts::populate_posts;
use crate::users::user_summary;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users))
        .route("/posts", get(search_posts))
}

#[derive(Deserialize)]
struct SearchParams {
    query: Option<String>,
}

fn require_query(params: SearchParams) -> Result<String, ApiError> {
    match params.query {
        Some(q) if !q.is_empty() => Ok(q),
        _ => Err(ApiError::BadRequest("Search query is required".into())),
    }
}

/// Matches login usernames first, then profile fullnames and display
/// usernames, merged with the first hit per user winning.
async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = require_query(params)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut results: Vec<UserSummary> = Vec::new();

    for user in state.store.search_users(&query).await? {
        if seen.insert(user.id.clone()) {
            results.push(user_summary(&state.store, &user).await?);
        }
    }

    for profile in state.store.search_profiles(&query).await? {
        if !seen.insert(profile.user_id.clone()) {
            continue;
        }
        let Some(user) = state.store.user_by_id(&profile.user_id).await? else {
            continue;
        };
        results.push(UserSummary {
            id: user.id,
            username: user.username,
            profile: Some(ProfileSummary::from(&profile)),
        });
    }

    Ok(Json(json!({ "data": results })))
}

async fn search_posts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = require_query(params)?;
    let posts = state.store.search_posts(&query).await?;
    let views = populate_posts(&state.store, posts).await?;
    Ok(Json(json!({ "data": views })))
}
