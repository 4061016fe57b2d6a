use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::core::errors::ApiError;
use crate::store::{FollowOutcome, UnfollowOutcome};
use crate::users::user_summaries;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{userId}", post(follow_user).delete(unfollow_user))
        .route("/{userId}/followers", get(get_followers))
        .route("/{userId}/following", get(get_following))
}

async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(target): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.user_by_id(&target).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }
    if target == user.id {
        return Err(ApiError::BadRequest("You cannot follow yourself".into()));
    }

    match state.store.create_follow(&user.id, &target).await? {
        FollowOutcome::Created => Ok(Json(json!({ "message": "User followed successfully" }))),
        FollowOutcome::AlreadyFollowing => {
            Err(ApiError::BadRequest("Already following this user".into()))
        }
    }
}

async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(target): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.user_by_id(&target).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }
    if target == user.id {
        return Err(ApiError::BadRequest("You cannot unfollow yourself".into()));
    }

    match state.store.delete_follow(&user.id, &target).await? {
        UnfollowOutcome::Removed => Ok(Json(json!({ "message": "User unfollowed successfully" }))),
        UnfollowOutcome::NotFollowing => {
            Err(ApiError::BadRequest("Not following this user".into()))
        }
    }
}

async fn get_followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .store
        .user_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let followers = user_summaries(&state.store, &user.followers).await?;
    Ok(Json(json!({ "data": followers })))
}

async fn get_following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .store
        .user_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let following = user_summaries(&state.store, &user.following).await?;
    Ok(Json(json!({ "data": following })))
}
