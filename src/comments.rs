use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{CurrentUser, MaybeUser};
use crate::core::errors::ApiError;
use crate::models::models::{Comment, CommentView};
use crate::store::DynStore;
use crate::users::user_summary;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_comment))
        .route("/post/{postId}", get(comments_by_post))
        .route("/{commentId}", put(update_comment).delete(delete_comment))
}

/// A comment can be removed by its author, or moderated away by the owner
/// of the post it hangs off.
fn can_delete_comment(actor_id: &str, comment: &Comment, post_owner: Option<&str>) -> bool {
    comment.user_id == actor_id || post_owner == Some(actor_id)
}

async fn populate_comment(store: &DynStore, comment: Comment) -> anyhow::Result<CommentView> {
    let user = store
        .user_by_id(&comment.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("comment {} has no author", comment.id))?;
    Ok(CommentView {
        id: comment.id,
        post_id: comment.post_id,
        user: user_summary(store, &user).await?,
        text: comment.text,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentRequest {
    post_id: String,
    text: String,
}

async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.post_id.is_empty() || body.text.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }
    if state.store.post_by_id(&body.post_id).await?.is_none() {
        return Err(ApiError::NotFound("Post not found".into()));
    }

    let comment = Comment::new(body.post_id, user.id.clone(), body.text);
    state.store.insert_comment(comment.clone()).await?;

    let view = populate_comment(&state.store, comment).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment added successfully", "data": view })),
    ))
}

async fn comments_by_post(
    State(state): State<AppState>,
    MaybeUser(_): MaybeUser,
    Path(post_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let comments = state.store.comments_by_post(&post_id).await?;
    let mut views = Vec::with_capacity(comments.len());
    for comment in comments {
        views.push(populate_comment(&state.store, comment).await?);
    }
    Ok(Json(json!({ "data": views })))
}

#[derive(Deserialize)]
struct UpdateCommentRequest {
    text: String,
}

async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<Json<Value>, ApiError> {
    let comment = state
        .store
        .comment_by_id(&comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;
    if comment.user_id != user.id {
        return Err(ApiError::Forbidden);
    }

    let updated = state
        .store
        .update_comment_text(&comment_id, &body.text)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;
    let view = populate_comment(&state.store, updated).await?;
    Ok(Json(json!({ "message": "Comment updated successfully", "data": view })))
}

async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let comment = state
        .store
        .comment_by_id(&comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;

    // The post lookup is only needed for the moderation path.
    let post_owner = if comment.user_id == user.id {
        None
    } else {
        state
            .store
            .post_by_id(&comment.post_id)
            .await?
            .map(|p| p.user_id)
    };
    if !can_delete_comment(&user.id, &comment, post_owner.as_deref()) {
        return Err(ApiError::Forbidden);
    }

    state.store.delete_comment(&comment_id).await?;
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}
