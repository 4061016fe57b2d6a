use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::{CurrentUser, MaybeUser};
use crate::core::errors::ApiError;
use crate::core::helpers::{read_form, remove_image, save_image};
use crate::models::models::{Post, PostView};
use crate::store::{DynStore, LikeOutcome, PostPatch};
use crate::users::user_summary;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post).get(get_posts))
        .route("/me", get(my_posts))
        .route("/user/{userId}", get(user_posts))
        .route("/{id}", get(post_by_id).put(update_post).delete(delete_post))
        .route("/{id}/like", post(like_post))
        .route("/{id}/unlike", post(unlike_post))
}

/// Expands the author reference the way list endpoints return posts.
pub(crate) async fn populate_post(store: &DynStore, post: Post) -> anyhow::Result<PostView> {
    let user = store
        .user_by_id(&post.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("post {} has no author", post.id))?;
    Ok(PostView {
        id: post.id,
        user: user_summary(store, &user).await?,
        desc: post.desc,
        location: post.location,
        post_img: post.post_img,
        likes: post.likes,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}

pub(crate) async fn populate_posts(
    store: &DynStore,
    posts: Vec<Post>,
) -> anyhow::Result<Vec<PostView>> {
    let mut out = Vec::with_capacity(posts.len());
    for post in posts {
        out.push(populate_post(store, post).await?);
    }
    Ok(out)
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (fields, image) = read_form(multipart, "postImg").await?;

    let mut post_img = None;
    if let Some(upload) = &image {
        save_image(&state.config.post_image_dir(), &upload.filename, &upload.bytes).await?;
        post_img = Some(upload.filename.clone());
    }

    let post = Post::new(
        user.id.clone(),
        fields.get("desc").cloned(),
        fields.get("location").cloned(),
        post_img,
    );
    state.store.insert_post(post.clone()).await?;

    let view = populate_post(&state.store, post).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created successfully", "data": view })),
    ))
}

async fn get_posts(
    State(state): State<AppState>,
    MaybeUser(_): MaybeUser,
) -> Result<Json<Value>, ApiError> {
    let posts = state.store.all_posts().await?;
    let views = populate_posts(&state.store, posts).await?;
    Ok(Json(json!({ "data": views })))
}

async fn my_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let posts = state.store.posts_by_user(&user.id).await?;
    let views = populate_posts(&state.store, posts).await?;
    Ok(Json(json!({ "data": views })))
}

async fn user_posts(
    State(state): State<AppState>,
    MaybeUser(_): MaybeUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let posts = state.store.posts_by_user(&user_id).await?;
    let views = populate_posts(&state.store, posts).await?;
    Ok(Json(json!({ "data": views })))
}

async fn post_by_id(
    State(state): State<AppState>,
    MaybeUser(_): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let post = state
        .store
        .post_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
    let view = populate_post(&state.store, post).await?;
    Ok(Json(json!({ "data": view })))
}

async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (fields, image) = read_form(multipart, "postImg").await?;

    let post = state
        .store
        .post_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
    if post.user_id != user.id {
        return Err(ApiError::Forbidden);
    }

    let mut patch = PostPatch {
        desc: fields.get("desc").cloned(),
        location: fields.get("location").cloned(),
        post_img: None,
    };

    if let Some(upload) = &image {
        let dir = state.config.post_image_dir();
        if let Some(old) = &post.post_img {
            remove_image(&dir, old).await;
        }
        save_image(&dir, &upload.filename, &upload.bytes).await?;
        patch.post_img = Some(upload.filename.clone());
    }

    let updated = state
        .store
        .update_post(&id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
    let view = populate_post(&state.store, updated).await?;
    Ok(Json(json!({ "message": "Post updated successfully", "data": view })))
}

async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let post = state
        .store
        .post_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
    if post.user_id != user.id {
        return Err(ApiError::Forbidden);
    }

    if let Some(img) = &post.post_img {
        remove_image(&state.config.post_image_dir(), img).await;
    }

    // Comments go first so a failure never leaves orphans behind a
    // deleted post.
    state.store.delete_comments_by_post(&id).await?;
    state.store.delete_post(&id).await?;

    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

async fn like_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.store.add_like(&id, &user.id).await? {
        LikeOutcome::Liked(count) => Ok(Json(json!({
            "message": "Post liked successfully",
            "likesCount": count,
        }))),
        LikeOutcome::AlreadyLiked => Err(ApiError::BadRequest("Post already liked".into())),
        LikeOutcome::Missing => Err(ApiError::NotFound("Post not found".into())),
        _ => Err(ApiError::Internal(anyhow::anyhow!("unexpected like outcome"))),
    }
}

async fn unlike_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.store.remove_like(&id, &user.id).await? {
        LikeOutcome::Unliked(count) => Ok(Json(json!({
            "message": "Post unliked successfully",
            "likesCount": count,
        }))),
        LikeOutcome::NotLiked => Err(ApiError::BadRequest("Post not liked yet".into())),
        LikeOutcome::Missing => Err(ApiError::NotFound("Post not found".into())),
        _ => Err(ApiError::Internal(anyhow::anyhow!("unexpected unlike outcome"))),
    }
}
