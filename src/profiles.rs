use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::core::errors::ApiError;
use crate::core::helpers::{read_form, remove_image, save_image};
use crate::models::models::ProfileDetails;
use crate::store::ProfilePatch;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_profile)
                .get(get_profiles)
                .put(update_profile)
                .delete(delete_profile),
        )
        .route("/me", get(my_profile))
        .route("/{id}", get(profile_by_id))
}

async fn create_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (fields, image) = read_form(multipart, "profileImg").await?;

    if state.store.profile_by_user(&user.id).await?.is_some() {
        return Err(ApiError::Conflict("Profile already exists for this user".into()));
    }
    if let Some(username) = fields.get("username") {
        if state.store.profile_username_taken(username, &user.id).await? {
            return Err(ApiError::Conflict("Username already taken".into()));
        }
    }

    let mut profile = ProfileDetails::empty(user.id.clone(), None);
    profile.fullname = fields.get("fullname").cloned();
    profile.username = fields.get("username").cloned();
    profile.mobilenumber = fields.get("mobilenumber").cloned();
    profile.bio = fields.get("bio").cloned();
    profile.gender = fields.get("gender").cloned();
    profile.dateofbirth = fields.get("dateofbirth").cloned();
    profile.location = fields.get("location").cloned();

    if let Some(upload) = &image {
        save_image(&state.config.profile_image_dir(), &upload.filename, &upload.bytes).await?;
        profile.profile_img = Some(upload.filename.clone());
    }

    state.store.insert_profile(profile.clone()).await?;
    state
        .store
        .set_user_profile(&user.id, Some(profile.id.clone()))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Profile created successfully", "data": profile })),
    ))
}

async fn get_profiles(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let profiles = state.store.all_profiles().await?;
    Ok(Json(json!({ "data": profiles })))
}

async fn profile_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .store
        .profile_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    Ok(Json(json!({ "data": profile })))
}

async fn my_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .store
        .profile_by_user(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    Ok(Json(json!({ "data": profile })))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (fields, image) = read_form(multipart, "profileImg").await?;

    let profile = state
        .store
        .profile_by_user(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    if let Some(username) = fields.get("username") {
        if Some(username) != profile.username.as_ref()
            && state.store.profile_username_taken(username, &user.id).await?
        {
            return Err(ApiError::Conflict("Username already taken".into()));
        }
    }

    let mut patch = ProfilePatch {
        fullname: fields.get("fullname").cloned(),
        username: fields.get("username").cloned(),
        mobilenumber: fields.get("mobilenumber").cloned(),
        bio: fields.get("bio").cloned(),
        gender: fields.get("gender").cloned(),
        dateofbirth: fields.get("dateofbirth").cloned(),
        location: fields.get("location").cloned(),
        profile_img: None,
    };

    let dir = state.config.profile_image_dir();
    if let Some(upload) = &image {
        if let Some(old) = &profile.profile_img {
            remove_image(&dir, old).await;
        }
        save_image(&dir, &upload.filename, &upload.bytes).await?;
        patch.profile_img = Some(Some(upload.filename.clone()));
    } else if fields.get("removeImage").map(String::as_str) == Some("true") {
        if let Some(old) = &profile.profile_img {
            remove_image(&dir, old).await;
        }
        patch.profile_img = Some(None);
    }

    let updated = state
        .store
        .update_profile(&user.id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "data": updated,
    })))
}

async fn delete_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .store
        .profile_by_user(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    if let Some(img) = &profile.profile_img {
        remove_image(&state.config.profile_image_dir(), img).await;
    }

    state.store.delete_profile(&profile.id).await?;
    state.store.set_user_profile(&user.id, None).await?;

    Ok(Json(json!({ "message": "Profile deleted successfully" })))
}
