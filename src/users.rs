use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{issue_token, CurrentUser};
use crate::core::errors::ApiError;
use crate::core::helpers::{hash_password, verify_password};
use crate::models::models::{
    AccountView, MeView, ProfileDetails, ProfileSummary, User, UserSummary,
};
use crate::store::{DynStore, InsertUserOutcome};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/me", get(me))
}

#[derive(Deserialize)]
struct SignupRequest {
    username: String,
    email: String,
    password: String,
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.username.is_empty() || body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let hash = hash_password(&body.password)?;
    let mut user = User::new(body.username, body.email, hash);

    // Every account starts with an empty profile carrying the login username.
    let profile = ProfileDetails::empty(user.id.clone(), Some(user.username.clone()));
    user.profile_id = Some(profile.id.clone());

    // Uniqueness is enforced by the store itself, so two racing signups
    // cannot both persist.
    match state.store.insert_user(user.clone()).await? {
        InsertUserOutcome::Created => {}
        InsertUserOutcome::DuplicateEmail => {
            return Err(ApiError::Conflict("Email already in use".into()));
        }
        InsertUserOutcome::DuplicateUsername => {
            return Err(ApiError::Conflict("Username already taken".into()));
        }
    }
    state.store.insert_profile(profile.clone()).await?;

    let token = issue_token(&state.store, &user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": AccountView::new(user, Some(profile)),
            "token": token,
        })),
    ))
}

#[derive(Deserialize)]
struct SigninRequest {
    email: String,
    password: String,
}

async fn signin(
    State(state): State<AppState>,
    Json(body): Json<SigninRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .store
        .user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email not found".into()))?;
    if !verify_password(&body.password, &user.password) {
        return Err(ApiError::Unauthorized);
    }

    let profile = state.store.profile_by_user(&user.id).await?;
    let token = issue_token(&state.store, &user.id).await?;
    Ok(Json(json!({
        "message": "Signed in successfully",
        "user": AccountView::new(user, profile),
        "token": token,
    })))
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeView>, ApiError> {
    let profile = state.store.profile_by_user(&user.id).await?;
    let followers = user_summaries(&state.store, &user.followers).await?;
    let following = user_summaries(&state.store, &user.following).await?;
    Ok(Json(MeView {
        id: user.id,
        username: user.username,
        email: user.email,
        profile,
        followers,
        following,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }))
}

/// Expands a user into the reference shape embedded in posts and comments.
pub(crate) async fn user_summary(store: &DynStore, user: &User) -> anyhow::Result<UserSummary> {
    let profile = store.profile_by_user(&user.id).await?;
    Ok(UserSummary {
        id: user.id.clone(),
        username: user.username.clone(),
        profile: profile.as_ref().map(ProfileSummary::from),
    })
}

/// Expands a list of user ids, silently skipping ids that no longer resolve.
pub(crate) async fn user_summaries(
    store: &DynStore,
    ids: &[String],
) -> anyhow::Result<Vec<UserSummary>> {
    let users = store.users_by_ids(ids).await?;
    let mut out = Vec::with_capacity(users.len());
    for user in &users {
        out.push(user_summary(store, user).await?);
    }
    Ok(out)
}
