use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::helpers::now;

// === Stored documents ===
//
// Field names follow the wire format (camelCase), so the same structs
// describe both the JSON API and the stored documents.

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile_id: Option<String>,
    /// Denormalized cache of the Follow relation; kept in sync by the store.
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password: password_hash,
            profile_id: None,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: ts,
            updated_at: ts,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub id: String,
    pub user_id: String,
    pub fullname: Option<String>,
    pub username: Option<String>,
    pub mobilenumber: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub dateofbirth: Option<String>,
    pub location: Option<String>,
    pub profile_img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileDetails {
    pub fn empty(user_id: String, username: Option<String>) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            fullname: None,
            username,
            mobilenumber: None,
            bio: None,
            gender: None,
            dateofbirth: None,
            location: None,
            profile_img: None,
            created_at: ts,
            updated_at: ts,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub desc: Option<String>,
    pub location: Option<String>,
    pub post_img: Option<String>,
    /// Liking user ids, unique membership.
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        user_id: String,
        desc: Option<String>,
        location: Option<String>,
        post_img: Option<String>,
    ) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            desc,
            location,
            post_img,
            likes: Vec::new(),
            created_at: ts,
            updated_at: ts,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: String, user_id: String, text: String) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4().to_string(),
            post_id,
            user_id,
            text,
            created_at: ts,
            updated_at: ts,
        }
    }
}

/// Directed follower -> following edge, unique per ordered pair.
/// Its existence implies both array memberships on the two users.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: String,
    pub follower: String,
    pub following: String,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    pub fn new(follower: String, following: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            follower,
            following,
            created_at: now(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

// === Response projections ===

/// The profile fields selected when expanding author references.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub fullname: Option<String>,
    pub profile_img: Option<String>,
}

impl From<&ProfileDetails> for ProfileSummary {
    fn from(p: &ProfileDetails) -> Self {
        Self {
            id: p.id.clone(),
            fullname: p.fullname.clone(),
            profile_img: p.profile_img.clone(),
        }
    }
}

/// A user reference with its profile summary expanded.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub profile: Option<ProfileSummary>,
}

/// Full account representation; never carries the password hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile: Option<ProfileDetails>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountView {
    pub fn new(user: User, profile: Option<ProfileDetails>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            profile,
            followers: user.followers,
            following: user.following,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `/users/me` payload with follower/following references expanded.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile: Option<ProfileDetails>,
    pub followers: Vec<UserSummary>,
    pub following: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub user: UserSummary,
    pub desc: Option<String>,
    pub location: Option<String>,
    pub post_img: Option<String>,
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub user: UserSummary,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
