use std::sync::Arc;

use async_trait::async_trait;

use crate::models::models::{Comment, Post, ProfileDetails, TokenData, User};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub type DynStore = Arc<dyn Store>;

type Result<T> = anyhow::Result<T>;

/// Partial profile update; `profile_img` distinguishes "leave alone"
/// (None) from "clear" (Some(None)).
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub fullname: Option<String>,
    pub username: Option<String>,
    pub mobilenumber: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub dateofbirth: Option<String>,
    pub location: Option<String>,
    pub profile_img: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub desc: Option<String>,
    pub location: Option<String>,
    pub post_img: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Membership changed; carries the new like count.
    Liked(usize),
    Unliked(usize),
    AlreadyLiked,
    NotLiked,
    Missing,
}

/// Result of inserting a user; duplicates are detected inside the store so
/// two racing signups can never both persist.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertUserOutcome {
    Created,
    DuplicateEmail,
    DuplicateUsername,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

/// Every document-store operation the resource handlers need. Implemented
/// by [`MongoStore`] for deployment and [`MemoryStore`] for tests/dev.
///
/// List results ordered by time are always newest first.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: User) -> Result<InsertUserOutcome>;
    async fn user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<User>>;
    /// Case-insensitive substring match on username.
    async fn search_users(&self, query: &str) -> Result<Vec<User>>;
    async fn set_user_profile(&self, user_id: &str, profile_id: Option<String>) -> Result<()>;

    // profiles
    async fn insert_profile(&self, profile: ProfileDetails) -> Result<()>;
    async fn profile_by_id(&self, id: &str) -> Result<Option<ProfileDetails>>;
    async fn profile_by_user(&self, user_id: &str) -> Result<Option<ProfileDetails>>;
    async fn all_profiles(&self) -> Result<Vec<ProfileDetails>>;
    /// Whether another user's profile already uses this display username.
    async fn profile_username_taken(&self, username: &str, exclude_user: &str) -> Result<bool>;
    async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<Option<ProfileDetails>>;
    async fn delete_profile(&self, id: &str) -> Result<()>;
    /// Case-insensitive substring match on fullname or display username.
    async fn search_profiles(&self, query: &str) -> Result<Vec<ProfileDetails>>;

    // posts
    async fn insert_post(&self, post: Post) -> Result<()>;
    async fn post_by_id(&self, id: &str) -> Result<Option<Post>>;
    async fn all_posts(&self) -> Result<Vec<Post>>;
    async fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>>;
    async fn posts_by_users(&self, user_ids: &[String]) -> Result<Vec<Post>>;
    /// Explore page: everyone else's posts, ordered by created desc then
    /// like count (array length) desc, offset/limit. Both backends order
    /// by the length of `likes`, not its contents.
    async fn posts_excluding_user(&self, user_id: &str, skip: u64, limit: i64)
        -> Result<Vec<Post>>;
    async fn count_posts_excluding_user(&self, user_id: &str) -> Result<u64>;
    async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Option<Post>>;
    async fn delete_post(&self, id: &str) -> Result<()>;
    /// Add-once like; the membership check and insert are one guarded update.
    async fn add_like(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome>;
    async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome>;
    /// Case-insensitive substring match on desc or location.
    async fn search_posts(&self, query: &str) -> Result<Vec<Post>>;

    // comments
    async fn insert_comment(&self, comment: Comment) -> Result<()>;
    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>>;
    async fn comments_by_post(&self, post_id: &str) -> Result<Vec<Comment>>;
    async fn update_comment_text(&self, id: &str, text: &str) -> Result<Option<Comment>>;
    async fn delete_comment(&self, id: &str) -> Result<()>;
    async fn delete_comments_by_post(&self, post_id: &str) -> Result<u64>;

    // follows
    //
    // The edge is the source of truth; the two denormalized array
    // memberships are written inside the same store operation so a
    // handler never sees the relation half-applied.
    async fn create_follow(&self, follower: &str, following: &str) -> Result<FollowOutcome>;
    async fn delete_follow(&self, follower: &str, following: &str) -> Result<UnfollowOutcome>;

    // tokens
    async fn insert_token(&self, token: &str, data: TokenData) -> Result<()>;
    async fn token_data(&self, token: &str) -> Result<Option<TokenData>>;
    async fn delete_token(&self, token: &str) -> Result<()>;
}
