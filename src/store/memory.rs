use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    FollowOutcome, InsertUserOutcome, LikeOutcome, PostPatch, ProfilePatch, Result, Store,
    UnfollowOutcome,
};
use crate::core::helpers::{now, search_pattern};
use crate::models::models::{Comment, Follow, Post, ProfileDetails, TokenData, User};

/// In-memory store used by tests and by dev mode when no MongoDB URI is
/// configured. All collections sit behind one lock, so multi-document
/// operations (the follow triple write, cascade deletes) apply atomically.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    profiles: HashMap<String, ProfileDetails>,
    posts: HashMap<String, Post>,
    comments: HashMap<String, Comment>,
    follows: Vec<Follow>,
    tokens: HashMap<String, TokenData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl Store for MemoryStore {
    // === Users ===

    async fn insert_user(&self, user: User) -> Result<InsertUserOutcome> {
        let mut guard = self.inner.write().await;
        if guard.users.values().any(|u| u.email == user.email) {
            return Ok(InsertUserOutcome::DuplicateEmail);
        }
        if guard.users.values().any(|u| u.username == user.username) {
            return Ok(InsertUserOutcome::DuplicateUsername);
        }
        guard.users.insert(user.id.clone(), user);
        Ok(InsertUserOutcome::Created)
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let guard = self.inner.read().await;
        Ok(guard.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let guard = self.inner.read().await;
        Ok(guard.users.values().find(|u| u.username == username).cloned())
    }

    async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        let guard = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| guard.users.get(id).cloned()).collect())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let pattern = search_pattern(query);
        let guard = self.inner.read().await;
        Ok(guard
            .users
            .values()
            .filter(|u| pattern.is_match(&u.username))
            .cloned()
            .collect())
    }

    async fn set_user_profile(&self, user_id: &str, profile_id: Option<String>) -> Result<()> {
        let mut guard = self.inner.write().await;
        if let Some(user) = guard.users.get_mut(user_id) {
            user.profile_id = profile_id;
            user.updated_at = now();
        }
        Ok(())
    }

    // === Profiles ===

    async fn insert_profile(&self, profile: ProfileDetails) -> Result<()> {
        self.inner
            .write()
            .await
            .profiles
            .insert(profile.id.clone(), profile);
        Ok(())
    }

    async fn profile_by_id(&self, id: &str) -> Result<Option<ProfileDetails>> {
        Ok(self.inner.read().await.profiles.get(id).cloned())
    }

    async fn profile_by_user(&self, user_id: &str) -> Result<Option<ProfileDetails>> {
        let guard = self.inner.read().await;
        Ok(guard.profiles.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn all_profiles(&self) -> Result<Vec<ProfileDetails>> {
        Ok(self.inner.read().await.profiles.values().cloned().collect())
    }

    async fn profile_username_taken(&self, username: &str, exclude_user: &str) -> Result<bool> {
        let guard = self.inner.read().await;
        Ok(guard
            .profiles
            .values()
            .any(|p| p.user_id != exclude_user && p.username.as_deref() == Some(username)))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<Option<ProfileDetails>> {
        let mut guard = self.inner.write().await;
        let profile = guard.profiles.values_mut().find(|p| p.user_id == user_id);
        Ok(profile.map(|p| {
            if let Some(v) = patch.fullname {
                p.fullname = Some(v);
            }
            if let Some(v) = patch.username {
                p.username = Some(v);
            }
            if let Some(v) = patch.mobilenumber {
                p.mobilenumber = Some(v);
            }
            if let Some(v) = patch.bio {
                p.bio = Some(v);
            }
            if let Some(v) = patch.gender {
                p.gender = Some(v);
            }
            if let Some(v) = patch.dateofbirth {
                p.dateofbirth = Some(v);
            }
            if let Some(v) = patch.location {
                p.location = Some(v);
            }
            if let Some(v) = patch.profile_img {
                p.profile_img = v;
            }
            p.updated_at = now();
            p.clone()
        }))
    }

    async fn delete_profile(&self, id: &str) -> Result<()> {
        self.inner.write().await.profiles.remove(id);
        Ok(())
    }

    async fn search_profiles(&self, query: &str) -> Result<Vec<ProfileDetails>> {
        let pattern = search_pattern(query);
        let guard = self.inner.read().await;
        Ok(guard
            .profiles
            .values()
            .filter(|p| {
                p.fullname.as_deref().is_some_and(|f| pattern.is_match(f))
                    || p.username.as_deref().is_some_and(|u| pattern.is_match(u))
            })
            .cloned()
            .collect())
    }

    // === Posts ===

    async fn insert_post(&self, post: Post) -> Result<()> {
        self.inner.write().await.posts.insert(post.id.clone(), post);
        Ok(())
    }

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.inner.read().await.posts.get(id).cloned())
    }

    async fn all_posts(&self) -> Result<Vec<Post>> {
        let guard = self.inner.read().await;
        let mut posts: Vec<Post> = guard.posts.values().cloned().collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>> {
        let guard = self.inner.read().await;
        let mut posts: Vec<Post> = guard
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn posts_by_users(&self, user_ids: &[String]) -> Result<Vec<Post>> {
        let guard = self.inner.read().await;
        let mut posts: Vec<Post> = guard
            .posts
            .values()
            .filter(|p| user_ids.contains(&p.user_id))
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn posts_excluding_user(
        &self,
        user_id: &str,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let guard = self.inner.read().await;
        let mut posts: Vec<Post> = guard
            .posts
            .values()
            .filter(|p| p.user_id != user_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.likes.len().cmp(&a.likes.len()))
        });
        Ok(posts
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_posts_excluding_user(&self, user_id: &str) -> Result<u64> {
        let guard = self.inner.read().await;
        Ok(guard.posts.values().filter(|p| p.user_id != user_id).count() as u64)
    }

    async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Option<Post>> {
        let mut guard = self.inner.write().await;
        Ok(guard.posts.get_mut(id).map(|p| {
            if let Some(v) = patch.desc {
                p.desc = Some(v);
            }
            if let Some(v) = patch.location {
                p.location = Some(v);
            }
            if let Some(v) = patch.post_img {
                p.post_img = Some(v);
            }
            p.updated_at = now();
            p.clone()
        }))
    }

    async fn delete_post(&self, id: &str) -> Result<()> {
        self.inner.write().await.posts.remove(id);
        Ok(())
    }

    async fn add_like(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome> {
        let mut guard = self.inner.write().await;
        let Some(post) = guard.posts.get_mut(post_id) else {
            return Ok(LikeOutcome::Missing);
        };
        if post.likes.iter().any(|id| id == user_id) {
            return Ok(LikeOutcome::AlreadyLiked);
        }
        post.likes.push(user_id.to_string());
        Ok(LikeOutcome::Liked(post.likes.len()))
    }

    async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome> {
        let mut guard = self.inner.write().await;
        let Some(post) = guard.posts.get_mut(post_id) else {
            return Ok(LikeOutcome::Missing);
        };
        let before = post.likes.len();
        post.likes.retain(|id| id != user_id);
        if post.likes.len() == before {
            return Ok(LikeOutcome::NotLiked);
        }
        Ok(LikeOutcome::Unliked(post.likes.len()))
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<Post>> {
        let pattern = search_pattern(query);
        let guard = self.inner.read().await;
        let mut posts: Vec<Post> = guard
            .posts
            .values()
            .filter(|p| {
                p.desc.as_deref().is_some_and(|d| pattern.is_match(d))
                    || p.location.as_deref().is_some_and(|l| pattern.is_match(l))
            })
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    // === Comments ===

    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        self.inner
            .write()
            .await
            .comments
            .insert(comment.id.clone(), comment);
        Ok(())
    }

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.inner.read().await.comments.get(id).cloned())
    }

    async fn comments_by_post(&self, post_id: &str) -> Result<Vec<Comment>> {
        let guard = self.inner.read().await;
        let mut comments: Vec<Comment> = guard
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn update_comment_text(&self, id: &str, text: &str) -> Result<Option<Comment>> {
        let mut guard = self.inner.write().await;
        Ok(guard.comments.get_mut(id).map(|c| {
            c.text = text.to_string();
            c.updated_at = now();
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: &str) -> Result<()> {
        self.inner.write().await.comments.remove(id);
        Ok(())
    }

    async fn delete_comments_by_post(&self, post_id: &str) -> Result<u64> {
        let mut guard = self.inner.write().await;
        let before = guard.comments.len();
        guard.comments.retain(|_, c| c.post_id != post_id);
        Ok((before - guard.comments.len()) as u64)
    }

    // === Follows ===

    async fn create_follow(&self, follower: &str, following: &str) -> Result<FollowOutcome> {
        let mut guard = self.inner.write().await;
        if guard
            .follows
            .iter()
            .any(|f| f.follower == follower && f.following == following)
        {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        // Edge plus both array memberships under one write guard,
        // all-or-nothing.
        guard
            .follows
            .push(Follow::new(follower.to_string(), following.to_string()));
        if let Some(user) = guard.users.get_mut(follower) {
            user.following.push(following.to_string());
        }
        if let Some(user) = guard.users.get_mut(following) {
            user.followers.push(follower.to_string());
        }
        Ok(FollowOutcome::Created)
    }

    async fn delete_follow(&self, follower: &str, following: &str) -> Result<UnfollowOutcome> {
        let mut guard = self.inner.write().await;
        let before = guard.follows.len();
        guard
            .follows
            .retain(|f| !(f.follower == follower && f.following == following));
        if guard.follows.len() == before {
            return Ok(UnfollowOutcome::NotFollowing);
        }

        if let Some(user) = guard.users.get_mut(follower) {
            user.following.retain(|id| id != following);
        }
        if let Some(user) = guard.users.get_mut(following) {
            user.followers.retain(|id| id != follower);
        }
        Ok(UnfollowOutcome::Removed)
    }

    // === Tokens ===

    async fn insert_token(&self, token: &str, data: TokenData) -> Result<()> {
        self.inner.write().await.tokens.insert(token.to_string(), data);
        Ok(())
    }

    async fn token_data(&self, token: &str) -> Result<Option<TokenData>> {
        Ok(self.inner.read().await.tokens.get(token).cloned())
    }

    async fn delete_token(&self, token: &str) -> Result<()> {
        self.inner.write().await.tokens.remove(token);
        Ok(())
    }
}
