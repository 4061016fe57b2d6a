use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use super::{
    FollowOutcome, InsertUserOutcome, LikeOutcome, PostPatch, ProfilePatch, Result, Store,
    UnfollowOutcome,
};
use crate::core::helpers::now;
use crate::models::models::{Comment, Follow, Post, ProfileDetails, TokenData, User};

/// MongoDB-backed store. One typed collection per entity, documents keyed
/// by the application-level `id` under a unique index. The follows
/// collection additionally carries a unique compound index on the ordered
/// pair, which is what makes `create_follow` at-most-once under races.
pub struct MongoStore {
    users: Collection<MongoUser>,
    profiles: Collection<MongoProfile>,
    posts: Collection<MongoPost>,
    comments: Collection<MongoComment>,
    follows: Collection<MongoFollow>,
    tokens: Collection<MongoToken>,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let client = mongodb::Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        Self::with_database(db).await
    }

    pub async fn with_database(db: Database) -> anyhow::Result<Self> {
        for name in ["profiles", "posts", "comments", "tokens"] {
            db.run_command(unique_id_index(name), None).await?;
        }
        db.run_command(
            doc! {
                "createIndexes": "users",
                "indexes": [
                    { "name": "unique_id", "key": { "id": 1 }, "unique": true },
                    { "name": "unique_username", "key": { "username": 1 }, "unique": true },
                    { "name": "unique_email", "key": { "email": 1 }, "unique": true },
                ],
            },
            None,
        )
        .await?;
        db.run_command(
            doc! {
                "createIndexes": "follows",
                "indexes": [{
                    "name": "unique_edge",
                    "key": { "follower": 1, "following": 1 },
                    "unique": true,
                }],
            },
            None,
        )
        .await?;

        Ok(Self {
            users: db.collection("users"),
            profiles: db.collection("profiles"),
            posts: db.collection("posts"),
            comments: db.collection("comments"),
            follows: db.collection("follows"),
            tokens: db.collection("tokens"),
        })
    }
}

fn unique_id_index(collection: &str) -> Document {
    doc! {
        "createIndexes": collection,
        "indexes": [{
            "name": "unique_id",
            "key": { "id": 1 },
            "unique": true,
        }],
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == 11000
    )
}

/// The duplicate-key message names the violated index, which is how the
/// caller learns which field collided.
fn duplicate_key_message(err: &mongodb::error::Error) -> Option<&str> {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == 11000 => {
            Some(we.message.as_str())
        }
        _ => None,
    }
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "createdAt": -1 }).build()
}

fn case_insensitive(query: &str) -> Document {
    doc! { "$regex": regex::escape(query), "$options": "i" }
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

// === Stored document models ===
//
// Same shape as the domain structs, but timestamps as BSON datetimes so
// `createdAt` sorts/compares natively in queries.

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MongoUser {
    id: String,
    username: String,
    email: String,
    password: String,
    profile_id: Option<String>,
    followers: Vec<String>,
    following: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MongoProfile {
    id: String,
    user_id: String,
    fullname: Option<String>,
    username: Option<String>,
    mobilenumber: Option<String>,
    bio: Option<String>,
    gender: Option<String>,
    dateofbirth: Option<String>,
    location: Option<String>,
    profile_img: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MongoPost {
    id: String,
    user_id: String,
    desc: Option<String>,
    location: Option<String>,
    post_img: Option<String>,
    likes: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MongoComment {
    id: String,
    post_id: String,
    user_id: String,
    text: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MongoFollow {
    id: String,
    follower: String,
    following: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MongoToken {
    id: String,
    user_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<User> for MongoUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            password: u.password,
            profile_id: u.profile_id,
            followers: u.followers,
            following: u.following,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<MongoUser> for User {
    fn from(u: MongoUser) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            password: u.password,
            profile_id: u.profile_id,
            followers: u.followers,
            following: u.following,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<ProfileDetails> for MongoProfile {
    fn from(p: ProfileDetails) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            fullname: p.fullname,
            username: p.username,
            mobilenumber: p.mobilenumber,
            bio: p.bio,
            gender: p.gender,
            dateofbirth: p.dateofbirth,
            location: p.location,
            profile_img: p.profile_img,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<MongoProfile> for ProfileDetails {
    fn from(p: MongoProfile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            fullname: p.fullname,
            username: p.username,
            mobilenumber: p.mobilenumber,
            bio: p.bio,
            gender: p.gender,
            dateofbirth: p.dateofbirth,
            location: p.location,
            profile_img: p.profile_img,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<Post> for MongoPost {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            desc: p.desc,
            location: p.location,
            post_img: p.post_img,
            likes: p.likes,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<MongoPost> for Post {
    fn from(p: MongoPost) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            desc: p.desc,
            location: p.location,
            post_img: p.post_img,
            likes: p.likes,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<Comment> for MongoComment {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            user_id: c.user_id,
            text: c.text,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<MongoComment> for Comment {
    fn from(c: MongoComment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            user_id: c.user_id,
            text: c.text,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<Follow> for MongoFollow {
    fn from(f: Follow) -> Self {
        Self {
            id: f.id,
            follower: f.follower,
            following: f.following,
            created_at: f.created_at,
        }
    }
}

fn bson_now() -> Bson {
    Bson::DateTime(mongodb::bson::DateTime::from_chrono(now()))
}

#[async_trait]
impl Store for MongoStore {
    // === Users ===

    async fn insert_user(&self, user: User) -> Result<InsertUserOutcome> {
        match self.users.insert_one(MongoUser::from(user), None).await {
            Ok(_) => Ok(InsertUserOutcome::Created),
            Err(e) => match duplicate_key_message(&e) {
                Some(msg) if msg.contains("unique_email") => Ok(InsertUserOutcome::DuplicateEmail),
                Some(msg) if msg.contains("unique_username") => {
                    Ok(InsertUserOutcome::DuplicateUsername)
                }
                _ => Err(e.into()),
            },
        }
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        let found = self.users.find_one(doc! { "id": id }, None).await?;
        Ok(found.map(User::from))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let found = self.users.find_one(doc! { "email": email }, None).await?;
        Ok(found.map(User::from))
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let found = self
            .users
            .find_one(doc! { "username": username }, None)
            .await?;
        Ok(found.map(User::from))
    }

    async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        let cursor = self
            .users
            .find(doc! { "id": { "$in": ids.to_vec() } }, None)
            .await?;
        let found: Vec<MongoUser> = cursor.try_collect().await?;
        Ok(found.into_iter().map(User::from).collect())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let cursor = self
            .users
            .find(doc! { "username": case_insensitive(query) }, None)
            .await?;
        let found: Vec<MongoUser> = cursor.try_collect().await?;
        Ok(found.into_iter().map(User::from).collect())
    }

    async fn set_user_profile(&self, user_id: &str, profile_id: Option<String>) -> Result<()> {
        let value = profile_id.map_or(Bson::Null, Bson::String);
        self.users
            .update_one(
                doc! { "id": user_id },
                doc! { "$set": { "profileId": value, "updatedAt": bson_now() } },
                None,
            )
            .await?;
        Ok(())
    }

    // === Profiles ===

    async fn insert_profile(&self, profile: ProfileDetails) -> Result<()> {
        self.profiles
            .insert_one(MongoProfile::from(profile), None)
            .await?;
        Ok(())
    }

    async fn profile_by_id(&self, id: &str) -> Result<Option<ProfileDetails>> {
        let found = self.profiles.find_one(doc! { "id": id }, None).await?;
        Ok(found.map(ProfileDetails::from))
    }

    async fn profile_by_user(&self, user_id: &str) -> Result<Option<ProfileDetails>> {
        let found = self
            .profiles
            .find_one(doc! { "userId": user_id }, None)
            .await?;
        Ok(found.map(ProfileDetails::from))
    }

    async fn all_profiles(&self) -> Result<Vec<ProfileDetails>> {
        let cursor = self.profiles.find(None, None).await?;
        let found: Vec<MongoProfile> = cursor.try_collect().await?;
        Ok(found.into_iter().map(ProfileDetails::from).collect())
    }

    async fn profile_username_taken(&self, username: &str, exclude_user: &str) -> Result<bool> {
        let found = self
            .profiles
            .find_one(
                doc! { "username": username, "userId": { "$ne": exclude_user } },
                None,
            )
            .await?;
        Ok(found.is_some())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<Option<ProfileDetails>> {
        let mut set = Document::new();
        if let Some(v) = patch.fullname {
            set.insert("fullname", v);
        }
        if let Some(v) = patch.username {
            set.insert("username", v);
        }
        if let Some(v) = patch.mobilenumber {
            set.insert("mobilenumber", v);
        }
        if let Some(v) = patch.bio {
            set.insert("bio", v);
        }
        if let Some(v) = patch.gender {
            set.insert("gender", v);
        }
        if let Some(v) = patch.dateofbirth {
            set.insert("dateofbirth", v);
        }
        if let Some(v) = patch.location {
            set.insert("location", v);
        }
        if let Some(v) = patch.profile_img {
            set.insert("profileImg", v.map_or(Bson::Null, Bson::String));
        }
        set.insert("updatedAt", bson_now());

        let updated = self
            .profiles
            .find_one_and_update(
                doc! { "userId": user_id },
                doc! { "$set": set },
                return_updated(),
            )
            .await?;
        Ok(updated.map(ProfileDetails::from))
    }

    async fn delete_profile(&self, id: &str) -> Result<()> {
        self.profiles.delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }

    async fn search_profiles(&self, query: &str) -> Result<Vec<ProfileDetails>> {
        let pattern = case_insensitive(query);
        let cursor = self
            .profiles
            .find(
                doc! { "$or": [
                    { "fullname": pattern.clone() },
                    { "username": pattern },
                ]},
                None,
            )
            .await?;
        let found: Vec<MongoProfile> = cursor.try_collect().await?;
        Ok(found.into_iter().map(ProfileDetails::from).collect())
    }

    // === Posts ===

    async fn insert_post(&self, post: Post) -> Result<()> {
        self.posts.insert_one(MongoPost::from(post), None).await?;
        Ok(())
    }

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>> {
        let found = self.posts.find_one(doc! { "id": id }, None).await?;
        Ok(found.map(Post::from))
    }

    async fn all_posts(&self) -> Result<Vec<Post>> {
        let cursor = self.posts.find(None, newest_first()).await?;
        let found: Vec<MongoPost> = cursor.try_collect().await?;
        Ok(found.into_iter().map(Post::from).collect())
    }

    async fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>> {
        let cursor = self
            .posts
            .find(doc! { "userId": user_id }, newest_first())
            .await?;
        let found: Vec<MongoPost> = cursor.try_collect().await?;
        Ok(found.into_iter().map(Post::from).collect())
    }

    async fn posts_by_users(&self, user_ids: &[String]) -> Result<Vec<Post>> {
        let cursor = self
            .posts
            .find(doc! { "userId": { "$in": user_ids.to_vec() } }, newest_first())
            .await?;
        let found: Vec<MongoPost> = cursor.try_collect().await?;
        Ok(found.into_iter().map(Post::from).collect())
    }

    async fn posts_excluding_user(
        &self,
        user_id: &str,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        // Sorting on the raw likes array would compare its elements, so the
        // like count is materialized for the sort instead.
        let pipeline = vec![
            doc! { "$match": { "userId": { "$ne": user_id } } },
            doc! { "$addFields": { "likeCount": { "$size": "$likes" } } },
            doc! { "$sort": { "createdAt": -1, "likeCount": -1 } },
            doc! { "$skip": i64::try_from(skip).unwrap_or(i64::MAX) },
            doc! { "$limit": limit.max(1) },
        ];
        let cursor = self.posts.aggregate(pipeline, None).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        let mut posts = Vec::with_capacity(docs.len());
        for d in docs {
            posts.push(mongodb::bson::from_document::<MongoPost>(d)?.into());
        }
        Ok(posts)
    }

    async fn count_posts_excluding_user(&self, user_id: &str) -> Result<u64> {
        let count = self
            .posts
            .count_documents(doc! { "userId": { "$ne": user_id } }, None)
            .await?;
        Ok(count)
    }

    async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Option<Post>> {
        let mut set = Document::new();
        if let Some(v) = patch.desc {
            set.insert("desc", v);
        }
        if let Some(v) = patch.location {
            set.insert("location", v);
        }
        if let Some(v) = patch.post_img {
            set.insert("postImg", v);
        }
        set.insert("updatedAt", bson_now());

        let updated = self
            .posts
            .find_one_and_update(doc! { "id": id }, doc! { "$set": set }, return_updated())
            .await?;
        Ok(updated.map(Post::from))
    }

    async fn delete_post(&self, id: &str) -> Result<()> {
        self.posts.delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }

    async fn add_like(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome> {
        // Membership check and insert in one guarded update.
        let result = self
            .posts
            .update_one(
                doc! { "id": post_id, "likes": { "$ne": user_id } },
                doc! { "$addToSet": { "likes": user_id } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Ok(match self.post_by_id(post_id).await? {
                None => LikeOutcome::Missing,
                Some(_) => LikeOutcome::AlreadyLiked,
            });
        }
        match self.post_by_id(post_id).await? {
            Some(post) => Ok(LikeOutcome::Liked(post.likes.len())),
            None => Ok(LikeOutcome::Missing),
        }
    }

    async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome> {
        let result = self
            .posts
            .update_one(
                doc! { "id": post_id, "likes": user_id },
                doc! { "$pull": { "likes": user_id } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Ok(match self.post_by_id(post_id).await? {
                None => LikeOutcome::Missing,
                Some(_) => LikeOutcome::NotLiked,
            });
        }
        match self.post_by_id(post_id).await? {
            Some(post) => Ok(LikeOutcome::Unliked(post.likes.len())),
            None => Ok(LikeOutcome::Missing),
        }
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<Post>> {
        let pattern = case_insensitive(query);
        let cursor = self
            .posts
            .find(
                doc! { "$or": [
                    { "desc": pattern.clone() },
                    { "location": pattern },
                ]},
                newest_first(),
            )
            .await?;
        let found: Vec<MongoPost> = cursor.try_collect().await?;
        Ok(found.into_iter().map(Post::from).collect())
    }

    // === Comments ===

    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        self.comments
            .insert_one(MongoComment::from(comment), None)
            .await?;
        Ok(())
    }

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>> {
        let found = self.comments.find_one(doc! { "id": id }, None).await?;
        Ok(found.map(Comment::from))
    }

    async fn comments_by_post(&self, post_id: &str) -> Result<Vec<Comment>> {
        let cursor = self
            .comments
            .find(doc! { "postId": post_id }, newest_first())
            .await?;
        let found: Vec<MongoComment> = cursor.try_collect().await?;
        Ok(found.into_iter().map(Comment::from).collect())
    }

    async fn update_comment_text(&self, id: &str, text: &str) -> Result<Option<Comment>> {
        let updated = self
            .comments
            .find_one_and_update(
                doc! { "id": id },
                doc! { "$set": { "text": text, "updatedAt": bson_now() } },
                return_updated(),
            )
            .await?;
        Ok(updated.map(Comment::from))
    }

    async fn delete_comment(&self, id: &str) -> Result<()> {
        self.comments.delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }

    async fn delete_comments_by_post(&self, post_id: &str) -> Result<u64> {
        let result = self
            .comments
            .delete_many(doc! { "postId": post_id }, None)
            .await?;
        Ok(result.deleted_count)
    }

    // === Follows ===

    async fn create_follow(&self, follower: &str, following: &str) -> Result<FollowOutcome> {
        let edge = Follow::new(follower.to_string(), following.to_string());
        match self.follows.insert_one(MongoFollow::from(edge), None).await {
            Ok(_) => {}
            Err(e) if is_duplicate_key(&e) => return Ok(FollowOutcome::AlreadyFollowing),
            Err(e) => return Err(e.into()),
        }

        // The edge above is the source of truth; these memberships are
        // idempotent ($addToSet), so re-running the operation repairs a
        // partially applied pair.
        self.users
            .update_one(
                doc! { "id": follower },
                doc! { "$addToSet": { "following": following } },
                None,
            )
            .await?;
        self.users
            .update_one(
                doc! { "id": following },
                doc! { "$addToSet": { "followers": follower } },
                None,
            )
            .await?;
        Ok(FollowOutcome::Created)
    }

    async fn delete_follow(&self, follower: &str, following: &str) -> Result<UnfollowOutcome> {
        let result = self
            .follows
            .delete_one(doc! { "follower": follower, "following": following }, None)
            .await?;
        if result.deleted_count == 0 {
            return Ok(UnfollowOutcome::NotFollowing);
        }

        self.users
            .update_one(
                doc! { "id": follower },
                doc! { "$pull": { "following": following } },
                None,
            )
            .await?;
        self.users
            .update_one(
                doc! { "id": following },
                doc! { "$pull": { "followers": follower } },
                None,
            )
            .await?;
        Ok(UnfollowOutcome::Removed)
    }

    // === Tokens ===

    async fn insert_token(&self, token: &str, data: TokenData) -> Result<()> {
        let doc = MongoToken {
            id: token.to_string(),
            user_id: data.user_id,
            created_at: data.created_at,
        };
        self.tokens.insert_one(doc, None).await?;
        Ok(())
    }

    async fn token_data(&self, token: &str) -> Result<Option<TokenData>> {
        let found = self.tokens.find_one(doc! { "id": token }, None).await?;
        Ok(found.map(|t| TokenData {
            user_id: t.user_id,
            created_at: t.created_at,
        }))
    }

    async fn delete_token(&self, token: &str) -> Result<()> {
        self.tokens.delete_one(doc! { "id": token }, None).await?;
        Ok(())
    }
}
