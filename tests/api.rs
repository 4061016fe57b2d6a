use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use perch::config::Config;
use perch::store::MemoryStore;
use perch::{app, AppState};

fn server() -> TestServer {
    let config = Config {
        port: 0,
        mongo_uri: None,
        mongo_db: "perch".into(),
        token_expiration_hours: 720,
        upload_dir: std::env::temp_dir().join(format!("perch-test-{}", Uuid::new_v4())),
    };
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config: Arc::new(config),
    };
    TestServer::new(app(state)).unwrap()
}

/// Registers a user and returns (user_id, token).
async fn signup(server: &TestServer, username: &str) -> (String, String) {
    let res = server
        .post("/api/users/signup")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter2",
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

async fn create_post(server: &TestServer, token: &str, desc: &str) -> String {
    let form = MultipartForm::new().add_text("desc", desc.to_string());
    let res = server
        .post("/api/posts")
        .add_header("Authorization", bearer(token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn signup_signin_me_flow() {
    let server = server();
    let (user_id, token) = signup(&server, "alice").await;

    let res = server
        .get("/api/users/me")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let me: Value = res.json();
    assert_eq!(me["id"], user_id.as_str());
    assert_eq!(me["email"], "alice@example.com");
    // Signup creates an empty profile carrying the login username.
    assert_eq!(me["profile"]["username"], "alice");

    let res = server
        .post("/api/users/signin")
        .json(&json!({ "email": "alice@example.com", "password": "hunter2" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn signup_rejects_duplicates() {
    let server = server();
    signup(&server, "alice").await;

    let res = server
        .post("/api/users/signup")
        .json(&json!({
            "username": "someoneelse",
            "email": "alice@example.com",
            "password": "pw",
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Email already in use");

    let res = server
        .post("/api/users/signup")
        .json(&json!({
            "username": "alice",
            "email": "fresh@example.com",
            "password": "pw",
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Username already taken");

    // Neither rejected signup left an account behind.
    let res = server
        .post("/api/users/signin")
        .json(&json!({ "email": "fresh@example.com", "password": "pw" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signin_failures() {
    let server = server();
    signup(&server, "alice").await;

    let res = server
        .post("/api/users/signin")
        .json(&json!({ "email": "nobody@example.com", "password": "pw" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server
        .post("/api/users/signin")
        .json(&json!({ "email": "alice@example.com", "password": "wrong" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let server = server();
    let (_, token) = signup(&server, "alice").await;
    create_post(&server, &token, "hello").await;

    let res = server.get("/api/users/me").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = server
        .get("/api/users/me")
        .add_header("Authorization", "Bearer garbage")
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    // Public reads go through regardless of the token presented.
    let res = server
        .get("/api/posts")
        .add_header("Authorization", "Bearer garbage")
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let server = server();
    let (_, token) = signup(&server, "alice").await;

    let res = server
        .post("/api/auth/logout")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server
        .get("/api/users/me")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn follow_and_unfollow_flow() {
    let server = server();
    let (alice_id, alice_token) = signup(&server, "alice").await;
    let (bob_id, _) = signup(&server, "bob").await;

    let res = server
        .post(&format!("/api/follows/{bob_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server.get(&format!("/api/follows/{bob_id}/followers")).await;
    let body: Value = res.json();
    let followers = body["data"].as_array().unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0]["id"], alice_id.as_str());
    assert_eq!(followers[0]["username"], "alice");

    let res = server
        .get(&format!("/api/follows/{alice_id}/following"))
        .await;
    let body: Value = res.json();
    assert_eq!(body["data"][0]["id"], bob_id.as_str());

    // Double follow and self follow are both rejected.
    let res = server
        .post(&format!("/api/follows/{bob_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Already following this user");

    let res = server
        .post(&format!("/api/follows/{alice_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server
        .post(&format!("/api/follows/{}", Uuid::new_v4()))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server
        .delete(&format!("/api/follows/{bob_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server.get(&format!("/api/follows/{bob_id}/followers")).await;
    let body: Value = res.json();
    assert!(body["data"].as_array().unwrap().is_empty());

    let res = server
        .delete(&format!("/api/follows/{bob_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Not following this user");
}

#[tokio::test]
async fn post_crud_is_owner_only() {
    let server = server();
    let (alice_id, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;
    let post_id = create_post(&server, &alice_token, "first post").await;

    let res = server.get(&format!("/api/posts/{post_id}")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["data"]["desc"], "first post");
    assert_eq!(body["data"]["user"]["id"], alice_id.as_str());
    assert_eq!(body["data"]["user"]["username"], "alice");

    let form = MultipartForm::new().add_text("desc", "hijacked");
    let res = server
        .put(&format!("/api/posts/{post_id}"))
        .add_header("Authorization", bearer(&bob_token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = server
        .delete(&format!("/api/posts/{post_id}"))
        .add_header("Authorization", bearer(&bob_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let form = MultipartForm::new().add_text("desc", "edited");
    let res = server
        .put(&format!("/api/posts/{post_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["data"]["desc"], "edited");

    let res = server
        .delete(&format!("/api/posts/{post_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server.get(&format!("/api/posts/{post_id}")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_post_removes_its_comments() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;
    let post_id = create_post(&server, &alice_token, "discuss").await;
    let other_post = create_post(&server, &alice_token, "unrelated").await;

    server
        .post("/api/comments")
        .add_header("Authorization", bearer(&bob_token))
        .json(&json!({ "postId": post_id, "text": "nice" }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/comments")
        .add_header("Authorization", bearer(&bob_token))
        .json(&json!({ "postId": other_post, "text": "other thread" }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete(&format!("/api/posts/{post_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await
        .assert_status(StatusCode::OK);

    let res = server.get(&format!("/api/posts/{post_id}")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server.get(&format!("/api/comments/post/{post_id}")).await;
    let body: Value = res.json();
    assert!(body["data"].as_array().unwrap().is_empty());

    // The sibling thread is untouched.
    let res = server.get(&format!("/api/comments/post/{other_post}")).await;
    let body: Value = res.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn likes_toggle_exactly_once() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;
    let post_id = create_post(&server, &alice_token, "likeable").await;

    let res = server
        .post(&format!("/api/posts/{post_id}/like"))
        .add_header("Authorization", bearer(&bob_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["likesCount"], 1);

    let res = server
        .post(&format!("/api/posts/{post_id}/like"))
        .add_header("Authorization", bearer(&bob_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Post already liked");

    let res = server
        .post(&format!("/api/posts/{post_id}/unlike"))
        .add_header("Authorization", bearer(&bob_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["likesCount"], 0);

    let res = server
        .post(&format!("/api/posts/{post_id}/unlike"))
        .add_header("Authorization", bearer(&bob_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Post not liked yet");

    let res = server
        .post(&format!("/api/posts/{}/like", Uuid::new_v4()))
        .add_header("Authorization", bearer(&bob_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_updates_are_author_only() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;
    let post_id = create_post(&server, &alice_token, "thread").await;

    let res = server
        .post("/api/comments")
        .add_header("Authorization", bearer(&bob_token))
        .json(&json!({ "postId": post_id, "text": "first" }))
        .await;
    let body: Value = res.json();
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    // The post owner cannot edit someone else's words.
    let res = server
        .put(&format!("/api/comments/{comment_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .json(&json!({ "text": "rewritten" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = server
        .put(&format!("/api/comments/{comment_id}"))
        .add_header("Authorization", bearer(&bob_token))
        .json(&json!({ "text": "edited" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["data"]["text"], "edited");
}

#[tokio::test]
async fn comment_deletion_allows_author_and_post_owner() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;
    let (_, carol_token) = signup(&server, "carol").await;
    let post_id = create_post(&server, &alice_token, "moderated thread").await;

    let mut comment_ids = Vec::new();
    for _ in 0..2 {
        let res = server
            .post("/api/comments")
            .add_header("Authorization", bearer(&bob_token))
            .json(&json!({ "postId": post_id, "text": "spam" }))
            .await;
        let body: Value = res.json();
        comment_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    // A third party can delete nothing.
    let res = server
        .delete(&format!("/api/comments/{}", comment_ids[0]))
        .add_header("Authorization", bearer(&carol_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    // The author can delete their own comment.
    let res = server
        .delete(&format!("/api/comments/{}", comment_ids[0]))
        .add_header("Authorization", bearer(&bob_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    // The post owner can moderate the rest away.
    let res = server
        .delete(&format!("/api/comments/{}", comment_ids[1]))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server.get(&format!("/api/comments/post/{post_id}")).await;
    let body: Value = res.json();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn feed_shows_followed_users_and_self_newest_first() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (bob_id, bob_token) = signup(&server, "bob").await;
    let (_, carol_token) = signup(&server, "carol").await;

    create_post(&server, &alice_token, "mine").await;
    create_post(&server, &bob_token, "from bob").await;
    create_post(&server, &carol_token, "from carol").await;

    server
        .post(&format!("/api/follows/{bob_id}"))
        .add_header("Authorization", bearer(&alice_token))
        .await
        .assert_status(StatusCode::OK);

    let res = server
        .get("/api/feed")
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let descs: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["desc"].as_str().unwrap())
        .collect();
    // Carol is not followed; newest of the remaining two comes first.
    assert_eq!(descs, vec!["from bob", "mine"]);
}

#[tokio::test]
async fn explore_excludes_self_and_paginates() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;

    create_post(&server, &alice_token, "not in explore").await;
    for i in 0..3 {
        create_post(&server, &bob_token, &format!("bob {i}")).await;
    }

    let res = server
        .get("/api/feed/explore?page=1&limit=2")
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let posts = body["data"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["desc"], "bob 2");
    assert_eq!(body["pagination"]["totalPosts"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["hasNextPage"], true);

    let res = server
        .get("/api/feed/explore?page=2&limit=2")
        .add_header("Authorization", bearer(&alice_token))
        .await;
    let body: Value = res.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn explore_tolerates_out_of_range_pages() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;
    create_post(&server, &bob_token, "only post").await;

    // A page number at the integer limit must not blow up the offset math.
    let res = server
        .get(&format!("/api/feed/explore?page={}&limit=20", u64::MAX))
        .add_header("Authorization", bearer(&alice_token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn profile_lifecycle() {
    let server = server();
    let (_, token) = signup(&server, "alice").await;

    // The signup-created profile is already there.
    let res = server
        .get("/api/profiles/me")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["data"]["username"], "alice");
    let profile_id = body["data"]["id"].as_str().unwrap().to_string();

    let form = MultipartForm::new()
        .add_text("fullname", "Alice Wonder")
        .add_text("location", "Berlin");
    let res = server
        .put("/api/profiles")
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["data"]["fullname"], "Alice Wonder");
    assert_eq!(body["data"]["location"], "Berlin");

    let res = server.get(&format!("/api/profiles/{profile_id}")).await;
    assert_eq!(res.status_code(), StatusCode::OK);

    // Creating on top of an existing profile is rejected.
    let form = MultipartForm::new().add_text("fullname", "Again");
    let res = server
        .post("/api/profiles")
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server
        .delete("/api/profiles")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server
        .get("/api/profiles/me")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    // And a fresh one can be created afterwards.
    let form = MultipartForm::new().add_text("fullname", "Alice Reborn");
    let res = server
        .post("/api/profiles")
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn profile_display_username_is_unique() {
    let server = server();
    let (_, alice_token) = signup(&server, "alice").await;
    let (_, bob_token) = signup(&server, "bob").await;

    let form = MultipartForm::new().add_text("username", "cooluser");
    server
        .put("/api/profiles")
        .add_header("Authorization", bearer(&bob_token))
        .multipart(form)
        .await
        .assert_status(StatusCode::OK);

    let form = MultipartForm::new().add_text("username", "cooluser");
    let res = server
        .put("/api/profiles")
        .add_header("Authorization", bearer(&alice_token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Username already taken");
}

#[tokio::test]
async fn uploaded_post_images_are_served_back() {
    let server = server();
    let (_, token) = signup(&server, "alice").await;

    let bytes = vec![0x89, 0x50, 0x4e, 0x47];
    let form = MultipartForm::new().add_text("desc", "with picture").add_part(
        "postImg",
        Part::bytes(bytes.clone())
            .file_name("pic.png")
            .mime_type("image/png"),
    );
    let res = server
        .post("/api/posts")
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    let filename = body["data"]["postImg"].as_str().unwrap().to_string();
    assert!(filename.ends_with(".png"));

    let res = server.get(&format!("/post/images/{filename}")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.as_bytes().to_vec(), bytes);
}

#[tokio::test]
async fn non_image_uploads_are_rejected() {
    let server = server();
    let (_, token) = signup(&server, "alice").await;

    let form = MultipartForm::new().add_part(
        "postImg",
        Part::bytes(vec![1, 2, 3])
            .file_name("evil.exe")
            .mime_type("application/octet-stream"),
    );
    let res = server
        .post("/api/posts")
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Only image files are allowed");
}

#[tokio::test]
async fn search_users_matches_accounts_and_profiles() {
    let server = server();
    let (alice_id, _) = signup(&server, "Alice123").await;
    let (bob_id, bob_token) = signup(&server, "bob").await;
    signup(&server, "unrelated").await;

    // Bob's profile fullname also matches, so he shows up without a
    // username hit.
    let form = MultipartForm::new().add_text("fullname", "Alistair Cooke");
    server
        .put("/api/profiles")
        .add_header("Authorization", bearer(&bob_token))
        .multipart(form)
        .await
        .assert_status(StatusCode::OK);

    let res = server.get("/api/search/users?query=ali").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    let hits = body["data"].as_array().unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h["id"].as_str().unwrap()).collect();
    assert_eq!(hits.len(), 2);
    assert!(ids.contains(&alice_id.as_str()));
    assert!(ids.contains(&bob_id.as_str()));

    let res = server.get("/api/search/users").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["error"], "Search query is required");
}

#[tokio::test]
async fn search_users_deduplicates_profile_hits() {
    let server = server();
    let (alice_id, alice_token) = signup(&server, "Alice123").await;

    // Alice matches by username and by profile fullname; one result only.
    let form = MultipartForm::new().add_text("fullname", "Alice Wonder");
    server
        .put("/api/profiles")
        .add_header("Authorization", bearer(&alice_token))
        .multipart(form)
        .await
        .assert_status(StatusCode::OK);

    let res = server.get("/api/search/users?query=alice").await;
    let body: Value = res.json();
    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], alice_id.as_str());
    assert_eq!(hits[0]["profile"]["fullname"], "Alice Wonder");
}

#[tokio::test]
async fn search_posts_matches_desc_and_location() {
    let server = server();
    let (_, token) = signup(&server, "alice").await;

    create_post(&server, &token, "sunset over the bay").await;
    let form = MultipartForm::new()
        .add_text("desc", "no match here")
        .add_text("location", "Sunset Boulevard");
    server
        .post("/api/posts")
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await
        .assert_status(StatusCode::CREATED);
    create_post(&server, &token, "breakfast").await;

    let res = server.get("/api/search/posts?query=sunset").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
