// HTTP surface tests: auth gates, author binding, ownership, validation.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use microblog::app_state::AppState;
use microblog::config::{Config, DatabaseConfig, EventsConfig, ServerConfig};
use microblog::events::ContentEvent;
use microblog::models::User;
use microblog::routes::create_router;
use microblog::store::{ContentStore, SqliteStore};

struct TestApp {
    state: AppState,
    router: Router,
    auth: User,
    auth_token: String,
    boba: User,
    boba_token: String,
}

fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        events: EventsConfig { capacity: 16 },
    }
}

async fn setup() -> TestApp {
    let store: Arc<dyn ContentStore> = Arc::new(SqliteStore::new_in_memory().await.unwrap());
    let auth = store.create_user("auth").await.unwrap();
    let boba = store.create_user("boba").await.unwrap();
    let auth_token = store.create_session(auth.id).await.unwrap();
    let boba_token = store.create_session(boba.id).await.unwrap();
    store
        .create_group("Test group", "test_slug", "group for tests")
        .await
        .unwrap();

    let state = AppState::with_store(store, test_config());
    let router = create_router(state.clone());
    TestApp {
        state,
        router,
        auth,
        auth_token,
        boba,
        boba_token,
    }
}

impl TestApp {
    async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let app = setup().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn anonymous_create_post_redirects_to_login_with_return_path() {
    let app = setup().await;
    let response = app.post_json("/posts", None, json!({"text": "hello"})).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=/posts");

    // The gate fires before persistence: the store stays empty.
    let home = json_body(app.get("/posts").await).await;
    assert_eq!(home["total_items"], 0);
}

#[tokio::test]
async fn anonymous_following_feed_redirects_to_login() {
    let app = setup().await;
    let response = app.get("/feed/following").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=/feed/following");
}

#[tokio::test]
async fn create_post_binds_the_viewer_as_author() {
    let app = setup().await;
    // A caller-supplied author field is not part of the schema and is ignored.
    let response = app
        .post_json(
            "/posts",
            Some(&app.auth_token),
            json!({"text": "my post", "group": "test_slug", "author_id": app.boba.id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profiles/auth/posts");

    let profile = json_body(app.get("/profiles/auth/posts").await).await;
    assert_eq!(profile["page"]["total_items"], 1);
    assert_eq!(
        profile["page"]["items"][0]["author_id"],
        json!(app.auth.id)
    );
    assert_eq!(profile["page"]["items"][0]["text"], "my post");
}

#[tokio::test]
async fn create_post_publishes_an_invalidation_event() {
    let app = setup().await;
    let mut events = app.state.events.subscribe();

    app.post_json("/posts", Some(&app.auth_token), json!({"text": "cached out"}))
        .await;

    match events.try_recv().unwrap() {
        ContentEvent::PostCreated { author_id, .. } => assert_eq!(author_id, app.auth.id),
    }
}

#[tokio::test]
async fn empty_post_text_fails_validation_with_field_message() {
    let app = setup().await;
    let response = app
        .post_json("/posts", Some(&app.auth_token), json!({"text": "  "}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["text"].as_str().unwrap().contains("empty"));

    let home = json_body(app.get("/posts").await).await;
    assert_eq!(home["total_items"], 0);
}

#[tokio::test]
async fn unknown_group_slug_fails_validation_on_the_group_field() {
    let app = setup().await;
    let response = app
        .post_json(
            "/posts",
            Some(&app.auth_token),
            json!({"text": "hello", "group": "missing_slug"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["group"].as_str().unwrap().contains("missing_slug"));
}

#[tokio::test]
async fn non_author_edit_redirects_and_leaves_the_post_unchanged() {
    let app = setup().await;
    let post = app
        .state
        .store
        .create_post(app.auth.id, "original text", None, None)
        .await
        .unwrap();

    let response = app
        .post_json(
            &format!("/posts/{}/edit", post.id),
            Some(&app.boba_token),
            json!({"text": "hijacked"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let detail = json_body(app.get(&format!("/posts/{}", post.id)).await).await;
    assert_eq!(detail["post"]["text"], "original text");
}

#[tokio::test]
async fn author_edit_updates_in_place() {
    let app = setup().await;
    let post = app
        .state
        .store
        .create_post(app.auth.id, "original text", None, None)
        .await
        .unwrap();

    let response = app
        .post_json(
            &format!("/posts/{}/edit", post.id),
            Some(&app.auth_token),
            json!({"text": "revised text", "group": "test_slug"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let detail = json_body(app.get(&format!("/posts/{}", post.id)).await).await;
    assert_eq!(detail["post"]["text"], "revised text");
    assert_eq!(detail["post"]["author_id"], json!(app.auth.id));
}

#[tokio::test]
async fn edit_of_unknown_post_is_not_found() {
    let app = setup().await;
    let response = app
        .post_json("/posts/999/edit", Some(&app.auth_token), json!({"text": "x"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_flow_binds_author_and_returns_to_the_post() {
    let app = setup().await;
    let post = app
        .state
        .store
        .create_post(app.auth.id, "post", None, None)
        .await
        .unwrap();

    let empty = app
        .post_json(
            &format!("/posts/{}/comments", post.id),
            Some(&app.boba_token),
            json!({"text": ""}),
        )
        .await;
    assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post_json(
            &format!("/posts/{}/comments", post.id),
            Some(&app.boba_token),
            json!({"text": "good point"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let detail = json_body(app.get(&format!("/posts/{}", post.id)).await).await;
    assert_eq!(detail["comments"][0]["text"], "good point");
    assert_eq!(detail["comments"][0]["author_id"], json!(app.boba.id));
}

#[tokio::test]
async fn comment_on_unknown_post_is_not_found() {
    let app = setup().await;
    let response = app
        .post_json("/posts/999/comments", Some(&app.boba_token), json!({"text": "hi"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn follow_and_unfollow_round_trip_through_the_profile() {
    let app = setup().await;
    app.state
        .store
        .create_post(app.auth.id, "post", None, None)
        .await
        .unwrap();

    let response = app
        .post_json("/profiles/auth/follow", Some(&app.boba_token), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profiles/auth/posts");

    let mut request = Request::builder()
        .uri("/feed/following")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.boba_token));
    let feed = app
        .router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let feed = json_body(feed).await;
    assert_eq!(feed["total_items"], 1);

    let response = app
        .post_json("/profiles/auth/unfollow", Some(&app.boba_token), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    request = Request::builder()
        .uri("/feed/following")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.boba_token));
    let feed = app
        .router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let feed = json_body(feed).await;
    assert_eq!(feed["total_items"], 0);
}

#[tokio::test]
async fn follow_of_unknown_username_is_not_found() {
    let app = setup().await;
    let response = app
        .post_json("/profiles/nobody/follow", Some(&app.boba_token), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unfollow_of_unknown_username_is_not_found() {
    let app = setup().await;
    let response = app
        .post_json("/profiles/nobody/unfollow", Some(&app.boba_token), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_group_feed_is_not_found() {
    let app = setup().await;
    let response = app.get("/groups/missing/posts").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unparsable_page_query_defaults_to_page_one() {
    let app = setup().await;
    app.state
        .store
        .create_post(app.auth.id, "post", None, None)
        .await
        .unwrap();

    let body = json_body(app.get("/posts?page=abc").await).await;
    assert_eq!(body["number"], 1);
    assert_eq!(body["total_items"], 1);
}

#[tokio::test]
async fn profile_feed_reports_the_viewer_following_flag() {
    let app = setup().await;
    app.state
        .store
        .insert_follow(app.boba.id, app.auth.id)
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/profiles/auth/posts")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.boba_token))
        .body(Body::empty())
        .unwrap();
    let seen_by_boba = json_body(app.router.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(seen_by_boba["following"], true);

    let seen_anonymously = json_body(app.get("/profiles/auth/posts").await).await;
    assert_eq!(seen_anonymously["following"], false);
}
