use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use flock_server::Server;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

async fn app() -> Router {
    Server::builder().build().await.expect("server").router()
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
            "password_confirm": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (body["user"]["id"].as_str().unwrap().to_owned(), body["token"].as_str().unwrap().to_owned())
}

#[tokio::test]
async fn health_is_served() {
    let app = app().await;

    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
}

#[tokio::test]
async fn every_slice_is_registered() {
    let server = Server::builder().build().await.expect("server");
    assert_eq!(server.state().slice_names(), vec!["accounts", "notifications", "posts"]);
}

#[tokio::test]
async fn api_docs_are_served() {
    let app = app().await;
    let response = app
        .oneshot(Request::builder().uri("/api/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn errors_are_json() {
    let app = app().await;

    let (status, body) = call(&app, "GET", "/api/feed", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (_, token) = register(&app, "ada").await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/posts")
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn follow_post_feed_and_notify() {
    let app = app().await;
    let (ada_id, ada) = register(&app, "ada").await;
    let (_, grace) = register(&app, "grace").await;

    let (status, _) = call(&app, "POST", &format!("/api/auth/follow/{ada_id}"), Some(&grace), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, post) =
        call(&app, "POST", "/api/posts", Some(&ada), Some(json!({ "content": "Hello @grace" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, feed) = call(&app, "GET", "/api/feed", Some(&grace), None).await;
    assert_eq!(feed["count"], 1);
    assert_eq!(feed["posts"][0]["id"], post["id"]);

    let (_, explore) = call(&app, "GET", "/api/explore", None, None).await;
    assert_eq!(explore["count"], 1);

    // Ada learns about the follow, Grace about the mention.
    for (token, verb) in [(&ada, "follow"), (&grace, "mention")] {
        let mut found = Value::Null;
        for _ in 0..100 {
            let (_, body) = call(&app, "GET", "/api/notifications", Some(token), None).await;
            if body["count"] == 1 {
                found = body;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(found["results"][0]["verb"], verb);
    }
}

#[tokio::test]
async fn serves_a_provided_database() {
    let db = flock_database::Database::builder()
        .url("mem://")
        .session("flock", "provided")
        .init()
        .await
        .unwrap();
    let app = Server::builder().database(db).build().await.expect("server").router();

    let (_, token) = register(&app, "ada").await;
    let (status, _) =
        call(&app, "POST", "/api/posts", Some(&token), Some(json!({ "content": "hi" }))).await;
    assert_eq!(status, StatusCode::CREATED);
}
