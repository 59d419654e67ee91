#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use flock_database::Database;
use flock_domain::config::ApiConfig;
use flock_domain::registry::InitializedSlice;
use flock_event_bus::EventBus;
use flock_kernel::server::ApiState;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;

pub struct TestApp {
    pub router: Router,
    pub events: EventBus,
}

pub async fn spawn_app() -> TestApp {
    let config = ApiConfig::default();
    let db = Database::builder()
        .url("mem://")
        .session("flock", "notifications")
        .migrations(flock_accounts::MIGRATIONS)
        .migrations(flock_posts::MIGRATIONS)
        .migrations(flock_notifications::MIGRATIONS)
        .init()
        .await
        .expect("in-memory database");
    let events = EventBus::new();
    let accounts = flock_accounts::init(&config, &db, &events);
    let posts = flock_posts::init(&config, &db, &events, &accounts);
    let notifications =
        flock_notifications::init(&config, &db, &events, &accounts, &posts).expect("notifications");

    let state = ApiState::builder()
        .config(config)
        .db(db)
        .events(events.clone())
        .register_slice(InitializedSlice::new(accounts))
        .register_slice(InitializedSlice::new(posts))
        .register_slice(InitializedSlice::new(notifications))
        .build()
        .expect("state");

    let (router, _) = OpenApiRouter::new()
        .nest("/api/auth", flock_accounts::router())
        .nest("/api/posts", flock_posts::posts_router())
        .nest("/api/comments", flock_posts::comments_router())
        .nest("/api/notifications", flock_notifications::router())
        .with_state(state)
        .split_for_parts();

    TestApp { router, events }
}

impl TestApp {
    pub async fn call(
        &self,
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

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    /// Registers `username` and returns `(id, token)`.
    pub async fn register(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .call(
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
        (
            body["user"]["id"].as_str().unwrap().to_owned(),
            body["token"].as_str().unwrap().to_owned(),
        )
    }

    /// Publishes a post and returns its id.
    pub async fn post(&self, token: &str, content: &str) -> String {
        let (status, body) =
            self.call("POST", "/api/posts", Some(token), Some(json!({ "content": content }))).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_owned()
    }

    /// Comments on `post` and returns the comment id.
    pub async fn comment(&self, token: &str, post: &str, content: &str, parent: Option<&str>) -> String {
        let (status, body) = self
            .call(
                "POST",
                &format!("/api/posts/{post}/comment"),
                Some(token),
                Some(json!({ "content": content, "parent": parent })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_owned()
    }

    /// The caller's notifications once `expected` of them exist. Listeners run in the
    /// background, so this polls for a while before giving up.
    pub async fn notifications(&self, token: &str, expected: u64) -> Value {
        for _ in 0..100 {
            let (status, body) = self.call("GET", "/api/notifications", Some(token), None).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            if body["count"].as_u64() == Some(expected) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {expected} notification(s)");
    }
}
