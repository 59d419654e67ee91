use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use flock_accounts::MIGRATIONS;
use flock_database::Database;
use flock_domain::config::ApiConfig;
use flock_domain::registry::InitializedSlice;
use flock_event_bus::EventBus;
use flock_kernel::server::ApiState;
use serde_json::{Value, json};
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
        .session("flock", "accounts")
        .migrations(MIGRATIONS)
        .init()
        .await
        .expect("in-memory database");
    let events = EventBus::new();
    let accounts = flock_accounts::init(&config, &db, &events);

    let state = ApiState::builder()
        .config(config)
        .db(db)
        .events(events.clone())
        .register_slice(InitializedSlice::new(accounts))
        .build()
        .expect("state");

    let (router, _) = OpenApiRouter::new()
        .nest("/api/auth", flock_accounts::router())
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
}
