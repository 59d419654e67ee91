use super::ApiState;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::{Json, response::IntoResponse};
use flock_derive::{api_handler, api_model};
use flock_domain::constants::SYSTEM_TAG;
use std::sync::LazyLock;
use std::time::Instant;
use tracing::warn;

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

#[api_model]
/// Liveness of the server and its database
pub(crate) struct HealthResponse {
    /// `up`, or `degraded` when the database does not answer
    status: &'static str,
    /// `up` or `down`
    database: &'static str,
    version: &'static str,
    /// Seconds since the first health check
    uptime: u64,
}

#[api_handler(
    get,
    path = "/health",
    responses(
        (status = OK, description = "Server and database are up", body = HealthResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database unreachable", body = HealthResponse),
    ),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let database_up = match state.database.health().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    let (status, body) = if database_up {
        (StatusCode::OK, HealthResponse::new("up", "up"))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, HealthResponse::new("degraded", "down"))
    };

    (
        status,
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}

impl HealthResponse {
    fn new(status: &'static str, database: &'static str) -> Self {
        Self {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
            uptime: START_TIME.elapsed().as_secs(),
        }
    }
}
