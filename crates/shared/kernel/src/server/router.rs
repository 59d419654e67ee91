use super::{ApiState, health};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Routes that do not belong to any slice (`/health`).
pub fn system_router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(health::health_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use flock_database::Database;
    use flock_domain::config::ApiConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_database_without_caching() {
        let db = Database::builder().url("mem://").session("flock", "health").init().await.unwrap();
        let state = ApiState::builder().config(ApiConfig::default()).db(db).build().unwrap();
        let (router, _) = system_router().with_state(state).split_for_parts();

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "no-store, no-cache, must-revalidate"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "up");
        assert_eq!(body["database"], "up");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
