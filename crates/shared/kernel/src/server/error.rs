use super::state::ApiStateError;
use crate::security::password::PasswordError;
use crate::security::resource::ResourceGuardError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flock_database::DatabaseError;
use serde_json::json;
use std::borrow::Cow;
use tracing::{error, warn};

const INTERNAL_MESSAGE: &str = "Internal server error";

/// The error every handler returns. Renders as `{"error": "<message>"}`.
///
/// Client errors carry a message meant for the caller. Server errors keep their detail
/// for the log and answer with a generic message.
#[flock_derive::flock_error]
pub enum ApiError {
    /// 400: the request is malformed or breaks a business rule.
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// 401: missing or unknown credentials.
    #[error("{message}")]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// 403: the caller is not allowed to touch the resource.
    #[error("{message}")]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// 404.
    #[error("{message}")]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Database error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("State error{}: {source}", format_context(.context))]
    State { source: ApiStateError, context: Option<Cow<'static, str>> },

    #[error("Password error{}: {source}", format_context(.context))]
    Password { source: PasswordError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ApiError {
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized { message: message.into(), context: None }
    }

    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { message: message.into(), context: None }
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database { .. } | Self::State { .. } | Self::Password { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "Request failed");
            INTERNAL_MESSAGE.to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation { message: rejection.body_text().into(), context: Some("JSON body".into()) }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation {
            message: rejection.body_text().into(),
            context: Some("Query string".into()),
        }
    }
}

impl From<ResourceGuardError> for ApiError {
    fn from(err: ResourceGuardError) -> Self {
        warn!(error = %err, "Rejected resource id");
        Self::NotFound { message: "Not found.".into(), context: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_errors_expose_their_message() {
        let (status, body) = body_of(ApiError::forbidden("You can only update your own posts.")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "You can only update your own posts." }));
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let (status, body) = body_of(ApiError::from("pool exhausted on shard 3")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": INTERNAL_MESSAGE }));
    }

    #[tokio::test]
    async fn bad_resource_ids_read_as_not_found() {
        let guard = crate::security::resource::ResourceGuard::verify("comment:abc", "post");
        let (status, _) = body_of(ApiError::from(guard.unwrap_err())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
