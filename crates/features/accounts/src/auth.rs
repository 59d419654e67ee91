//! Token authentication extractors.
//!
//! Clients send `Authorization: Token <key>` (or `Bearer <key>`).

use crate::Accounts;
use crate::error::AccountsError;
use crate::models::Account;
use crate::service::{INVALID_TOKEN, NO_CREDENTIALS};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use flock_kernel::server::{ApiError, ApiState};

const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// The authenticated caller. Rejects the request with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Account);

/// The caller if a token was sent. A bad token is still a 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Account>);

impl MaybeUser {
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|account| account.id.as_str())
    }
}

impl FromRequestParts<ApiState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::from(AccountsError::unauthorized(NO_CREDENTIALS)))?;
        let accounts = state.slice::<Accounts>()?;
        Ok(Self(accounts.service.authenticate(token).await?))
    }
}

impl FromRequestParts<ApiState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(Self(None));
        };
        let accounts = state.slice::<Accounts>()?;
        Ok(Self(Some(accounts.service.authenticate(token).await?)))
    }
}

/// Pulls the key out of the `Authorization` header. `Ok(None)` when the header is absent.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AccountsError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AccountsError::unauthorized(INVALID_TOKEN))?;

    let mut pieces = value.split_whitespace();
    match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(scheme), Some(key), None)
            if SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) =>
        {
            Ok(Some(key))
        },
        (Some(scheme), None, None) if SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) => {
            Err(AccountsError::unauthorized("Invalid token header. No credentials provided."))
        },
        _ => Err(AccountsError::unauthorized(INVALID_TOKEN)),
    }
}
