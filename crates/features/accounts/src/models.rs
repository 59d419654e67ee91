use crate::error::AccountsError;
use chrono::{DateTime, Utc};
use flock_derive::api_model;
use flock_kernel::clock::from_micros;
use surrealdb::types::SurrealValue;
use utoipa::IntoParams;

pub(crate) const MAX_USERNAME_LENGTH: usize = 150;
const USERNAME_SYMBOLS: &[char] = &['@', '.', '+', '-', '_'];

/// Stored shape of an account row.
#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct AccountRecord {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An account as seen by other slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.uid,
            username: record.username,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            bio: record.bio,
            profile_picture: record.profile_picture,
            created_at: from_micros(record.created_at),
            updated_at: from_micros(record.updated_at),
        }
    }
}

// --- Requests ---

#[api_model]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// URL of the profile picture.
    pub profile_picture: Option<String>,
}

impl RegisterRequest {
    pub(crate) fn validate(&self, min_password_length: usize) -> Result<(), AccountsError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.password.chars().count() < min_password_length {
            return Err(AccountsError::validation(format!(
                "Password must be at least {min_password_length} characters long."
            )));
        }
        if self.password != self.password_confirm {
            return Err(AccountsError::validation("Passwords do not match."));
        }
        Ok(())
    }
}

#[api_model]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fields left out keep their current value.
#[api_model]
#[derive(Default)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Case-insensitive substring of the username.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// --- Responses ---

#[api_model]
#[derive(Clone)]
pub struct UserDetail {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDetail {
    pub(crate) fn new(account: Account, followers_count: u64, following_count: u64) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            bio: account.bio,
            profile_picture: account.profile_picture,
            followers_count,
            following_count,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[api_model]
#[derive(Clone)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
}

impl From<Account> for UserSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            profile_picture: account.profile_picture,
        }
    }
}

#[api_model]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserDetail,
    pub token: String,
}

#[api_model]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserDetail,
}

#[api_model]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserDetail,
}

#[api_model]
pub struct FollowResponse {
    pub message: String,
    pub following_count: u64,
}

#[api_model]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// --- Validation ---

pub(crate) fn validate_username(username: &str) -> Result<(), AccountsError> {
    let length = username.chars().count();
    if length == 0 || length > MAX_USERNAME_LENGTH {
        return Err(AccountsError::validation(format!(
            "Username must be between 1 and {MAX_USERNAME_LENGTH} characters."
        )));
    }
    if !username.chars().all(|ch| ch.is_alphanumeric() || USERNAME_SYMBOLS.contains(&ch)) {
        return Err(AccountsError::validation(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), AccountsError> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.is_empty()
            && !domain.contains('@')
            && !email.chars().any(char::is_whitespace)
    });
    if valid { Ok(()) } else { Err(AccountsError::validation("Enter a valid email address.")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password: password.to_owned(),
            password_confirm: confirm.to_owned(),
            first_name: None,
            last_name: None,
            bio: None,
            profile_picture: None,
        }
    }

    #[test]
    fn usernames_allow_django_symbols() {
        assert!(validate_username("ada.lovelace+1@home_net-x").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn emails_need_local_and_domain() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(request("longenough", "longenough").validate(8).is_ok());

        let short = request("short", "short").validate(8).unwrap_err();
        assert_eq!(short.to_string(), "Password must be at least 8 characters long.");

        let mismatch = request("longenough", "different!").validate(8).unwrap_err();
        assert_eq!(mismatch.to_string(), "Passwords do not match.");
    }
}
