//! Argon2id password hashing and opaque API token generation.
//!
//! Hashing is CPU bound, so both helpers hop onto the blocking pool.

use crate::safe_nanoid;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use flock_domain::constants::TOKEN_LENGTH;
use std::borrow::Cow;

const SALT_LEN: usize = 16;

#[flock_derive::flock_error]
pub enum PasswordError {
    #[error("Password hashing error{}: {message}", format_context(.context))]
    Hash { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Internal password error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Hashes `password` into a PHC string (`$argon2id$...`) with a random salt.
///
/// # Errors
/// Returns an error if the system RNG is unavailable or the hasher rejects its input.
pub async fn hash_password(password: impl Into<String>) -> Result<String, PasswordError> {
    let password = password.into();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| PasswordError::Internal {
            message: e.to_string().into(),
            context: Some("Hashing task failed".into()),
        })?
}

/// Checks `password` against a stored PHC string. A malformed hash never verifies.
///
/// # Errors
/// Returns an error only if the blocking task could not complete.
pub async fn verify_password(
    password: impl Into<String>,
    phc: impl Into<String>,
) -> Result<bool, PasswordError> {
    let password = password.into();
    let phc = phc.into();
    tokio::task::spawn_blocking(move || verify_blocking(&password, &phc)).await.map_err(|e| {
        PasswordError::Internal {
            message: e.to_string().into(),
            context: Some("Verification task failed".into()),
        }
    })
}

/// A fresh opaque API token.
#[must_use]
pub fn generate_token() -> String {
    safe_nanoid!(TOKEN_LENGTH)
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let mut bytes = [0u8; SALT_LEN];
    getrandom::fill(&mut bytes).map_err(|e| PasswordError::Hash {
        message: e.to_string().into(),
        context: Some("Collecting salt entropy".into()),
    })?;
    let salt = SaltString::encode_b64(&bytes).map_err(|e| PasswordError::Hash {
        message: e.to_string().into(),
        context: Some("Encoding salt".into()),
    })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash { message: e.to_string().into(), context: None })
}

fn verify_blocking(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .is_ok_and(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let phc = hash_password("correct horse").await.unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", phc.clone()).await.unwrap());
        assert!(!verify_password("wrong horse", phc).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash_password("secret123").await.unwrap();
        let b = hash_password("secret123").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string").await.unwrap());
    }

    #[test]
    fn tokens_have_fixed_length() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert_ne!(token, generate_token());
    }
}
