use crate::SAFE_ALPHABET;
use std::borrow::Cow;

#[flock_derive::flock_error]
pub enum ResourceGuardError {
    #[error("Resource validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Utilities for safe resource handling and ID validation.
#[derive(Debug)]
pub struct ResourceGuard;

impl ResourceGuard {
    /// Validates an id taken from a path or body against a specific table and returns its bare key.
    ///
    /// Prevents "ID Spoofing" where a caller provides an id from a different table
    /// (e.g., providing a `comment:...` id to a post endpoint), and keeps anything outside
    /// the id alphabet away from the query layer.
    ///
    /// # Arguments
    /// * `id` - The id to verify (e.g., `"post:Ab3xK9mPq2Rt"` or just `"Ab3xK9mPq2Rt"`)
    /// * `expected_table` - The table the id must belong to (e.g., `"post"`)
    ///
    /// # Errors
    /// Returns an error if the table does not match, the key is empty, or the key contains
    /// characters outside [`SAFE_ALPHABET`].
    pub fn verify<I, T>(id: I, expected_table: T) -> Result<String, ResourceGuardError>
    where
        I: AsRef<str>,
        T: AsRef<str>,
    {
        let id_ref = id.as_ref().trim();
        let table_ref = expected_table.as_ref();

        let key = match id_ref.split_once(':') {
            Some((table, key)) if table == table_ref => key,
            Some((table, _)) => {
                return Err(ResourceGuardError::Validation {
                    message: format!("Expected '{table_ref}', got '{table}'").into(),
                    context: Some("ID table mismatch".into()),
                });
            },
            None => id_ref,
        };

        if key.is_empty() {
            return Err(ResourceGuardError::Validation {
                message: "Empty id".into(),
                context: Some(table_ref.to_owned().into()),
            });
        }
        if !key.chars().all(|ch| SAFE_ALPHABET.contains(&ch)) {
            return Err(ResourceGuardError::Validation {
                message: format!("Malformed id '{key}'").into(),
                context: Some(table_ref.to_owned().into()),
            });
        }

        Ok(key.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_verification() {
        // Correct table
        assert_eq!(ResourceGuard::verify("post:Ab3xK9", "post").unwrap(), "Ab3xK9");

        // Bare key
        assert_eq!(ResourceGuard::verify("Ab3xK9", "post").unwrap(), "Ab3xK9");

        // Malicious mismatch
        let err = ResourceGuard::verify("account:Ab3xK9", "post");
        assert!(err.is_err());
    }

    #[test]
    fn rejects_injection_characters() {
        assert!(ResourceGuard::verify("abc; DELETE post", "post").is_err());
        assert!(ResourceGuard::verify("post:", "post").is_err());
        assert!(ResourceGuard::verify("", "post").is_err());
        // Ambiguous characters never appear in generated ids.
        assert!(ResourceGuard::verify("O0l1", "post").is_err());
    }
}
