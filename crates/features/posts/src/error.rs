use flock_accounts::AccountsError;
use flock_database::DatabaseError;
use flock_kernel::server::ApiError;
use std::borrow::Cow;

/// A specialized [`PostsError`] enum of this crate.
#[flock_derive::flock_error]
pub enum PostsError {
    /// Input that breaks a post or comment rule.
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The caller does not own the post or comment.
    #[error("{message}")]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}")]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Account lookup failed{}: {source}", format_context(.context))]
    Accounts { source: AccountsError, context: Option<Cow<'static, str>> },

    #[error("Posts storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal posts error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl PostsError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { message: message.into(), context: None }
    }

    pub(crate) fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }
}

impl From<PostsError> for ApiError {
    fn from(err: PostsError) -> Self {
        match err {
            PostsError::Validation { message, context } => Self::Validation { message, context },
            PostsError::Forbidden { message, context } => Self::Forbidden { message, context },
            PostsError::NotFound { message, context } => Self::NotFound { message, context },
            PostsError::Accounts { source, .. } => source.into(),
            PostsError::Database { source, context } => Self::Database { source, context },
            PostsError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
