use flock_database::DatabaseError;
use flock_kernel::security::password::PasswordError;
use flock_kernel::server::ApiError;
use std::borrow::Cow;

/// A specialized [`AccountsError`] enum of this crate.
#[flock_derive::flock_error]
pub enum AccountsError {
    /// Input that breaks an account rule. The message is shown to the caller.
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Missing or unknown credentials.
    #[error("{message}")]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}")]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Accounts storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Credential error{}: {source}", format_context(.context))]
    Password { source: PasswordError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal accounts error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl AccountsError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }

    pub(crate) fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized { message: message.into(), context: None }
    }
}

impl From<AccountsError> for ApiError {
    fn from(err: AccountsError) -> Self {
        match err {
            AccountsError::Validation { message, context } => Self::Validation { message, context },
            AccountsError::Unauthorized { message, context } => {
                Self::Unauthorized { message, context }
            },
            AccountsError::NotFound { message, context } => Self::NotFound { message, context },
            AccountsError::Database { source, context } => Self::Database { source, context },
            AccountsError::Password { source, context } => Self::Password { source, context },
            AccountsError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
