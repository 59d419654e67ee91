use flock_accounts::AccountsError;
use flock_database::DatabaseError;
use flock_event_bus::EventBusError;
use flock_kernel::server::ApiError;
use flock_posts::PostsError;
use std::borrow::Cow;

/// A specialized [`NotificationsError`] enum of this crate.
#[flock_derive::flock_error]
pub enum NotificationsError {
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Unknown notification, or one that belongs to someone else.
    #[error("{message}")]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Account lookup failed{}: {source}", format_context(.context))]
    Accounts { source: AccountsError, context: Option<Cow<'static, str>> },

    #[error("Post lookup failed{}: {source}", format_context(.context))]
    Posts { source: PostsError, context: Option<Cow<'static, str>> },

    #[error("Notifications storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Event subscription failed{}: {source}", format_context(.context))]
    Events { source: EventBusError, context: Option<Cow<'static, str>> },

    #[error("Internal notifications error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl NotificationsError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }
}

impl From<NotificationsError> for ApiError {
    fn from(err: NotificationsError) -> Self {
        match err {
            NotificationsError::Validation { message, context } => {
                Self::Validation { message, context }
            },
            NotificationsError::NotFound { message, context } => Self::NotFound { message, context },
            NotificationsError::Accounts { source, .. } => source.into(),
            NotificationsError::Posts { source, .. } => source.into(),
            NotificationsError::Database { source, context } => Self::Database { source, context },
            NotificationsError::Events { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            },
            NotificationsError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
