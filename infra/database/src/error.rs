use std::borrow::Cow;

/// Failures of the shared Flock database handle.
#[flock_derive::flock_error]
pub enum DatabaseError {
    /// The builder was finalized without a url, namespace or database name.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The engine could not be reached or never reported healthy.
    #[error("Database connection failed{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Root sign-in was refused.
    #[error("Authentication failed{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A query, bind or row decode failed inside `SurrealDB`.
    #[error("SurrealDB error{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    /// A slice script failed, or an applied script no longer matches its pinned checksum.
    #[error("Migration error{}: {message}", format_context(.context))]
    Migration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DatabaseError {
    /// Whether a write was rejected because the unique index `index` already holds the value.
    #[must_use]
    pub fn is_unique_violation(&self, index: &str) -> bool {
        let Self::Surreal { source, .. } = self else { return false };
        let message = source.to_string();
        message.contains("already contains") && message.contains(index)
    }

    /// Whether the transaction lost a commit race against a concurrent writer.
    #[must_use]
    pub fn is_write_conflict(&self) -> bool {
        let Self::Surreal { source, .. } = self else { return false };
        let message = source.to_string();
        message.contains("read or write conflict") || message.contains("can be retried")
    }
}
