//! Facade crate for Flock features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Open the database with [`MIGRATIONS`].
//! - Call [`init`] to build the feature slices and register them in the API state.
//! - Mount [`api_router`] next to the kernel's system routes.

use flock_database::{Database, Migration};
pub use flock_domain as domain;
use flock_domain::config::ApiConfig;
use flock_domain::registry::InitializedSlice;
use flock_event_bus::EventBus;
pub use flock_kernel as kernel;
use flock_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;

/// Feature slices, in dependency order.
pub mod features {
    pub use flock_accounts as accounts;
    pub use flock_notifications as notifications;
    pub use flock_posts as posts;
}

/// Every slice migration, in the order they must run.
pub const MIGRATIONS: &[&[Migration]] = &[
    features::accounts::MIGRATIONS,
    features::posts::MIGRATIONS,
    features::notifications::MIGRATIONS,
];

/// Initialize all feature slices.
///
/// Notification listeners are spawned here, so this must run inside a Tokio runtime.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub fn init(
    config: &ApiConfig,
    database: &Database,
    events: &EventBus,
) -> Result<Vec<InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    let accounts = features::accounts::init(config, database, events);
    let posts = features::posts::init(config, database, events, &accounts);
    let notifications = features::notifications::init(config, database, events, &accounts, &posts)?;

    Ok(vec![
        InitializedSlice::new(accounts),
        InitializedSlice::new(posts),
        InitializedSlice::new(notifications),
    ])
}

/// Routes of every feature slice, mounted under `/api`.
pub fn api_router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .nest("/api/auth", features::accounts::router())
        .nest("/api/posts", features::posts::posts_router())
        .nest("/api/comments", features::posts::comments_router())
        .nest("/api", features::posts::feed_router())
        .nest("/api/notifications", features::notifications::router())
}
