//! Notifications feature slice.
//!
//! Follows, likes, comments, replies and mentions reach this slice as events on the bus.
//! Background listeners store a notification per interested recipient, honoring their
//! preferences, and drop notifications whose post or comment is deleted.

mod error;
mod handlers;
mod listener;
mod models;
mod repository;
mod router;
mod service;

pub use error::{NotificationsError, NotificationsErrorExt};
pub use listener::spawn_listeners;
pub use models::{
    ActorView, BulkAction, BulkActionRequest, NotificationDetail, NotificationListItem,
    NotificationView, PreferenceView, UpdatePreferencesRequest,
};
pub use router::router;
pub use service::NotificationService;

use flock_accounts::Accounts;
use flock_database::{Database, Migration};
use flock_domain::config::ApiConfig;
use flock_event_bus::EventBus;
use flock_posts::Posts;
use tokio::task::JoinHandle;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "notifications",
    "0001_notifications",
    include_str!("../migrations/0001_notifications.surql"),
)];

/// Notifications feature state
#[flock_derive::flock_slice]
pub struct Notifications {
    pub service: NotificationService,
    /// Event listeners; they stop once the event bus shuts down.
    pub listeners: std::sync::Arc<Vec<JoinHandle<()>>>,
}

/// Initialize the notifications feature and start its event listeners.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
/// [`NotificationsError::Events`] if subscribing to the event bus fails.
pub fn init(
    config: &ApiConfig,
    database: &Database,
    events: &EventBus,
    accounts: &Accounts,
    posts: &Posts,
) -> Result<Notifications, NotificationsError> {
    let settings = &config.notifications;
    let service = NotificationService::new(
        settings,
        database.clone(),
        accounts.service.clone(),
        posts.service.clone(),
    );
    let listeners = spawn_listeners(&service, events, settings.event_buffer)?;
    tracing::info!(listeners = listeners.len(), "Notifications slice initialized");

    Ok(Notifications::new(NotificationsInner { service, listeners: listeners.into() }))
}
