//! Posts feature slice: posts, likes, two-level comment threads, the personal feed and explore.
//!
//! Publishing, liking and commenting are announced on the event bus; the notifications slice
//! turns them into notifications.

mod error;
mod handlers;
mod mentions;
mod models;
mod repository;
mod router;
mod service;

pub use error::{PostsError, PostsErrorExt};
pub use mentions::extract_mentions;
pub use models::{
    CommentThread, CommentView, CreatePostRequest, FeedResponse, Ordering, PostDetail, PostView,
    UpdatePostRequest,
};
pub use router::{comments_router, feed_router, posts_router};
pub use service::{CommentQuery, PostQuery, PostService};

use flock_accounts::Accounts;
use flock_database::{Database, Migration};
use flock_domain::config::ApiConfig;
use flock_event_bus::EventBus;

pub const MIGRATIONS: &[Migration] =
    &[Migration::new("posts", "0001_posts", include_str!("../migrations/0001_posts.surql"))];

/// Posts feature state
#[flock_derive::flock_slice]
pub struct Posts {
    pub service: PostService,
}

/// Initialize the posts feature on top of the accounts slice.
#[must_use]
pub fn init(config: &ApiConfig, database: &Database, events: &EventBus, accounts: &Accounts) -> Posts {
    let service =
        PostService::new(&config.feed, database.clone(), events.clone(), accounts.service.clone());
    tracing::info!("Posts slice initialized");

    Posts::new(PostsInner { service })
}
