//! Table names shared between slices. A record id is `<table>:<key>` on the wire.

pub const ACCOUNT: &str = "account";
pub const AUTH_TOKEN: &str = "auth_token";
pub const FOLLOW: &str = "follow";
pub const POST: &str = "post";
pub const POST_LIKE: &str = "post_like";
pub const COMMENT: &str = "comment";
pub const NOTIFICATION: &str = "notification";
pub const NOTIFICATION_PREFERENCE: &str = "notification_pref";

/// Length of the opaque keys generated for records.
pub const ID_LENGTH: usize = 12;
/// Length of API tokens.
pub const TOKEN_LENGTH: usize = 40;

// OpenAPI tags.
pub const SYSTEM_TAG: &str = "System";
pub const ACCOUNTS_TAG: &str = "Accounts";
pub const POSTS_TAG: &str = "Posts";
pub const COMMENTS_TAG: &str = "Comments";
pub const FEED_TAG: &str = "Feed";
pub const NOTIFICATIONS_TAG: &str = "Notifications";
