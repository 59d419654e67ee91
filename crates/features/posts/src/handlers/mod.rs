pub(crate) mod comments;
pub(crate) mod feed;
pub(crate) mod posts;

use flock_domain::constants::POST;
use flock_kernel::security::resource::ResourceGuard;

/// Bare post key of an optional filter value. Ids that cannot be a post never match.
pub(crate) fn post_filter(post: Option<String>) -> Option<String> {
    post.map(|raw| ResourceGuard::verify(raw.as_str(), POST).unwrap_or(raw))
}
