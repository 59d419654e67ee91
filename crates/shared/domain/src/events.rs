//! Events exchanged between slices over the event bus.
//!
//! Every id is the bare record key of an account, post or comment. Mentions carry the
//! usernames as written after `@`; resolving them is up to the consumer.

/// `follower` started following `followee`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFollowed {
    pub follower: String,
    pub followee: String,
}

/// A post was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPublished {
    pub post: String,
    pub author: String,
    pub mentions: Vec<String>,
}

/// `actor` liked `post`, which belongs to `post_author`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLiked {
    pub post: String,
    pub post_author: String,
    pub actor: String,
}

/// A comment was added to `post`.
///
/// `parent_author` is set when the comment is a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentAdded {
    pub comment: String,
    pub post: String,
    pub post_author: String,
    pub actor: String,
    pub parent_author: Option<String>,
    pub mentions: Vec<String>,
}

/// A post and its comments are gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRemoved {
    pub post: String,
    pub comments: Vec<String>,
}

/// Comments (a top-level comment and its replies) are gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRemoved {
    pub comments: Vec<String>,
}
