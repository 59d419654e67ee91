use crate::error::PostsError;
use chrono::{DateTime, Utc};
use flock_derive::api_model;
use surrealdb::types::SurrealValue;
use utoipa::IntoParams;

pub(crate) const MAX_TITLE_LENGTH: usize = 200;
pub(crate) const MAX_POST_LENGTH: usize = 5000;
pub(crate) const MAX_COMMENT_LENGTH: usize = 1000;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct PostRecord {
    pub uid: String,
    pub author: String,
    pub title: Option<String>,
    pub body: String,
    pub image: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct CommentRecord {
    pub uid: String,
    pub post: String,
    pub author: String,
    pub parent: Option<String>,
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Listing order of posts.
#[api_model]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub enum Ordering {
    #[default]
    #[serde(rename = "-created_at")]
    Newest,
    #[serde(rename = "created_at")]
    Oldest,
}

// --- Requests ---

#[api_model]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: String,
    /// URL of an image.
    pub image: Option<String>,
}

/// Fields left out keep their current value.
#[api_model]
#[derive(Default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

/// Body of `POST /posts/{id}/comment`.
#[api_model]
pub struct AddCommentRequest {
    pub content: Option<String>,
    /// Comment being replied to.
    pub parent: Option<String>,
}

/// Body of `POST /comments`.
#[api_model]
pub struct CreateCommentRequest {
    pub post: String,
    pub content: Option<String>,
    pub parent: Option<String>,
}

#[api_model]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Username of the author.
    pub author: Option<String>,
    /// Case-insensitive substring of the title or content.
    pub search: Option<String>,
    pub ordering: Option<Ordering>,
}

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Post id.
    pub post: Option<String>,
    /// Username of the author.
    pub author: Option<String>,
    pub search: Option<String>,
}

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserPostsQuery {
    pub username: Option<String>,
}

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// --- Responses ---

#[api_model]
#[derive(Clone)]
pub struct PostView {
    pub id: String,
    /// Username of the author.
    pub author: String,
    pub author_id: String,
    pub title: Option<String>,
    pub content: String,
    pub image: Option<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    /// Whether the caller liked the post. Always false for anonymous callers.
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[api_model]
#[derive(Clone)]
pub struct CommentView {
    pub id: String,
    pub post: String,
    pub author: String,
    pub author_id: String,
    pub parent: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A top-level comment with its replies, oldest reply first.
#[api_model(deny_unknown_fields = false)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

#[api_model(deny_unknown_fields = false)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub comments: Vec<CommentThread>,
}

#[api_model]
pub struct LikeResponse {
    pub message: String,
    pub likes_count: u64,
}

#[api_model]
pub struct PostCommentsResponse {
    pub count: u64,
    pub comments: Vec<CommentView>,
}

#[api_model]
pub struct UserPostsResponse {
    pub count: u64,
    pub username: String,
    pub posts: Vec<PostView>,
}

#[api_model]
pub struct FeedResponse {
    pub count: u64,
    pub following_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub posts: Vec<PostView>,
}

#[api_model]
pub struct ExploreResponse {
    pub count: u64,
    pub posts: Vec<PostView>,
}

// --- Validation ---

pub(crate) fn validate_post_content(content: &str) -> Result<(), PostsError> {
    if content.trim().is_empty() {
        return Err(PostsError::validation("Post content is required."));
    }
    if content.chars().count() > MAX_POST_LENGTH {
        return Err(PostsError::validation(format!(
            "Post content must be at most {MAX_POST_LENGTH} characters."
        )));
    }
    Ok(())
}

pub(crate) fn validate_title(title: Option<&str>) -> Result<(), PostsError> {
    if title.is_some_and(|t| t.chars().count() > MAX_TITLE_LENGTH) {
        return Err(PostsError::validation(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters."
        )));
    }
    Ok(())
}

/// Returns the trimmed-to-check content, or the error every comment endpoint uses.
pub(crate) fn validate_comment_content(content: Option<String>) -> Result<String, PostsError> {
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| PostsError::validation("Comment content is required."))?;
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(PostsError::validation(format!(
            "Comment content must be at most {MAX_COMMENT_LENGTH} characters."
        )));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_content_limits() {
        assert!(validate_post_content("hello").is_ok());
        assert!(validate_post_content("   ").is_err());
        assert!(validate_post_content(&"x".repeat(MAX_POST_LENGTH)).is_ok());
        assert!(validate_post_content(&"x".repeat(MAX_POST_LENGTH + 1)).is_err());
        assert!(validate_title(Some(&"t".repeat(MAX_TITLE_LENGTH + 1))).is_err());
        assert!(validate_title(None).is_ok());
    }

    #[test]
    fn comment_content_is_required() {
        let err = validate_comment_content(Some("  ".to_owned())).unwrap_err();
        assert_eq!(err.to_string(), "Comment content is required.");
        assert!(validate_comment_content(None).is_err());
        assert_eq!(validate_comment_content(Some("hi".to_owned())).unwrap(), "hi");
    }

    #[test]
    fn ordering_accepts_created_at_names() {
        let newest: Ordering = serde_json::from_str("\"-created_at\"").unwrap();
        assert_eq!(newest, Ordering::Newest);
        let oldest: Ordering = serde_json::from_str("\"created_at\"").unwrap();
        assert_eq!(oldest, Ordering::Oldest);
    }
}
