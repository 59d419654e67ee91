use crate::error::PostsError;
use crate::mentions::extract_mentions;
use crate::models::{
    CommentRecord, CommentThread, CommentView, CreatePostRequest, Ordering, PostDetail,
    PostRecord, PostView, UpdatePostRequest, validate_comment_content, validate_post_content,
    validate_title,
};
use crate::repository::{CommentFilter, PostFilter, PostRepository, PostStats};
use flock_accounts::{Account, AccountService};
use flock_database::Database;
use flock_domain::config::FeedConfig;
use flock_domain::constants::COMMENT;
use flock_domain::events::{CommentAdded, CommentRemoved, PostLiked, PostPublished, PostRemoved};
use flock_event_bus::{Event, EventBus};
use flock_kernel::clock::{from_micros, now_micros};
use flock_kernel::safe_nanoid;
use flock_kernel::security::resource::ResourceGuard;
use flock_kernel::server::{Page, PageRequest};
use fxhash::FxHashMap;
use tracing::{info, instrument, warn};

/// Listing parameters of `GET /posts`.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub author: Option<String>,
    pub search: Option<String>,
    pub ordering: Ordering,
}

/// Listing parameters of `GET /comments`.
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub post: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
}

/// Posts, likes, comments and the feeds built from them.
#[derive(Debug, Clone)]
pub struct PostService {
    repo: PostRepository,
    accounts: AccountService,
    events: EventBus,
    feed: FeedConfig,
}

impl PostService {
    #[must_use]
    pub fn new(
        config: &FeedConfig,
        database: Database,
        events: EventBus,
        accounts: AccountService,
    ) -> Self {
        Self { repo: PostRepository::new(database), accounts, events, feed: config.clone() }
    }

    /// Page request bounded by the feed limits.
    #[must_use]
    pub fn page(&self, page: Option<u32>, page_size: Option<u32>) -> PageRequest {
        PageRequest::new(page, page_size, self.feed.default_page_size, self.feed.max_page_size)
    }

    // --- Posts ---

    /// # Errors
    /// Validation errors for blank or oversized fields.
    #[instrument(skip(self, author, request), fields(author = %author.id))]
    pub async fn create_post(
        &self,
        author: &Account,
        request: CreatePostRequest,
    ) -> Result<PostView, PostsError> {
        validate_title(request.title.as_deref())?;
        validate_post_content(&request.content)?;

        let now = now_micros();
        let record = PostRecord {
            uid: safe_nanoid!(),
            author: author.id.clone(),
            title: request.title.filter(|t| !t.is_empty()),
            body: request.content,
            image: request.image.filter(|i| !i.is_empty()),
            created_at: now,
            updated_at: now,
        };
        self.repo.create_post(record.clone()).await?;
        info!(post = %record.uid, "Post published");

        self.emit(PostPublished {
            post: record.uid.clone(),
            author: author.id.clone(),
            mentions: extract_mentions(&record.body),
        });

        Ok(post_view(record, author, PostStats::default()))
    }

    /// # Errors
    /// [`PostsError::NotFound`] for unknown posts.
    pub async fn post_detail(&self, uid: &str, viewer: Option<&str>) -> Result<PostDetail, PostsError> {
        let record = self.require_post(uid).await?;
        let post = self.views(vec![record], viewer).await?.pop().ok_or_else(|| {
            PostsError::Internal { message: "Post vanished while rendering".into(), context: None }
        })?;

        let comments = self.repo.comments_of_post(uid).await?;
        let comments = self.comment_views(comments).await?;
        Ok(PostDetail { post, comments: thread(comments) })
    }

    /// Author-only partial update.
    ///
    /// # Errors
    /// Forbidden for other users, validation errors for bad fields.
    pub async fn update_post(
        &self,
        uid: &str,
        caller: &str,
        changes: UpdatePostRequest,
    ) -> Result<PostView, PostsError> {
        let mut record = self.require_post(uid).await?;
        if record.author != caller {
            return Err(PostsError::forbidden("You can only update your own posts."));
        }

        if let Some(title) = changes.title {
            validate_title(Some(&title))?;
            record.title = Some(title).filter(|t| !t.is_empty());
        }
        if let Some(content) = changes.content {
            validate_post_content(&content)?;
            record.body = content;
        }
        if let Some(image) = changes.image {
            record.image = Some(image).filter(|i| !i.is_empty());
        }
        record.updated_at = now_micros();

        self.repo.update_post(&record).await?;
        self.views(vec![record], Some(caller)).await?.pop().ok_or_else(|| PostsError::Internal {
            message: "Post vanished while rendering".into(),
            context: None,
        })
    }

    /// Author-only delete, cascading to likes and comments.
    ///
    /// # Errors
    /// Forbidden for other users.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, uid: &str, caller: &str) -> Result<(), PostsError> {
        let record = self.require_post(uid).await?;
        if record.author != caller {
            return Err(PostsError::forbidden("You can only delete your own posts."));
        }

        let comments = self.repo.delete_post(uid).await?;
        info!(post = %uid, comments = comments.len(), "Post removed");
        self.emit(PostRemoved { post: uid.to_owned(), comments });
        Ok(())
    }

    /// # Errors
    /// Storage errors.
    pub async fn list_posts(
        &self,
        query: PostQuery,
        page: PageRequest,
        viewer: Option<&str>,
    ) -> Result<Page<PostView>, PostsError> {
        let authors = match query.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(username) => match self.accounts.find_by_username(username).await? {
                Some(account) => Some(vec![account.id]),
                None => return Ok(page.into_page(0, Vec::new())),
            },
            None => None,
        };
        let filter = PostFilter {
            authors,
            search: query.search.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()),
            ordering: query.ordering,
        };

        let (count, records) = self.repo.list_posts(&filter, page.offset(), page.limit()).await?;
        Ok(page.into_page(count, self.views(records, viewer).await?))
    }

    // --- Likes ---

    /// Returns the new like count.
    ///
    /// # Errors
    /// Validation error for duplicate likes.
    pub async fn like(&self, uid: &str, actor: &str) -> Result<u64, PostsError> {
        let post = self.require_post(uid).await?;
        let duplicate = || PostsError::validation("You have already liked this post.");
        if self.repo.has_liked(uid, actor).await? {
            return Err(duplicate());
        }
        if !self.repo.like(uid, actor, now_micros()).await? {
            return Err(duplicate());
        }

        self.emit(PostLiked {
            post: uid.to_owned(),
            post_author: post.author,
            actor: actor.to_owned(),
        });
        Ok(self.repo.likes_count(uid).await?)
    }

    /// Returns the new like count.
    ///
    /// # Errors
    /// Validation error if the caller had not liked the post.
    pub async fn unlike(&self, uid: &str, actor: &str) -> Result<u64, PostsError> {
        self.require_post(uid).await?;
        if !self.repo.has_liked(uid, actor).await? {
            return Err(PostsError::validation("You have not liked this post."));
        }
        self.repo.unlike(uid, actor).await?;
        Ok(self.repo.likes_count(uid).await?)
    }

    // --- Comments ---

    /// Adds a comment (or a reply when `parent` is set) to a post.
    ///
    /// Replies to replies are attached to the top-level comment.
    ///
    /// # Errors
    /// Not found for unknown posts, validation errors for blank content or a bad parent.
    #[instrument(skip(self, author, content), fields(author = %author.id))]
    pub async fn add_comment(
        &self,
        post_uid: &str,
        author: &Account,
        content: Option<String>,
        parent: Option<String>,
    ) -> Result<CommentView, PostsError> {
        let post = self.require_post(post_uid).await?;
        let content = validate_comment_content(content)?;

        let (parent, parent_author) = match parent {
            Some(raw) => {
                let unknown_parent = || PostsError::validation("Parent comment not found.");
                let parent_uid = ResourceGuard::verify(&raw, COMMENT).map_err(|_| unknown_parent())?;
                let replied_to =
                    self.repo.find_comment(&parent_uid).await?.ok_or_else(unknown_parent)?;
                if replied_to.post != post.uid {
                    return Err(PostsError::validation(
                        "Parent comment must belong to the same post.",
                    ));
                }
                let top = replied_to.parent.clone().unwrap_or_else(|| replied_to.uid.clone());
                (Some(top), Some(replied_to.author))
            },
            None => (None, None),
        };

        let now = now_micros();
        let record = CommentRecord {
            uid: safe_nanoid!(),
            post: post.uid.clone(),
            author: author.id.clone(),
            parent,
            body: content,
            created_at: now,
            updated_at: now,
        };
        self.repo.create_comment(record.clone()).await?;

        self.emit(CommentAdded {
            comment: record.uid.clone(),
            post: post.uid,
            post_author: post.author,
            actor: author.id.clone(),
            parent_author,
            mentions: extract_mentions(&record.body),
        });

        Ok(comment_view(record, &author.username))
    }

    /// Every comment of a post, newest first.
    ///
    /// # Errors
    /// Not found for unknown posts.
    pub async fn post_comments(&self, post_uid: &str) -> Result<Vec<CommentView>, PostsError> {
        self.require_post(post_uid).await?;
        let records = self.repo.comments_of_post(post_uid).await?;
        self.comment_views(records).await
    }

    /// # Errors
    /// Not found for unknown comments.
    pub async fn comment(&self, uid: &str) -> Result<CommentView, PostsError> {
        let record = self.require_comment(uid).await?;
        self.comment_views(vec![record]).await?.pop().ok_or_else(|| PostsError::Internal {
            message: "Comment vanished while rendering".into(),
            context: None,
        })
    }

    /// # Errors
    /// Storage errors.
    pub async fn list_comments(
        &self,
        query: CommentQuery,
        page: PageRequest,
    ) -> Result<Page<CommentView>, PostsError> {
        let author = match query.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(username) => match self.accounts.find_by_username(username).await? {
                Some(account) => Some(account.id),
                None => return Ok(page.into_page(0, Vec::new())),
            },
            None => None,
        };
        let filter = CommentFilter {
            post: query.post,
            author,
            search: query.search.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()),
        };

        let (count, records) = self.repo.list_comments(&filter, page.offset(), page.limit()).await?;
        Ok(page.into_page(count, self.comment_views(records).await?))
    }

    /// Author-only content update.
    ///
    /// # Errors
    /// Forbidden for other users, validation errors for blank content.
    pub async fn update_comment(
        &self,
        uid: &str,
        caller: &str,
        content: Option<String>,
    ) -> Result<CommentView, PostsError> {
        let mut record = self.require_comment(uid).await?;
        if record.author != caller {
            return Err(PostsError::forbidden("You can only update your own comments."));
        }
        if content.is_some() {
            record.body = validate_comment_content(content)?;
            record.updated_at = now_micros();
            self.repo.update_comment(&record).await?;
        }
        self.comment_views(vec![record]).await?.pop().ok_or_else(|| PostsError::Internal {
            message: "Comment vanished while rendering".into(),
            context: None,
        })
    }

    /// Author-only delete, taking the replies with it.
    ///
    /// # Errors
    /// Forbidden for other users.
    pub async fn delete_comment(&self, uid: &str, caller: &str) -> Result<(), PostsError> {
        let record = self.require_comment(uid).await?;
        if record.author != caller {
            return Err(PostsError::forbidden("You can only delete your own comments."));
        }
        let comments = self.repo.delete_comment(uid).await?;
        self.emit(CommentRemoved { comments });
        Ok(())
    }

    // --- Feeds ---

    /// Posts by everyone `viewer` follows, newest first. Also returns how many accounts
    /// `viewer` follows.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn feed(
        &self,
        viewer: &str,
        page: PageRequest,
    ) -> Result<(Page<PostView>, u64), PostsError> {
        let following = self.accounts.following_ids(viewer).await?;
        let following_count = following.len() as u64;
        if following.is_empty() {
            return Ok((page.into_page(0, Vec::new()), 0));
        }

        let filter = PostFilter { authors: Some(following), ..PostFilter::default() };
        let (count, records) = self.repo.list_posts(&filter, page.offset(), page.limit()).await?;
        Ok((page.into_page(count, self.views(records, Some(viewer)).await?), following_count))
    }

    /// Every post of `username`, newest first. `None` when the user is unknown.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn posts_by_username(
        &self,
        username: &str,
        viewer: Option<&str>,
    ) -> Result<Option<Vec<PostView>>, PostsError> {
        let Some(account) = self.accounts.find_by_username(username).await? else {
            return Ok(None);
        };
        let filter = PostFilter { authors: Some(vec![account.id]), ..PostFilter::default() };
        let (_, records) = self.repo.list_posts(&filter, 0, i64::from(u32::MAX)).await?;
        Ok(Some(self.views(records, viewer).await?))
    }

    /// The most recent posts from everyone.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn explore(&self, viewer: Option<&str>) -> Result<Vec<PostView>, PostsError> {
        let limit = i64::from(self.feed.explore_limit);
        let (_, records) = self.repo.list_posts(&PostFilter::default(), 0, limit).await?;
        self.views(records, viewer).await
    }

    // --- Lookups for other slices ---

    /// Body of the post `uid`, if it still exists.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn post_content(&self, uid: &str) -> Result<Option<String>, PostsError> {
        Ok(self.repo.find_post(uid).await?.map(|post| post.body))
    }

    /// Body of the comment `uid`, if it still exists.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn comment_content(&self, uid: &str) -> Result<Option<String>, PostsError> {
        Ok(self.repo.find_comment(uid).await?.map(|comment| comment.body))
    }

    // --- Helpers ---

    async fn require_post(&self, uid: &str) -> Result<PostRecord, PostsError> {
        self.repo.find_post(uid).await?.ok_or_else(|| PostsError::not_found("Not found."))
    }

    async fn require_comment(&self, uid: &str) -> Result<CommentRecord, PostsError> {
        self.repo.find_comment(uid).await?.ok_or_else(|| PostsError::not_found("Not found."))
    }

    async fn authors_of(
        &self,
        ids: impl Iterator<Item = &String>,
    ) -> Result<FxHashMap<String, Account>, PostsError> {
        let mut ids: Vec<String> = ids.cloned().collect();
        ids.sort_unstable();
        ids.dedup();
        let accounts = self.accounts.accounts_by_ids(&ids).await?;
        Ok(accounts.into_iter().map(|account| (account.id.clone(), account)).collect())
    }

    /// Renders posts in the given order, skipping posts whose author is gone.
    async fn views(
        &self,
        records: Vec<PostRecord>,
        viewer: Option<&str>,
    ) -> Result<Vec<PostView>, PostsError> {
        let authors = self.authors_of(records.iter().map(|r| &r.author)).await?;
        let stats = self.repo.stats(records.iter().map(|r| r.uid.clone()).collect(), viewer).await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let author = authors.get(&record.author)?;
                let stats = stats.get(&record.uid).copied().unwrap_or_default();
                Some(post_view(record, author, stats))
            })
            .collect())
    }

    async fn comment_views(
        &self,
        records: Vec<CommentRecord>,
    ) -> Result<Vec<CommentView>, PostsError> {
        let authors = self.authors_of(records.iter().map(|r| &r.author)).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| {
                let username = authors.get(&record.author)?.username.clone();
                Some(comment_view(record, &username))
            })
            .collect())
    }

    fn emit<E: Event>(&self, event: E) {
        if let Err(e) = self.events.publish(event) {
            warn!(error = %e, event = std::any::type_name::<E>(), "Failed to publish event");
        }
    }
}

fn post_view(record: PostRecord, author: &Account, stats: PostStats) -> PostView {
    PostView {
        id: record.uid,
        author: author.username.clone(),
        author_id: author.id.clone(),
        title: record.title,
        content: record.body,
        image: record.image,
        likes_count: stats.likes,
        comments_count: stats.comments,
        is_liked: stats.liked,
        created_at: from_micros(record.created_at),
        updated_at: from_micros(record.updated_at),
    }
}

fn comment_view(record: CommentRecord, author: &str) -> CommentView {
    CommentView {
        id: record.uid,
        post: record.post,
        author: author.to_owned(),
        author_id: record.author,
        parent: record.parent,
        content: record.body,
        created_at: from_micros(record.created_at),
        updated_at: from_micros(record.updated_at),
    }
}

/// Groups newest-first comments into threads: top-level comments newest first,
/// replies oldest first. Replies whose parent is missing are dropped.
fn thread(comments: Vec<CommentView>) -> Vec<CommentThread> {
    let (top, replies): (Vec<_>, Vec<_>) = comments.into_iter().partition(|c| c.parent.is_none());

    let mut by_parent: FxHashMap<String, Vec<CommentView>> = FxHashMap::default();
    for reply in replies.into_iter().rev() {
        if let Some(parent) = reply.parent.clone() {
            by_parent.entry(parent).or_default().push(reply);
        }
    }

    top.into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn view(id: &str, parent: Option<&str>, second: u32) -> CommentView {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap();
        CommentView {
            id: id.to_owned(),
            post: "P".to_owned(),
            author: "ada".to_owned(),
            author_id: "A".to_owned(),
            parent: parent.map(str::to_owned),
            content: id.to_owned(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn threads_keep_top_level_newest_and_replies_oldest_first() {
        // Newest first, as the repository returns them.
        let comments = vec![
            view("r2", Some("c1"), 5),
            view("c2", None, 4),
            view("r1", Some("c1"), 3),
            view("c1", None, 1),
        ];

        let threads = thread(comments);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, "c2");
        assert!(threads[0].replies.is_empty());
        assert_eq!(threads[1].comment.id, "c1");
        let replies: Vec<_> = threads[1].replies.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(replies, vec!["r1", "r2"]);
    }
}
