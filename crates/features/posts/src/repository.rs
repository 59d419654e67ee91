use crate::models::{CommentRecord, Ordering, PostRecord};
use flock_database::{CountRow, Database, DatabaseError, DatabaseErrorExt};
use fxhash::{FxHashMap, FxHashSet};
use surrealdb::types::SurrealValue;
use tracing::instrument;

const POST_FIELDS: &str = "uid, author, title, body, image, created_at, updated_at";
const COMMENT_FIELDS: &str = "uid, post, author, parent, body, created_at, updated_at";

#[derive(Debug, Clone, SurrealValue)]
struct PostTally {
    post: String,
    count: i64,
}

/// Like and comment totals of a post, plus whether the viewer liked it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PostStats {
    pub likes: u64,
    pub comments: u64,
    pub liked: bool,
}

/// Filters of a post listing. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub(crate) struct PostFilter {
    pub authors: Option<Vec<String>>,
    pub search: Option<String>,
    pub ordering: Ordering,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CommentFilter {
    pub post: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct PostRepository {
    db: Database,
}

impl PostRepository {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }

    // --- Posts ---

    #[instrument(skip(self, record), fields(uid = %record.uid))]
    pub(crate) async fn create_post(&self, record: PostRecord) -> Result<(), DatabaseError> {
        self.db
            .query("CREATE post CONTENT $record RETURN NONE")
            .bind(("record", record))
            .await
            .context("Creating post")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    pub(crate) async fn find_post(&self, uid: &str) -> Result<Option<PostRecord>, DatabaseError> {
        self.db
            .query(format!("SELECT {POST_FIELDS} FROM post WHERE uid = $uid LIMIT 1"))
            .bind(("uid", uid.to_owned()))
            .await
            .context("Loading post")?
            .take::<Option<PostRecord>>(0)
            .context("Parsing post")
    }

    pub(crate) async fn update_post(&self, record: &PostRecord) -> Result<(), DatabaseError> {
        self.db
            .query(
                "UPDATE post SET title = $title, body = $body, image = $image, updated_at = $updated_at
                WHERE uid = $uid RETURN NONE",
            )
            .bind(("uid", record.uid.clone()))
            .bind(("title", record.title.clone()))
            .bind(("body", record.body.clone()))
            .bind(("image", record.image.clone()))
            .bind(("updated_at", record.updated_at))
            .await
            .context("Updating post")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    /// Deletes a post with its likes and comments. Returns the ids of the deleted comments.
    #[instrument(skip(self))]
    pub(crate) async fn delete_post(&self, uid: &str) -> Result<Vec<String>, DatabaseError> {
        let comments = self
            .db
            .query("SELECT VALUE uid FROM comment WHERE post = $uid")
            .bind(("uid", uid.to_owned()))
            .await
            .context("Collecting post comments")?
            .take::<Vec<String>>(0)
            .context("Parsing post comments")?;

        self.db
            .query(
                "BEGIN TRANSACTION;
                DELETE comment WHERE post = $uid;
                DELETE post_like WHERE post = $uid;
                DELETE post WHERE uid = $uid;
                COMMIT TRANSACTION;",
            )
            .bind(("uid", uid.to_owned()))
            .await
            .context("Deleting post")?
            .check()
            .map_err(surrealdb::Error::from)?;

        Ok(comments)
    }

    /// One page of posts matching `filter`.
    pub(crate) async fn list_posts(
        &self,
        filter: &PostFilter,
        start: i64,
        limit: i64,
    ) -> Result<(u64, Vec<PostRecord>), DatabaseError> {
        let mut conditions = Vec::new();
        if filter.authors.is_some() {
            conditions.push("author IN $authors");
        }
        if filter.search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(body), $search) \
                 OR string::contains(string::lowercase(title ?? ''), $search))",
            );
        }
        let clause = where_clause(&conditions);
        let direction = match filter.ordering {
            Ordering::Newest => "DESC",
            Ordering::Oldest => "ASC",
        };

        let mut response = self
            .db
            .query(format!(
                "SELECT count() AS count FROM post {clause} GROUP ALL;
                SELECT {POST_FIELDS} FROM post {clause}
                    ORDER BY created_at {direction} LIMIT $limit START $start;"
            ))
            .bind(("authors", filter.authors.clone().unwrap_or_default()))
            .bind(("search", filter.search.as_deref().map(str::to_lowercase).unwrap_or_default()))
            .bind(("limit", limit))
            .bind(("start", start))
            .await
            .context("Listing posts")?;

        let count = response.take::<Option<CountRow>>(0).context("Counting posts")?;
        let rows = response.take::<Vec<PostRecord>>(1).context("Parsing posts")?;
        Ok((CountRow::total(count), rows))
    }

    /// Like/comment totals for `posts`, and which of them `viewer` liked.
    pub(crate) async fn stats(
        &self,
        posts: Vec<String>,
        viewer: Option<&str>,
    ) -> Result<FxHashMap<String, PostStats>, DatabaseError> {
        if posts.is_empty() {
            return Ok(FxHashMap::default());
        }
        let mut response = self
            .db
            .query(
                "SELECT post, count() AS count FROM post_like WHERE post IN $posts GROUP BY post;
                SELECT post, count() AS count FROM comment WHERE post IN $posts GROUP BY post;
                SELECT VALUE post FROM post_like WHERE post IN $posts AND account = $viewer;",
            )
            .bind(("posts", posts))
            .bind(("viewer", viewer.unwrap_or_default().to_owned()))
            .await
            .context("Loading post stats")?;

        let likes = response.take::<Vec<PostTally>>(0).context("Parsing likes")?;
        let comments = response.take::<Vec<PostTally>>(1).context("Parsing comments")?;
        let liked: FxHashSet<String> =
            response.take::<Vec<String>>(2).context("Parsing viewer likes")?.into_iter().collect();

        let mut stats: FxHashMap<String, PostStats> = FxHashMap::default();
        for tally in likes {
            stats.entry(tally.post).or_default().likes = tally.count.unsigned_abs();
        }
        for tally in comments {
            stats.entry(tally.post).or_default().comments = tally.count.unsigned_abs();
        }
        for post in liked {
            stats.entry(post).or_default().liked = true;
        }
        Ok(stats)
    }

    // --- Likes ---

    pub(crate) async fn has_liked(&self, post: &str, account: &str) -> Result<bool, DatabaseError> {
        let hit = self
            .db
            .query("SELECT VALUE account FROM post_like WHERE post = $post AND account = $account LIMIT 1")
            .bind(("post", post.to_owned()))
            .bind(("account", account.to_owned()))
            .await
            .context("Checking like")?
            .take::<Option<String>>(0)
            .context("Parsing like check")?;
        Ok(hit.is_some())
    }

    /// Returns `false` when the like already existed, including one committed concurrently.
    pub(crate) async fn like(&self, post: &str, account: &str, now: i64) -> Result<bool, DatabaseError> {
        let created = async {
            self.db
                .query(
                    "CREATE post_like CONTENT { post: $post, account: $account, created_at: $now }
                    RETURN NONE",
                )
                .bind(("post", post.to_owned()))
                .bind(("account", account.to_owned()))
                .bind(("now", now))
                .await
                .context("Creating like")?
                .check()
                .map_err(surrealdb::Error::from)?;
            Ok::<_, DatabaseError>(())
        }
        .await;

        let Err(e) = created else { return Ok(true) };
        if e.is_unique_violation("post_like_pair")
            || (e.is_write_conflict() && self.has_liked(post, account).await?)
        {
            return Ok(false);
        }
        Err(e)
    }

    pub(crate) async fn unlike(&self, post: &str, account: &str) -> Result<(), DatabaseError> {
        self.db
            .query("DELETE post_like WHERE post = $post AND account = $account")
            .bind(("post", post.to_owned()))
            .bind(("account", account.to_owned()))
            .await
            .context("Deleting like")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    pub(crate) async fn likes_count(&self, post: &str) -> Result<u64, DatabaseError> {
        let row = self
            .db
            .query("SELECT count() AS count FROM post_like WHERE post = $post GROUP ALL")
            .bind(("post", post.to_owned()))
            .await
            .context("Counting likes")?
            .take::<Option<CountRow>>(0)
            .context("Parsing like count")?;
        Ok(CountRow::total(row))
    }

    // --- Comments ---

    #[instrument(skip(self, record), fields(uid = %record.uid, post = %record.post))]
    pub(crate) async fn create_comment(&self, record: CommentRecord) -> Result<(), DatabaseError> {
        self.db
            .query("CREATE comment CONTENT $record RETURN NONE")
            .bind(("record", record))
            .await
            .context("Creating comment")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    pub(crate) async fn find_comment(
        &self,
        uid: &str,
    ) -> Result<Option<CommentRecord>, DatabaseError> {
        self.db
            .query(format!("SELECT {COMMENT_FIELDS} FROM comment WHERE uid = $uid LIMIT 1"))
            .bind(("uid", uid.to_owned()))
            .await
            .context("Loading comment")?
            .take::<Option<CommentRecord>>(0)
            .context("Parsing comment")
    }

    /// Every comment of a post (replies included), newest first.
    pub(crate) async fn comments_of_post(
        &self,
        post: &str,
    ) -> Result<Vec<CommentRecord>, DatabaseError> {
        self.db
            .query(format!(
                "SELECT {COMMENT_FIELDS} FROM comment WHERE post = $post ORDER BY created_at DESC"
            ))
            .bind(("post", post.to_owned()))
            .await
            .context("Loading comments")?
            .take::<Vec<CommentRecord>>(0)
            .context("Parsing comments")
    }

    pub(crate) async fn list_comments(
        &self,
        filter: &CommentFilter,
        start: i64,
        limit: i64,
    ) -> Result<(u64, Vec<CommentRecord>), DatabaseError> {
        let mut conditions = Vec::new();
        if filter.post.is_some() {
            conditions.push("post = $post");
        }
        if filter.author.is_some() {
            conditions.push("author = $author");
        }
        if filter.search.is_some() {
            conditions.push("string::contains(string::lowercase(body), $search)");
        }
        let clause = where_clause(&conditions);

        let mut response = self
            .db
            .query(format!(
                "SELECT count() AS count FROM comment {clause} GROUP ALL;
                SELECT {COMMENT_FIELDS} FROM comment {clause}
                    ORDER BY created_at DESC LIMIT $limit START $start;"
            ))
            .bind(("post", filter.post.clone().unwrap_or_default()))
            .bind(("author", filter.author.clone().unwrap_or_default()))
            .bind(("search", filter.search.as_deref().map(str::to_lowercase).unwrap_or_default()))
            .bind(("limit", limit))
            .bind(("start", start))
            .await
            .context("Listing comments")?;

        let count = response.take::<Option<CountRow>>(0).context("Counting comments")?;
        let rows = response.take::<Vec<CommentRecord>>(1).context("Parsing comments")?;
        Ok((CountRow::total(count), rows))
    }

    pub(crate) async fn update_comment(&self, record: &CommentRecord) -> Result<(), DatabaseError> {
        self.db
            .query("UPDATE comment SET body = $body, updated_at = $updated_at WHERE uid = $uid RETURN NONE")
            .bind(("uid", record.uid.clone()))
            .bind(("body", record.body.clone()))
            .bind(("updated_at", record.updated_at))
            .await
            .context("Updating comment")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    /// Deletes a comment and its replies. Returns every deleted id.
    pub(crate) async fn delete_comment(&self, uid: &str) -> Result<Vec<String>, DatabaseError> {
        let replies = self
            .db
            .query("SELECT VALUE uid FROM comment WHERE parent = $uid")
            .bind(("uid", uid.to_owned()))
            .await
            .context("Collecting replies")?
            .take::<Vec<String>>(0)
            .context("Parsing replies")?;

        self.db
            .query("DELETE comment WHERE uid = $uid OR parent = $uid")
            .bind(("uid", uid.to_owned()))
            .await
            .context("Deleting comment")?
            .check()
            .map_err(surrealdb::Error::from)?;

        let mut removed = Vec::with_capacity(replies.len() + 1);
        removed.push(uid.to_owned());
        removed.extend(replies);
        Ok(removed)
    }
}

fn where_clause(conditions: &[&str]) -> String {
    if conditions.is_empty() { String::new() } else { format!("WHERE {}", conditions.join(" AND ")) }
}
