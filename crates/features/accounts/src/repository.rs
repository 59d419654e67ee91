use crate::models::AccountRecord;
use flock_database::{CountRow, Database, DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use surrealdb::types::SurrealValue;
use tracing::instrument;

const ACCOUNT_FIELDS: &str = "uid, username, email, first_name, last_name, bio, profile_picture, \
                              password_hash, created_at, updated_at";

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct FollowEdge {
    pub follower: String,
    pub followee: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
struct FollowerTally {
    followee: String,
    count: i64,
}

#[derive(Debug, Clone, SurrealValue)]
struct FollowingTally {
    follower: String,
    count: i64,
}

/// Follower and following totals of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

/// Why an account insert was refused.
#[derive(Debug)]
pub(crate) enum CreateError {
    UsernameTaken,
    EmailTaken,
    Database(DatabaseError),
}

impl From<DatabaseError> for CreateError {
    fn from(e: DatabaseError) -> Self {
        Self::Database(e)
    }
}

/// Which side of the follow edge a listing walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDirection {
    Followers,
    Following,
}

#[derive(Debug, Clone)]
pub(crate) struct AccountRepository {
    db: Database,
}

impl AccountRepository {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }

    // --- Accounts ---

    #[instrument(skip(self, record), fields(uid = %record.uid))]
    pub(crate) async fn create(&self, record: AccountRecord) -> Result<(), CreateError> {
        let (username, email) = (record.username.clone(), record.email.clone());
        let created = async {
            self.db
                .query("CREATE account CONTENT $record RETURN NONE")
                .bind(("record", record))
                .await
                .context("Creating account")?
                .check()
                .map_err(surrealdb::Error::from)?;
            Ok::<_, DatabaseError>(())
        }
        .await;

        let Err(e) = created else { return Ok(()) };
        if e.is_unique_violation("account_username") {
            return Err(CreateError::UsernameTaken);
        }
        if e.is_unique_violation("account_email") {
            return Err(CreateError::EmailTaken);
        }
        if e.is_write_conflict() {
            if self.username_taken(&username).await? {
                return Err(CreateError::UsernameTaken);
            }
            if self.email_taken(&email).await? {
                return Err(CreateError::EmailTaken);
            }
        }
        Err(e.into())
    }

    pub(crate) async fn find(&self, uid: &str) -> Result<Option<AccountRecord>, DatabaseError> {
        self.db
            .query(format!("SELECT {ACCOUNT_FIELDS} FROM account WHERE uid = $uid LIMIT 1"))
            .bind(("uid", uid.to_owned()))
            .await
            .context("Loading account")?
            .take::<Option<AccountRecord>>(0)
            .context("Parsing account")
    }

    pub(crate) async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AccountRecord>, DatabaseError> {
        self.db
            .query(format!("SELECT {ACCOUNT_FIELDS} FROM account WHERE username = $username LIMIT 1"))
            .bind(("username", username.to_owned()))
            .await
            .context("Loading account by username")?
            .take::<Option<AccountRecord>>(0)
            .context("Parsing account")
    }

    pub(crate) async fn find_many(
        &self,
        uids: Vec<String>,
    ) -> Result<Vec<AccountRecord>, DatabaseError> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .query(format!("SELECT {ACCOUNT_FIELDS} FROM account WHERE uid IN $uids"))
            .bind(("uids", uids))
            .await
            .context("Loading accounts")?
            .take::<Vec<AccountRecord>>(0)
            .context("Parsing accounts")
    }

    pub(crate) async fn find_many_by_username(
        &self,
        usernames: Vec<String>,
    ) -> Result<Vec<AccountRecord>, DatabaseError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .query(format!("SELECT {ACCOUNT_FIELDS} FROM account WHERE username IN $usernames"))
            .bind(("usernames", usernames))
            .await
            .context("Resolving usernames")?
            .take::<Vec<AccountRecord>>(0)
            .context("Parsing accounts")
    }

    pub(crate) async fn username_taken(&self, username: &str) -> Result<bool, DatabaseError> {
        let hit = self
            .db
            .query("SELECT VALUE uid FROM account WHERE username = $username LIMIT 1")
            .bind(("username", username.to_owned()))
            .await
            .context("Checking username")?
            .take::<Option<String>>(0)
            .context("Parsing username check")?;
        Ok(hit.is_some())
    }

    pub(crate) async fn email_taken(&self, email: &str) -> Result<bool, DatabaseError> {
        let hit = self
            .db
            .query("SELECT VALUE uid FROM account WHERE email = $email LIMIT 1")
            .bind(("email", email.to_owned()))
            .await
            .context("Checking email")?
            .take::<Option<String>>(0)
            .context("Parsing email check")?;
        Ok(hit.is_some())
    }

    /// Overwrites the editable profile fields of `record.uid`.
    pub(crate) async fn update_profile(&self, record: &AccountRecord) -> Result<(), DatabaseError> {
        self.db
            .query(
                "UPDATE account SET
                    first_name = $first_name,
                    last_name = $last_name,
                    bio = $bio,
                    profile_picture = $profile_picture,
                    updated_at = $updated_at
                WHERE uid = $uid RETURN NONE",
            )
            .bind(("uid", record.uid.clone()))
            .bind(("first_name", record.first_name.clone()))
            .bind(("last_name", record.last_name.clone()))
            .bind(("bio", record.bio.clone()))
            .bind(("profile_picture", record.profile_picture.clone()))
            .bind(("updated_at", record.updated_at))
            .await
            .context("Updating profile")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    /// Newest accounts first, optionally narrowed to usernames containing `search`.
    pub(crate) async fn list(
        &self,
        search: Option<&str>,
        start: i64,
        limit: i64,
    ) -> Result<(u64, Vec<AccountRecord>), DatabaseError> {
        let filter = if search.is_some() {
            "WHERE string::contains(string::lowercase(username), $search)"
        } else {
            ""
        };
        let mut response = self
            .db
            .query(format!(
                "SELECT count() AS count FROM account {filter} GROUP ALL;
                SELECT {ACCOUNT_FIELDS} FROM account {filter}
                    ORDER BY created_at DESC LIMIT $limit START $start;"
            ))
            .bind(("search", search.map(str::to_lowercase).unwrap_or_default()))
            .bind(("limit", limit))
            .bind(("start", start))
            .await
            .context("Listing accounts")?;

        let count = response.take::<Option<CountRow>>(0).context("Counting accounts")?;
        let rows = response.take::<Vec<AccountRecord>>(1).context("Parsing accounts")?;
        Ok((CountRow::total(count), rows))
    }

    // --- Tokens ---

    pub(crate) async fn token_of(&self, account: &str) -> Result<Option<String>, DatabaseError> {
        self.db
            .query("SELECT VALUE key FROM auth_token WHERE account = $account LIMIT 1")
            .bind(("account", account.to_owned()))
            .await
            .context("Loading token")?
            .take::<Option<String>>(0)
            .context("Parsing token")
    }

    pub(crate) async fn create_token(
        &self,
        account: &str,
        key: &str,
        now: i64,
    ) -> Result<(), DatabaseError> {
        self.db
            .query(
                "CREATE auth_token CONTENT { key: $key, account: $account, created_at: $now }
                RETURN NONE",
            )
            .bind(("key", key.to_owned()))
            .bind(("account", account.to_owned()))
            .bind(("now", now))
            .await
            .context("Creating token")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    pub(crate) async fn account_of_token(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.db
            .query("SELECT VALUE account FROM auth_token WHERE key = $key LIMIT 1")
            .bind(("key", key.to_owned()))
            .await
            .context("Resolving token")?
            .take::<Option<String>>(0)
            .context("Parsing token owner")
    }

    /// Deletes every token of `account` and returns the deleted keys.
    pub(crate) async fn delete_tokens(&self, account: &str) -> Result<Vec<String>, DatabaseError> {
        let keys = self
            .db
            .query("SELECT VALUE key FROM auth_token WHERE account = $account")
            .bind(("account", account.to_owned()))
            .await
            .context("Collecting tokens")?
            .take::<Vec<String>>(0)
            .context("Parsing tokens")?;

        self.db
            .query("DELETE auth_token WHERE account = $account")
            .bind(("account", account.to_owned()))
            .await
            .context("Deleting tokens")?
            .check()
            .map_err(surrealdb::Error::from)?;

        Ok(keys)
    }

    // --- Follows ---

    pub(crate) async fn is_following(
        &self,
        follower: &str,
        followee: &str,
    ) -> Result<bool, DatabaseError> {
        let hit = self
            .db
            .query(
                "SELECT VALUE follower FROM follow
                WHERE follower = $follower AND followee = $followee LIMIT 1",
            )
            .bind(("follower", follower.to_owned()))
            .bind(("followee", followee.to_owned()))
            .await
            .context("Checking follow")?
            .take::<Option<String>>(0)
            .context("Parsing follow check")?;
        Ok(hit.is_some())
    }

    /// Returns `false` when the edge already existed, including one committed concurrently.
    pub(crate) async fn follow(
        &self,
        follower: &str,
        followee: &str,
        now: i64,
    ) -> Result<bool, DatabaseError> {
        let created = async {
            self.db
                .query(
                    "CREATE follow CONTENT { follower: $follower, followee: $followee, created_at: $now }
                    RETURN NONE",
                )
                .bind(("follower", follower.to_owned()))
                .bind(("followee", followee.to_owned()))
                .bind(("now", now))
                .await
                .context("Creating follow")?
                .check()
                .map_err(surrealdb::Error::from)?;
            Ok::<_, DatabaseError>(())
        }
        .await;

        let Err(e) = created else { return Ok(true) };
        if e.is_unique_violation("follow_pair")
            || (e.is_write_conflict() && self.is_following(follower, followee).await?)
        {
            return Ok(false);
        }
        Err(e)
    }

    pub(crate) async fn unfollow(&self, follower: &str, followee: &str) -> Result<(), DatabaseError> {
        self.db
            .query("DELETE follow WHERE follower = $follower AND followee = $followee")
            .bind(("follower", follower.to_owned()))
            .bind(("followee", followee.to_owned()))
            .await
            .context("Deleting follow")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    pub(crate) async fn follow_counts(&self, uid: &str) -> Result<FollowCounts, DatabaseError> {
        let mut response = self
            .db
            .query(
                "SELECT count() AS count FROM follow WHERE followee = $uid GROUP ALL;
                SELECT count() AS count FROM follow WHERE follower = $uid GROUP ALL;",
            )
            .bind(("uid", uid.to_owned()))
            .await
            .context("Counting follows")?;

        let followers = response.take::<Option<CountRow>>(0).context("Parsing followers")?;
        let following = response.take::<Option<CountRow>>(1).context("Parsing following")?;
        Ok(FollowCounts {
            followers: CountRow::total(followers),
            following: CountRow::total(following),
        })
    }

    /// Follow counts for several accounts in two grouped queries.
    pub(crate) async fn follow_counts_many(
        &self,
        uids: Vec<String>,
    ) -> Result<FxHashMap<String, FollowCounts>, DatabaseError> {
        if uids.is_empty() {
            return Ok(FxHashMap::default());
        }
        let mut response = self
            .db
            .query(
                "SELECT followee, count() AS count FROM follow WHERE followee IN $uids GROUP BY followee;
                SELECT follower, count() AS count FROM follow WHERE follower IN $uids GROUP BY follower;",
            )
            .bind(("uids", uids))
            .await
            .context("Counting follows")?;

        let followers = response.take::<Vec<FollowerTally>>(0).context("Parsing followers")?;
        let following = response.take::<Vec<FollowingTally>>(1).context("Parsing following")?;

        let mut counts: FxHashMap<String, FollowCounts> = FxHashMap::default();
        for tally in followers {
            counts.entry(tally.followee).or_default().followers = tally.count.unsigned_abs();
        }
        for tally in following {
            counts.entry(tally.follower).or_default().following = tally.count.unsigned_abs();
        }
        Ok(counts)
    }

    /// Everyone `uid` follows.
    pub(crate) async fn followees(&self, uid: &str) -> Result<Vec<String>, DatabaseError> {
        self.db
            .query("SELECT VALUE followee FROM follow WHERE follower = $uid")
            .bind(("uid", uid.to_owned()))
            .await
            .context("Loading followees")?
            .take::<Vec<String>>(0)
            .context("Parsing followees")
    }

    /// One page of edges around `uid`, most recent first.
    pub(crate) async fn edges(
        &self,
        uid: &str,
        direction: FollowDirection,
        start: i64,
        limit: i64,
    ) -> Result<(u64, Vec<FollowEdge>), DatabaseError> {
        let column = match direction {
            FollowDirection::Followers => "followee",
            FollowDirection::Following => "follower",
        };
        let mut response = self
            .db
            .query(format!(
                "SELECT count() AS count FROM follow WHERE {column} = $uid GROUP ALL;
                SELECT follower, followee, created_at FROM follow WHERE {column} = $uid
                    ORDER BY created_at DESC LIMIT $limit START $start;"
            ))
            .bind(("uid", uid.to_owned()))
            .bind(("limit", limit))
            .bind(("start", start))
            .await
            .context("Listing follows")?;

        let count = response.take::<Option<CountRow>>(0).context("Counting follows")?;
        let edges = response.take::<Vec<FollowEdge>>(1).context("Parsing follows")?;
        Ok((CountRow::total(count), edges))
    }
}
