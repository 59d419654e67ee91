use crate::error::AccountsError;
use crate::models::{
    Account, AccountRecord, LoginRequest, RegisterRequest, UpdateProfileRequest, UserDetail,
    UserSummary, validate_username,
};
use crate::repository::{AccountRepository, CreateError, FollowDirection};
use flock_database::Database;
use flock_domain::config::AccountsConfig;
use flock_domain::events::AccountFollowed;
use flock_event_bus::EventBus;
use flock_kernel::clock::now_micros;
use flock_kernel::safe_nanoid;
use flock_kernel::security::password::{generate_token, hash_password, verify_password};
use flock_kernel::server::{Page, PageRequest};
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub(crate) const NO_CREDENTIALS: &str = "Authentication credentials were not provided.";
pub(crate) const INVALID_TOKEN: &str = "Invalid token.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";

/// Account operations shared by the HTTP handlers and the other slices.
///
/// Token lookups go through a TTL cache; logout evicts the caller's keys.
#[derive(Debug, Clone)]
pub struct AccountService {
    repo: AccountRepository,
    events: EventBus,
    tokens: Cache<String, String>,
    min_password_length: usize,
}

impl AccountService {
    #[must_use]
    pub fn new(config: &AccountsConfig, database: Database, events: EventBus) -> Self {
        let tokens = Cache::builder()
            .max_capacity(config.token_cache_capacity)
            .time_to_live(Duration::from_secs(config.token_cache_ttl_seconds))
            .build();

        Self {
            repo: AccountRepository::new(database),
            events,
            tokens,
            min_password_length: config.min_password_length,
        }
    }

    // --- Credentials ---

    /// Creates the account and its first token.
    ///
    /// # Errors
    /// Validation errors for bad input or taken usernames/emails; storage errors otherwise.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<(UserDetail, String), AccountsError> {
        request.validate(self.min_password_length)?;

        if self.repo.username_taken(&request.username).await? {
            return Err(AccountsError::validation(USERNAME_TAKEN));
        }
        if self.repo.email_taken(&request.email).await? {
            return Err(AccountsError::validation(EMAIL_TAKEN));
        }

        let now = now_micros();
        let record = AccountRecord {
            uid: safe_nanoid!(),
            username: request.username,
            email: request.email,
            first_name: request.first_name.unwrap_or_default(),
            last_name: request.last_name.unwrap_or_default(),
            bio: request.bio,
            profile_picture: request.profile_picture,
            password_hash: hash_password(request.password).await?,
            created_at: now,
            updated_at: now,
        };
        let uid = record.uid.clone();
        self.repo.create(record.clone()).await.map_err(|e| match e {
            CreateError::UsernameTaken => AccountsError::validation(USERNAME_TAKEN),
            CreateError::EmailTaken => AccountsError::validation(EMAIL_TAKEN),
            CreateError::Database(e) => e.into(),
        })?;

        let token = generate_token();
        self.repo.create_token(&uid, &token, now).await?;
        info!(%uid, "Account registered");

        Ok((UserDetail::new(record.into(), 0, 0), token))
    }

    /// Checks the credentials and returns the account's token, creating one if needed.
    ///
    /// # Errors
    /// Validation errors for missing or wrong credentials.
    pub async fn login(&self, request: LoginRequest) -> Result<(UserDetail, String), AccountsError> {
        let (Some(username), Some(password)) = (
            request.username.filter(|u| !u.is_empty()),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AccountsError::validation("Must provide both username and password."));
        };

        let bad_credentials = || AccountsError::validation("Unable to log in with provided credentials.");
        let record = self.repo.find_by_username(&username).await?.ok_or_else(bad_credentials)?;
        if !verify_password(password, record.password_hash.clone()).await? {
            debug!(uid = %record.uid, "Rejected login");
            return Err(bad_credentials());
        }

        let token = match self.repo.token_of(&record.uid).await? {
            Some(token) => token,
            None => {
                let token = generate_token();
                self.repo.create_token(&record.uid, &token, now_micros()).await?;
                token
            },
        };

        let detail = self.detail_of(record.into()).await?;
        Ok((detail, token))
    }

    /// Deletes the caller's token(s) and evicts them from the cache.
    ///
    /// # Errors
    /// Validation error if the account had no token.
    pub async fn logout(&self, account: &str) -> Result<(), AccountsError> {
        let keys = self.repo.delete_tokens(account).await?;
        if keys.is_empty() {
            return Err(AccountsError::validation("Token not found"));
        }
        for key in keys {
            self.tokens.invalidate(&key).await;
        }
        info!(uid = %account, "Logged out");
        Ok(())
    }

    /// Resolves an API token to its account.
    ///
    /// # Errors
    /// [`AccountsError::Unauthorized`] for unknown tokens or deleted accounts.
    pub async fn authenticate(&self, token: &str) -> Result<Account, AccountsError> {
        let uid = match self.tokens.get(token).await {
            Some(uid) => uid,
            None => {
                let uid = self
                    .repo
                    .account_of_token(token)
                    .await?
                    .ok_or_else(|| AccountsError::unauthorized(INVALID_TOKEN))?;
                self.tokens.insert(token.to_owned(), uid.clone()).await;
                uid
            },
        };

        match self.repo.find(&uid).await? {
            Some(record) => Ok(record.into()),
            None => {
                warn!(%uid, "Token points at a missing account");
                self.tokens.invalidate(token).await;
                Err(AccountsError::unauthorized(INVALID_TOKEN))
            },
        }
    }

    // --- Profiles ---

    /// # Errors
    /// [`AccountsError::NotFound`] if there is no such account.
    pub async fn profile(&self, uid: &str) -> Result<UserDetail, AccountsError> {
        let record = self.repo.find(uid).await?.ok_or_else(|| AccountsError::not_found("Not found."))?;
        self.detail_of(record.into()).await
    }

    /// Applies the supplied profile fields.
    ///
    /// # Errors
    /// Storage errors, or [`AccountsError::NotFound`] if the account vanished.
    pub async fn update_profile(
        &self,
        uid: &str,
        changes: UpdateProfileRequest,
    ) -> Result<UserDetail, AccountsError> {
        let mut record =
            self.repo.find(uid).await?.ok_or_else(|| AccountsError::not_found("Not found."))?;

        if let Some(first_name) = changes.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            record.last_name = last_name;
        }
        if let Some(bio) = changes.bio {
            record.bio = Some(bio).filter(|b| !b.is_empty());
        }
        if let Some(profile_picture) = changes.profile_picture {
            record.profile_picture = Some(profile_picture).filter(|p| !p.is_empty());
        }
        record.updated_at = now_micros();

        self.repo.update_profile(&record).await?;
        self.detail_of(record.into()).await
    }

    /// The user directory, newest first.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<UserDetail>, AccountsError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let (count, records) = self.repo.list(search, page.offset(), page.limit()).await?;

        let uids = records.iter().map(|r| r.uid.clone()).collect();
        let counts = self.repo.follow_counts_many(uids).await?;
        let results = records
            .into_iter()
            .map(|record| {
                let tally = counts.get(&record.uid).copied().unwrap_or_default();
                UserDetail::new(record.into(), tally.followers, tally.following)
            })
            .collect();

        Ok(page.into_page(count, results))
    }

    // --- Follows ---

    /// `follower` starts following `target`. Returns the target's username and the
    /// follower's new following count.
    ///
    /// # Errors
    /// Validation errors for self-follows and duplicates, not found for unknown targets.
    #[instrument(skip(self))]
    pub async fn follow(&self, follower: &str, target: &str) -> Result<(String, u64), AccountsError> {
        let followee = self.follow_target(follower, target, "You cannot follow yourself.").await?;

        let duplicate =
            || AccountsError::validation(format!("You are already following {}.", followee.username));
        if self.repo.is_following(follower, &followee.uid).await? {
            return Err(duplicate());
        }
        if !self.repo.follow(follower, &followee.uid, now_micros()).await? {
            return Err(duplicate());
        }

        if let Err(e) = self.events.publish(AccountFollowed {
            follower: follower.to_owned(),
            followee: followee.uid.clone(),
        }) {
            warn!(error = %e, "Failed to publish AccountFollowed");
        }

        let counts = self.repo.follow_counts(follower).await?;
        Ok((followee.username, counts.following))
    }

    /// # Errors
    /// Validation errors for self-unfollows and missing edges, not found for unknown targets.
    #[instrument(skip(self))]
    pub async fn unfollow(
        &self,
        follower: &str,
        target: &str,
    ) -> Result<(String, u64), AccountsError> {
        let followee = self.follow_target(follower, target, "You cannot unfollow yourself.").await?;

        if !self.repo.is_following(follower, &followee.uid).await? {
            return Err(AccountsError::validation(format!(
                "You are not following {}.",
                followee.username
            )));
        }
        self.repo.unfollow(follower, &followee.uid).await?;

        let counts = self.repo.follow_counts(follower).await?;
        Ok((followee.username, counts.following))
    }

    /// Followers or followees of `uid`, most recent edge first.
    ///
    /// # Errors
    /// [`AccountsError::NotFound`] for unknown accounts.
    pub async fn connections(
        &self,
        uid: &str,
        direction: FollowDirection,
        page: PageRequest,
    ) -> Result<Page<UserSummary>, AccountsError> {
        if self.repo.find(uid).await?.is_none() {
            return Err(AccountsError::not_found("Not found."));
        }

        let (count, edges) = self.repo.edges(uid, direction, page.offset(), page.limit()).await?;
        let others: Vec<String> = edges
            .into_iter()
            .map(|edge| match direction {
                FollowDirection::Followers => edge.follower,
                FollowDirection::Following => edge.followee,
            })
            .collect();

        let accounts = self.accounts_by_ids(&others).await?;
        let results = others
            .iter()
            .filter_map(|id| accounts.iter().find(|a| &a.id == id).cloned().map(UserSummary::from))
            .collect();

        Ok(page.into_page(count, results))
    }

    // --- Lookups for other slices ---

    /// # Errors
    /// Storage errors.
    pub async fn find(&self, uid: &str) -> Result<Option<Account>, AccountsError> {
        Ok(self.repo.find(uid).await?.map(Account::from))
    }

    /// # Errors
    /// Storage errors.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountsError> {
        if validate_username(username).is_err() {
            return Ok(None);
        }
        Ok(self.repo.find_by_username(username).await?.map(Account::from))
    }

    /// Accounts with the given ids, in no particular order. Unknown ids are skipped.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn accounts_by_ids(&self, ids: &[String]) -> Result<Vec<Account>, AccountsError> {
        let records = self.repo.find_many(ids.to_vec()).await?;
        Ok(records.into_iter().map(Account::from).collect())
    }

    /// Accounts with the given usernames. Unknown names are skipped.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn accounts_by_usernames(
        &self,
        usernames: &[String],
    ) -> Result<Vec<Account>, AccountsError> {
        let records = self.repo.find_many_by_username(usernames.to_vec()).await?;
        Ok(records.into_iter().map(Account::from).collect())
    }

    /// Ids of everyone `uid` follows.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn following_ids(&self, uid: &str) -> Result<Vec<String>, AccountsError> {
        Ok(self.repo.followees(uid).await?)
    }

    async fn detail_of(&self, account: Account) -> Result<UserDetail, AccountsError> {
        let counts = self.repo.follow_counts(&account.id).await?;
        Ok(UserDetail::new(account, counts.followers, counts.following))
    }

    async fn follow_target(
        &self,
        follower: &str,
        target: &str,
        self_message: &'static str,
    ) -> Result<AccountRecord, AccountsError> {
        if follower == target {
            return Err(AccountsError::validation(self_message));
        }
        self.repo.find(target).await?.ok_or_else(|| AccountsError::not_found("Not found."))
    }
}
