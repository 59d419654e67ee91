use crate::error::NotificationsError;
use crate::models::{
    ActorView, BulkAction, NotificationDetail, NotificationListItem, NotificationRecord,
    NotificationView, PreferenceRecord, PreferenceView, TargetData, UpdatePreferencesRequest,
    preview,
};
use crate::repository::{NotificationFilter, NotificationRepository};
use flock_accounts::{Account, AccountService};
use flock_database::Database;
use flock_domain::config::NotificationsConfig;
use flock_domain::constants::NOTIFICATION;
use flock_domain::notifications::{TargetType, Verb};
use flock_kernel::clock::{from_micros, now_micros};
use flock_kernel::safe_nanoid;
use flock_kernel::security::resource::ResourceGuard;
use flock_kernel::server::{Page, PageRequest};
use flock_posts::PostService;
use fxhash::FxHashMap;
use tracing::{debug, instrument};

const NOT_FOUND: &str = "Not found.";

/// Creates, reads and tidies notifications, and owns the per-account preferences.
#[derive(Debug, Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    accounts: AccountService,
    posts: PostService,
    config: NotificationsConfig,
}

impl NotificationService {
    #[must_use]
    pub fn new(
        config: &NotificationsConfig,
        database: Database,
        accounts: AccountService,
        posts: PostService,
    ) -> Self {
        Self {
            repo: NotificationRepository::new(database),
            accounts,
            posts,
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn page(&self, page: Option<u32>, page_size: Option<u32>) -> PageRequest {
        PageRequest::new(page, page_size, self.config.default_page_size, self.config.max_page_size)
    }

    // --- Creation ---

    /// Notifies `recipient` unless they are the actor or have muted `verb`.
    ///
    /// Returns whether a notification was stored.
    ///
    /// # Errors
    /// Storage errors.
    #[instrument(skip(self), fields(verb = verb.as_str()))]
    pub async fn notify(
        &self,
        recipient: &str,
        actor: &str,
        verb: Verb,
        target: Option<(TargetType, &str)>,
    ) -> Result<bool, NotificationsError> {
        if recipient == actor {
            return Ok(false);
        }

        let preferences = self.preferences_record(recipient).await?;
        if !preferences.enabled().allows(verb) {
            debug!("Recipient muted this verb");
            return Ok(false);
        }

        let now = now_micros();
        self.repo
            .create(NotificationRecord {
                uid: safe_nanoid!(),
                recipient: recipient.to_owned(),
                actor: actor.to_owned(),
                verb: verb.as_str().to_owned(),
                target_type: target.map(|(kind, _)| kind.as_str().to_owned()),
                target_id: target.map(|(_, id)| id.to_owned()),
                is_read: false,
                created_at: now,
                updated_at: now,
            })
            .await?;
        Ok(true)
    }

    /// Sends a mention to every existing account among `usernames`.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn notify_mentions(
        &self,
        usernames: &[String],
        actor: &str,
        target: (TargetType, &str),
    ) -> Result<usize, NotificationsError> {
        if usernames.is_empty() {
            return Ok(0);
        }
        let mut sent = 0;
        for account in self.accounts.accounts_by_usernames(usernames).await? {
            if self.notify(&account.id, actor, Verb::Mention, Some(target)).await? {
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// # Errors
    /// Storage errors.
    pub async fn forget_targets(
        &self,
        target_type: TargetType,
        targets: Vec<String>,
    ) -> Result<(), NotificationsError> {
        Ok(self.repo.delete_targeting(target_type, targets).await?)
    }

    // --- Reading ---

    /// # Errors
    /// Storage errors.
    pub async fn list(
        &self,
        recipient: &str,
        unread: Option<bool>,
        verb: Option<String>,
        page: PageRequest,
    ) -> Result<Page<NotificationListItem>, NotificationsError> {
        let filter = NotificationFilter {
            is_read: unread.map(|unread| !unread),
            verb: verb.filter(|v| !v.is_empty()),
        };
        let (count, records) =
            self.repo.list(recipient, &filter, page.offset(), page.limit()).await?;
        let actors = self.actors(&records).await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let Some(actor) = actors.get(&record.actor) else { continue };
            let verb = record.verb()?;
            items.push(NotificationListItem {
                id: record.uid,
                actor_username: actor.username.clone(),
                verb,
                notification_message: verb.message(&actor.username),
                is_read: record.is_read,
                created_at: from_micros(record.created_at),
            });
        }
        Ok(page.into_page(count, items))
    }

    /// # Errors
    /// [`NotificationsError::NotFound`] unless the notification belongs to `recipient`.
    pub async fn detail(
        &self,
        recipient: &str,
        uid: &str,
    ) -> Result<NotificationDetail, NotificationsError> {
        let record = self.require(recipient, uid).await?;
        let target_type = record.target_type();

        let target_data = match (target_type, record.target_id.as_deref()) {
            (Some(kind), Some(id)) => self.target_content(kind, id).await?.map(|content| {
                TargetData {
                    id: id.to_owned(),
                    kind,
                    preview: preview(&content, self.config.preview_length),
                }
            }),
            _ => None,
        };
        let view = self.view(record).await?;

        Ok(NotificationDetail {
            id: view.id,
            recipient: view.recipient,
            actor: view.actor,
            verb: view.verb,
            notification_message: view.notification_message,
            target_type,
            target_data,
            is_read: view.is_read,
            created_at: view.created_at,
            updated_at: view.updated_at,
        })
    }

    /// # Errors
    /// Storage errors.
    pub async fn unread_count(&self, recipient: &str) -> Result<u64, NotificationsError> {
        Ok(self.repo.unread_count(recipient).await?)
    }

    // --- Read state ---

    /// # Errors
    /// [`NotificationsError::NotFound`] unless the notification belongs to `recipient`.
    pub async fn mark_read(
        &self,
        recipient: &str,
        uid: &str,
    ) -> Result<NotificationView, NotificationsError> {
        let mut record = self.require(recipient, uid).await?;
        record.is_read = true;
        record.updated_at = now_micros();
        self.repo.set_read(vec![record.uid.clone()], true, record.updated_at).await?;
        self.view(record).await
    }

    /// Returns how many unread notifications were marked.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn mark_all_read(&self, recipient: &str) -> Result<u64, NotificationsError> {
        let unread = self.repo.owned(recipient, None, true).await?;
        let count = unread.len() as u64;
        self.repo.set_read(unread, true, now_micros()).await?;
        Ok(count)
    }

    /// Applies `action` to the caller's notifications among `uids`.
    ///
    /// Returns the message and how many notifications were affected.
    ///
    /// # Errors
    /// Validation error for an empty id list, not found when none belong to `recipient`.
    #[instrument(skip(self, uids), fields(ids = uids.len()))]
    pub async fn bulk_action(
        &self,
        recipient: &str,
        uids: Vec<String>,
        action: BulkAction,
    ) -> Result<(String, u64), NotificationsError> {
        if uids.is_empty() {
            return Err(NotificationsError::validation(
                "At least one notification ID must be provided.",
            ));
        }

        let uids = uids.iter().filter_map(|id| ResourceGuard::verify(id, NOTIFICATION).ok()).collect();
        let owned = self.repo.owned(recipient, Some(uids), false).await?;
        if owned.is_empty() {
            return Err(NotificationsError::not_found("No matching notifications found."));
        }
        let count = owned.len() as u64;

        let message = match action {
            BulkAction::MarkRead => {
                self.repo.set_read(owned, true, now_micros()).await?;
                format!("Marked {count} notification(s) as read")
            },
            BulkAction::MarkUnread => {
                self.repo.set_read(owned, false, now_micros()).await?;
                format!("Marked {count} notification(s) as unread")
            },
            BulkAction::Delete => {
                self.repo.delete(owned).await?;
                format!("Deleted {count} notification(s)")
            },
        };
        Ok((message, count))
    }

    /// Deletes every notification of `recipient`. Returns how many were deleted.
    ///
    /// # Errors
    /// Storage errors.
    pub async fn clear_all(&self, recipient: &str) -> Result<u64, NotificationsError> {
        let all = self.repo.owned(recipient, None, false).await?;
        let count = all.len() as u64;
        self.repo.delete(all).await?;
        Ok(count)
    }

    // --- Preferences ---

    /// # Errors
    /// Storage errors.
    pub async fn preferences(&self, account: &str) -> Result<PreferenceView, NotificationsError> {
        Ok(self.preferences_record(account).await?.into())
    }

    /// # Errors
    /// Storage errors.
    pub async fn update_preferences(
        &self,
        account: &str,
        changes: UpdatePreferencesRequest,
    ) -> Result<PreferenceView, NotificationsError> {
        let mut record = self.preferences_record(account).await?;
        record.apply(changes);
        record.updated_at = now_micros();
        self.repo.update_preferences(record.clone()).await?;
        Ok(record.into())
    }

    // --- Helpers ---

    async fn preferences_record(&self, account: &str) -> Result<PreferenceRecord, NotificationsError> {
        let defaults = PreferenceRecord::with_defaults(account, now_micros());
        Ok(self.repo.preferences_or_create(defaults).await?)
    }

    async fn require(
        &self,
        recipient: &str,
        uid: &str,
    ) -> Result<NotificationRecord, NotificationsError> {
        self.repo
            .find(uid, recipient)
            .await?
            .ok_or_else(|| NotificationsError::not_found(NOT_FOUND))
    }

    /// Content of the post or comment a notification points at.
    async fn target_content(
        &self,
        target_type: TargetType,
        uid: &str,
    ) -> Result<Option<String>, NotificationsError> {
        let content = match target_type {
            TargetType::Post => self.posts.post_content(uid).await?,
            TargetType::Comment => self.posts.comment_content(uid).await?,
        };
        Ok(content)
    }

    async fn actors(
        &self,
        records: &[NotificationRecord],
    ) -> Result<FxHashMap<String, Account>, NotificationsError> {
        let mut ids: Vec<String> = records.iter().map(|r| r.actor.clone()).collect();
        ids.sort_unstable();
        ids.dedup();
        let accounts = self.accounts.accounts_by_ids(&ids).await?;
        Ok(accounts.into_iter().map(|account| (account.id.clone(), account)).collect())
    }

    async fn view(&self, record: NotificationRecord) -> Result<NotificationView, NotificationsError> {
        let actor = self
            .accounts
            .find(&record.actor)
            .await?
            .ok_or_else(|| NotificationsError::not_found(NOT_FOUND))?;
        let verb = record.verb()?;

        Ok(NotificationView {
            notification_message: verb.message(&actor.username),
            target_type: record.target_type(),
            id: record.uid,
            recipient: record.recipient,
            actor: ActorView::from(actor),
            verb,
            target_id: record.target_id,
            is_read: record.is_read,
            created_at: from_micros(record.created_at),
            updated_at: from_micros(record.updated_at),
        })
    }
}
