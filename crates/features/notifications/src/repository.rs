use crate::models::{NotificationRecord, PreferenceRecord};
use flock_database::{CountRow, Database, DatabaseError, DatabaseErrorExt};
use flock_domain::notifications::TargetType;
use tracing::{debug, instrument};

const NOTIFICATION_FIELDS: &str =
    "uid, recipient, actor, verb, target_type, target_id, is_read, created_at, updated_at";
const PREFERENCE_FIELDS: &str = "account, notify_on_follow, notify_on_like, notify_on_comment, \
    notify_on_mention, notify_on_reply, email_on_follow, email_on_like, email_on_comment, \
    created_at, updated_at";

/// Filters of a recipient's notification listing.
#[derive(Debug, Clone, Default)]
pub(crate) struct NotificationFilter {
    pub is_read: Option<bool>,
    pub verb: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct NotificationRepository {
    db: Database,
}

impl NotificationRepository {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }

    // --- Notifications ---

    pub(crate) async fn create(&self, record: NotificationRecord) -> Result<(), DatabaseError> {
        self.db
            .query("CREATE notification CONTENT $record RETURN NONE")
            .bind(("record", record))
            .await
            .context("Creating notification")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    pub(crate) async fn find(
        &self,
        uid: &str,
        recipient: &str,
    ) -> Result<Option<NotificationRecord>, DatabaseError> {
        self.db
            .query(format!(
                "SELECT {NOTIFICATION_FIELDS} FROM notification
                WHERE uid = $uid AND recipient = $recipient LIMIT 1"
            ))
            .bind(("uid", uid.to_owned()))
            .bind(("recipient", recipient.to_owned()))
            .await
            .context("Loading notification")?
            .take::<Option<NotificationRecord>>(0)
            .context("Parsing notification")
    }

    /// One page of `recipient`'s notifications, newest first.
    pub(crate) async fn list(
        &self,
        recipient: &str,
        filter: &NotificationFilter,
        start: i64,
        limit: i64,
    ) -> Result<(u64, Vec<NotificationRecord>), DatabaseError> {
        let mut clause = String::from("WHERE recipient = $recipient");
        if filter.is_read.is_some() {
            clause.push_str(" AND is_read = $is_read");
        }
        if filter.verb.is_some() {
            clause.push_str(" AND verb = $verb");
        }

        let mut response = self
            .db
            .query(format!(
                "SELECT count() AS count FROM notification {clause} GROUP ALL;
                SELECT {NOTIFICATION_FIELDS} FROM notification {clause}
                    ORDER BY created_at DESC LIMIT $limit START $start;"
            ))
            .bind(("recipient", recipient.to_owned()))
            .bind(("is_read", filter.is_read.unwrap_or_default()))
            .bind(("verb", filter.verb.clone().unwrap_or_default()))
            .bind(("limit", limit))
            .bind(("start", start))
            .await
            .context("Listing notifications")?;

        let count = response.take::<Option<CountRow>>(0).context("Counting notifications")?;
        let rows = response.take::<Vec<NotificationRecord>>(1).context("Parsing notifications")?;
        Ok((CountRow::total(count), rows))
    }

    pub(crate) async fn unread_count(&self, recipient: &str) -> Result<u64, DatabaseError> {
        let row = self
            .db
            .query(
                "SELECT count() AS count FROM notification
                WHERE recipient = $recipient AND is_read = false GROUP ALL",
            )
            .bind(("recipient", recipient.to_owned()))
            .await
            .context("Counting unread notifications")?
            .take::<Option<CountRow>>(0)
            .context("Parsing unread count")?;
        Ok(CountRow::total(row))
    }

    /// Which of `uids` belong to `recipient`. When `unread_only` is set, read ones are left out.
    pub(crate) async fn owned(
        &self,
        recipient: &str,
        uids: Option<Vec<String>>,
        unread_only: bool,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut clause = String::from("WHERE recipient = $recipient");
        if uids.is_some() {
            clause.push_str(" AND uid IN $uids");
        }
        if unread_only {
            clause.push_str(" AND is_read = false");
        }

        self.db
            .query(format!("SELECT VALUE uid FROM notification {clause}"))
            .bind(("recipient", recipient.to_owned()))
            .bind(("uids", uids.unwrap_or_default()))
            .await
            .context("Selecting notifications")?
            .take::<Vec<String>>(0)
            .context("Parsing notification ids")
    }

    pub(crate) async fn set_read(
        &self,
        uids: Vec<String>,
        is_read: bool,
        now: i64,
    ) -> Result<(), DatabaseError> {
        if uids.is_empty() {
            return Ok(());
        }
        self.db
            .query(
                "UPDATE notification SET is_read = $is_read, updated_at = $now
                WHERE uid IN $uids RETURN NONE",
            )
            .bind(("uids", uids))
            .bind(("is_read", is_read))
            .bind(("now", now))
            .await
            .context("Updating read state")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    pub(crate) async fn delete(&self, uids: Vec<String>) -> Result<(), DatabaseError> {
        if uids.is_empty() {
            return Ok(());
        }
        self.db
            .query("DELETE notification WHERE uid IN $uids")
            .bind(("uids", uids))
            .await
            .context("Deleting notifications")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    /// Drops every notification pointing at one of `targets`.
    #[instrument(skip(self, targets), fields(target_type = target_type.as_str(), targets = targets.len()))]
    pub(crate) async fn delete_targeting(
        &self,
        target_type: TargetType,
        targets: Vec<String>,
    ) -> Result<(), DatabaseError> {
        if targets.is_empty() {
            return Ok(());
        }
        self.db
            .query("DELETE notification WHERE target_type = $target_type AND target_id IN $targets")
            .bind(("target_type", target_type.as_str().to_owned()))
            .bind(("targets", targets))
            .await
            .context("Deleting notifications of removed targets")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    // --- Preferences ---

    pub(crate) async fn find_preferences(
        &self,
        account: &str,
    ) -> Result<Option<PreferenceRecord>, DatabaseError> {
        self.db
            .query(format!(
                "SELECT {PREFERENCE_FIELDS} FROM notification_pref WHERE account = $account LIMIT 1"
            ))
            .bind(("account", account.to_owned()))
            .await
            .context("Loading notification preferences")?
            .take::<Option<PreferenceRecord>>(0)
            .context("Parsing notification preferences")
    }

    /// Loads the preferences of `account`, storing `defaults` first when there are none.
    pub(crate) async fn preferences_or_create(
        &self,
        defaults: PreferenceRecord,
    ) -> Result<PreferenceRecord, DatabaseError> {
        if let Some(existing) = self.find_preferences(&defaults.account).await? {
            return Ok(existing);
        }

        let account = defaults.account.clone();
        let created = self
            .db
            .query("CREATE notification_pref CONTENT $record RETURN NONE")
            .bind(("record", defaults.clone()))
            .await
            .context("Creating notification preferences")?
            .check();

        match created {
            Ok(_) => Ok(defaults),
            // Lost a race against another writer; the unique index kept their row.
            Err(e) => {
                debug!(%account, error = %e, "Preferences already created concurrently");
                self.find_preferences(&account)
                    .await?
                    .ok_or_else(|| DatabaseError::from(surrealdb::Error::from(e)))
            },
        }
    }

    pub(crate) async fn update_preferences(
        &self,
        record: PreferenceRecord,
    ) -> Result<(), DatabaseError> {
        self.db
            .query(
                "UPDATE notification_pref MERGE $record WHERE account = $account RETURN NONE",
            )
            .bind(("account", record.account.clone()))
            .bind(("record", record))
            .await
            .context("Updating notification preferences")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }
}
