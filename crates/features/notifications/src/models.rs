use crate::error::NotificationsError;
use chrono::{DateTime, Utc};
use flock_accounts::Account;
use flock_derive::api_model;
use flock_domain::notifications::{TargetType, UnknownVerb, Verb, VerbSet};
use flock_kernel::clock::from_micros;
use surrealdb::types::SurrealValue;
use utoipa::IntoParams;

// --- Records ---

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct NotificationRecord {
    pub uid: String,
    pub recipient: String,
    pub actor: String,
    pub verb: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub is_read: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NotificationRecord {
    /// Stored verbs are written by this crate; anything else is a corrupted row.
    pub(crate) fn verb(&self) -> Result<Verb, NotificationsError> {
        self.verb.parse().map_err(|e: UnknownVerb| NotificationsError::Internal {
            message: e.to_string().into(),
            context: Some(self.uid.clone().into()),
        })
    }

    pub(crate) fn target_type(&self) -> Option<TargetType> {
        self.target_type.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct PreferenceRecord {
    pub account: String,
    pub notify_on_follow: bool,
    pub notify_on_like: bool,
    pub notify_on_comment: bool,
    pub notify_on_mention: bool,
    pub notify_on_reply: bool,
    pub email_on_follow: bool,
    pub email_on_like: bool,
    pub email_on_comment: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PreferenceRecord {
    pub(crate) fn with_defaults(account: impl Into<String>, now: i64) -> Self {
        Self {
            account: account.into(),
            notify_on_follow: true,
            notify_on_like: true,
            notify_on_comment: true,
            notify_on_mention: true,
            notify_on_reply: true,
            email_on_follow: false,
            email_on_like: false,
            email_on_comment: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Verbs the account wants to hear about.
    pub(crate) fn enabled(&self) -> VerbSet {
        [
            (self.notify_on_follow, VerbSet::FOLLOW),
            (self.notify_on_like, VerbSet::LIKE),
            (self.notify_on_comment, VerbSet::COMMENT),
            (self.notify_on_mention, VerbSet::MENTION),
            (self.notify_on_reply, VerbSet::REPLY),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(VerbSet::empty(), |set, (_, verb)| set | verb)
    }

    pub(crate) fn apply(&mut self, changes: UpdatePreferencesRequest) {
        let UpdatePreferencesRequest {
            notify_on_follow,
            notify_on_like,
            notify_on_comment,
            notify_on_mention,
            notify_on_reply,
            email_on_follow,
            email_on_like,
            email_on_comment,
        } = changes;

        for (slot, value) in [
            (&mut self.notify_on_follow, notify_on_follow),
            (&mut self.notify_on_like, notify_on_like),
            (&mut self.notify_on_comment, notify_on_comment),
            (&mut self.notify_on_mention, notify_on_mention),
            (&mut self.notify_on_reply, notify_on_reply),
            (&mut self.email_on_follow, email_on_follow),
            (&mut self.email_on_like, email_on_like),
            (&mut self.email_on_comment, email_on_comment),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

// --- Requests ---

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// `true` for unread only, `false` for read only.
    pub unread: Option<bool>,
    /// One of `follow`, `like`, `comment`, `mention`, `reply`.
    pub verb: Option<String>,
}

#[api_model]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    MarkRead,
    MarkUnread,
    Delete,
}

#[api_model]
pub struct BulkActionRequest {
    pub notification_ids: Vec<String>,
    pub action: BulkAction,
}

/// Flags left out keep their current value.
#[api_model]
#[derive(Default)]
pub struct UpdatePreferencesRequest {
    pub notify_on_follow: Option<bool>,
    pub notify_on_like: Option<bool>,
    pub notify_on_comment: Option<bool>,
    pub notify_on_mention: Option<bool>,
    pub notify_on_reply: Option<bool>,
    pub email_on_follow: Option<bool>,
    pub email_on_like: Option<bool>,
    pub email_on_comment: Option<bool>,
}

// --- Responses ---

/// The account that triggered a notification.
#[api_model]
#[derive(Clone)]
pub struct ActorView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
}

impl From<Account> for ActorView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            profile_picture: account.profile_picture,
        }
    }
}

#[api_model]
pub struct NotificationListItem {
    pub id: String,
    pub actor_username: String,
    #[schema(value_type = String)]
    pub verb: Verb,
    pub notification_message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[api_model]
pub struct NotificationView {
    pub id: String,
    pub recipient: String,
    pub actor: ActorView,
    #[schema(value_type = String)]
    pub verb: Verb,
    pub notification_message: String,
    #[schema(value_type = Option<String>)]
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[api_model]
pub struct TargetData {
    pub id: String,
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: TargetType,
    /// Leading characters of the post or comment content.
    pub preview: String,
}

#[api_model]
pub struct NotificationDetail {
    pub id: String,
    pub recipient: String,
    pub actor: ActorView,
    #[schema(value_type = String)]
    pub verb: Verb,
    pub notification_message: String,
    #[schema(value_type = Option<String>)]
    pub target_type: Option<TargetType>,
    /// Absent when the target is gone.
    pub target_data: Option<TargetData>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[api_model]
pub struct MarkReadResponse {
    pub message: String,
    pub notification: NotificationView,
}

/// Outcome of an operation over many notifications.
#[api_model]
pub struct CountResponse {
    pub message: String,
    pub count: u64,
}

#[api_model]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

#[api_model]
pub struct PreferenceView {
    pub user: String,
    pub notify_on_follow: bool,
    pub notify_on_like: bool,
    pub notify_on_comment: bool,
    pub notify_on_mention: bool,
    pub notify_on_reply: bool,
    pub email_on_follow: bool,
    pub email_on_like: bool,
    pub email_on_comment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PreferenceRecord> for PreferenceView {
    fn from(record: PreferenceRecord) -> Self {
        Self {
            user: record.account,
            notify_on_follow: record.notify_on_follow,
            notify_on_like: record.notify_on_like,
            notify_on_comment: record.notify_on_comment,
            notify_on_mention: record.notify_on_mention,
            notify_on_reply: record.notify_on_reply,
            email_on_follow: record.email_on_follow,
            email_on_like: record.email_on_like,
            email_on_comment: record.email_on_comment,
            created_at: from_micros(record.created_at),
            updated_at: from_micros(record.updated_at),
        }
    }
}

#[api_model]
pub struct PreferencesUpdateResponse {
    pub message: String,
    pub preferences: PreferenceView,
}

/// First `limit` characters of `text`.
pub(crate) fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_verb_and_no_email() {
        let prefs = PreferenceRecord::with_defaults("A", 0);
        assert_eq!(prefs.enabled(), VerbSet::ALL);
        assert!(!prefs.email_on_follow && !prefs.email_on_like && !prefs.email_on_comment);
    }

    #[test]
    fn apply_changes_only_supplied_flags() {
        let mut prefs = PreferenceRecord::with_defaults("A", 0);
        prefs.apply(UpdatePreferencesRequest {
            notify_on_like: Some(false),
            email_on_comment: Some(true),
            ..UpdatePreferencesRequest::default()
        });

        assert!(!prefs.enabled().allows(Verb::Like));
        assert!(prefs.enabled().allows(Verb::Reply));
        assert!(prefs.email_on_comment);
        assert!(!prefs.email_on_like);
    }

    #[test]
    fn preview_counts_characters() {
        assert_eq!(preview("héllo wörld", 5), "héllo");
        assert_eq!(preview("hi", 100), "hi");
    }

    #[test]
    fn bulk_actions_use_snake_case() {
        let request: BulkActionRequest =
            serde_json::from_str(r#"{"notification_ids":["a"],"action":"mark_unread"}"#).unwrap();
        assert_eq!(request.action, BulkAction::MarkUnread);
        assert!(serde_json::from_str::<BulkActionRequest>(r#"{"notification_ids":[],"action":"x"}"#).is_err());
    }
}
