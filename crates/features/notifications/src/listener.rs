//! Background tasks turning domain events into notifications.

use crate::error::{NotificationsError, NotificationsErrorExt};
use crate::service::NotificationService;
use flock_domain::events::{
    AccountFollowed, CommentAdded, CommentRemoved, PostLiked, PostPublished, PostRemoved,
};
use flock_domain::notifications::{TargetType, Verb};
use flock_event_bus::{Event, EventBus, EventReceiverExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Reaction of the notifications slice to one event type.
pub(crate) trait Handle<E> {
    fn handle(&self, event: &E) -> impl Future<Output = Result<(), NotificationsError>> + Send;
}

/// Subscribes to every event the slice reacts to and spawns one task per event type.
///
/// Subscribing happens before this returns, so events published afterwards are never missed.
/// The tasks end when the bus shuts down.
///
/// # Errors
/// [`NotificationsError::Events`] if a subscription cannot be created.
pub fn spawn_listeners(
    service: &NotificationService,
    events: &EventBus,
    capacity: usize,
) -> Result<Vec<JoinHandle<()>>, NotificationsError> {
    Ok(vec![
        listen::<AccountFollowed>(service, events, capacity)?,
        listen::<PostPublished>(service, events, capacity)?,
        listen::<PostLiked>(service, events, capacity)?,
        listen::<CommentAdded>(service, events, capacity)?,
        listen::<PostRemoved>(service, events, capacity)?,
        listen::<CommentRemoved>(service, events, capacity)?,
    ])
}

fn listen<E>(
    service: &NotificationService,
    events: &EventBus,
    capacity: usize,
) -> Result<JoinHandle<()>, NotificationsError>
where
    E: Event,
    NotificationService: Handle<E>,
{
    let receiver = events
        .subscribe_with_capacity::<E>(capacity)
        .context(std::any::type_name::<E>())?;
    Ok(tokio::spawn(run(service.clone(), receiver)))
}

async fn run<E>(service: NotificationService, mut receiver: broadcast::Receiver<Arc<E>>)
where
    E: Event,
    NotificationService: Handle<E>,
{
    let event_name = std::any::type_name::<E>();
    while let Some(event) = receiver.recv_event().await {
        if let Err(e) = service.handle(event.as_ref()).await {
            warn!(event = event_name, error = %e, "Failed to process event");
        }
    }
    debug!(event = event_name, "Event channel closed, listener stopped");
}

impl Handle<AccountFollowed> for NotificationService {
    async fn handle(&self, event: &AccountFollowed) -> Result<(), NotificationsError> {
        self.notify(&event.followee, &event.follower, Verb::Follow, None).await?;
        Ok(())
    }
}

impl Handle<PostPublished> for NotificationService {
    async fn handle(&self, event: &PostPublished) -> Result<(), NotificationsError> {
        self.notify_mentions(&event.mentions, &event.author, (TargetType::Post, &event.post))
            .await?;
        Ok(())
    }
}

impl Handle<PostLiked> for NotificationService {
    async fn handle(&self, event: &PostLiked) -> Result<(), NotificationsError> {
        let target = Some((TargetType::Post, event.post.as_str()));
        self.notify(&event.post_author, &event.actor, Verb::Like, target).await?;
        Ok(())
    }
}

impl Handle<CommentAdded> for NotificationService {
    async fn handle(&self, event: &CommentAdded) -> Result<(), NotificationsError> {
        let target = (TargetType::Comment, event.comment.as_str());

        self.notify(&event.post_author, &event.actor, Verb::Comment, Some(target)).await?;
        if let Some(parent_author) = &event.parent_author {
            self.notify(parent_author, &event.actor, Verb::Reply, Some(target)).await?;
        }
        self.notify_mentions(&event.mentions, &event.actor, target).await?;
        Ok(())
    }
}

impl Handle<PostRemoved> for NotificationService {
    async fn handle(&self, event: &PostRemoved) -> Result<(), NotificationsError> {
        self.forget_targets(TargetType::Post, vec![event.post.clone()]).await?;
        self.forget_targets(TargetType::Comment, event.comments.clone()).await
    }
}

impl Handle<CommentRemoved> for NotificationService {
    async fn handle(&self, event: &CommentRemoved) -> Result<(), NotificationsError> {
        self.forget_targets(TargetType::Comment, event.comments.clone()).await
    }
}
