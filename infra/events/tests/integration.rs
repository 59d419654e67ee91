use flock_event_bus::*;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
struct PostLiked(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
struct AccountFollowed(pub usize);

#[tokio::test]
async fn test_event_flow() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<PostLiked>().unwrap();

    let event = PostLiked(42);
    bus.publish(event.clone()).unwrap();

    let received = rx.recv_event().await.unwrap();
    assert_eq!(*received, event);
}

#[tokio::test]
async fn test_publish_without_subscribers_is_dropped() {
    let bus = EventBus::new();
    let delivered = bus.publish(PostLiked(1)).unwrap();
    assert_eq!(delivered, 0);
    assert_eq!(bus.subscriber_count::<PostLiked>(), 0);
}

#[tokio::test]
async fn test_receiver_lagged_recovery() {
    let bus = EventBus::new();
    let capacity = 2;
    let mut rx = bus.subscribe_with_capacity::<PostLiked>(capacity).unwrap();

    let total_messages = 100;
    for i in 0..total_messages {
        bus.publish(PostLiked(i)).unwrap();
    }

    let first = rx.recv_event().await.expect("Should recover from lag");
    assert!(
        first.0 >= total_messages - capacity,
        "Should have skipped to the fresh tail of the buffer. Expected >= {}, got {}",
        total_messages - capacity,
        first.0
    );

    let second = rx.recv_event().await.expect("Should continue receiving");
    assert_eq!(second.0, first.0 + 1);
}

#[tokio::test]
async fn test_multiple_subscribers_see_every_event() {
    let bus = EventBus::new();
    let mut rx1 = bus.subscribe::<PostLiked>().unwrap();
    let mut rx2 = bus.subscribe::<PostLiked>().unwrap();
    assert_eq!(bus.subscriber_count::<PostLiked>(), 2);

    assert_eq!(bus.publish(PostLiked(100)).unwrap(), 2);

    let res1 = rx1.recv_event().await.unwrap();
    let res2 = rx2.recv_event().await.unwrap();
    assert_eq!(res1.0, res2.0);
}

#[tokio::test]
async fn test_event_types_are_isolated() {
    let bus = EventBus::new();
    let mut likes = bus.subscribe::<PostLiked>().unwrap();
    let mut follows = bus.subscribe::<AccountFollowed>().unwrap();

    bus.publish(PostLiked(7)).unwrap();
    bus.publish(AccountFollowed(13)).unwrap();

    assert_eq!(likes.recv_event().await.unwrap().0, 7);
    assert_eq!(follows.recv_event().await.unwrap().0, 13);
}

#[tokio::test]
async fn test_bus_drop_closes_receivers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<PostLiked>().unwrap();

    drop(bus);

    assert!(rx.recv_event().await.is_none(), "receiver should observe bus closure");
}

#[tokio::test]
async fn test_shutdown_closes_all_channels() {
    let bus = EventBus::new();
    let mut likes = bus.subscribe::<PostLiked>().unwrap();
    let mut follows = bus.subscribe::<AccountFollowed>().unwrap();

    assert_eq!(bus.shutdown(), 2);

    assert!(likes.recv_event().await.is_none());
    assert!(follows.recv_event().await.is_none());
}

#[tokio::test]
async fn test_publish_arc_shares_payload() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<PostLiked>().unwrap();

    let event = Arc::new(PostLiked(10));
    bus.publish_arc(event.clone()).unwrap();

    let received = rx.recv_event().await.unwrap();
    assert!(Arc::ptr_eq(&event, &received));
}

#[tokio::test]
async fn test_ordering_is_preserved() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<PostLiked>().unwrap();

    for i in 0..100 {
        bus.publish(PostLiked(i)).unwrap();
    }

    for i in 0..100 {
        let event = rx.recv_event().await.unwrap();
        assert_eq!(event.0, i, "Events should arrive in order");
    }
}

#[tokio::test]
async fn test_concurrent_publishers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<PostLiked>().unwrap();

    let bus1 = bus.clone();
    let handle1 = tokio::spawn(async move {
        for i in 0..50 {
            bus1.publish(PostLiked(i)).unwrap();
        }
    });

    let bus2 = bus.clone();
    let handle2 = tokio::spawn(async move {
        for i in 50..100 {
            bus2.publish(PostLiked(i)).unwrap();
        }
    });

    handle1.await.unwrap();
    handle2.await.unwrap();

    let mut received = 0;
    while tokio::time::timeout(Duration::from_millis(100), rx.recv_event()).await.is_ok() {
        received += 1;
    }

    assert_eq!(received, 100, "Should receive all events");
}

#[tokio::test]
async fn test_invalid_capacity_rejected() {
    let bus = EventBus::new();

    let result = bus.subscribe_with_capacity::<PostLiked>(0);
    assert!(matches!(result, Err(EventBusError::InvalidCapacity { .. })));
}
