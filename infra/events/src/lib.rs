//! # Event Bus
//!
//! A small, type-safe, asynchronous broadcast bus shared by the feature slices.
//!
//! Each Rust type gets its own `tokio::sync::broadcast` channel, created lazily on the first
//! subscribe or publish. Events travel as `Arc<T>` so fan-out never clones the payload.
//! Publishing never blocks: an event with no subscribers is dropped, and a lagging receiver
//! skips ahead instead of stalling the publisher.
//!
//! # Example
//!
//! ```rust
//! use flock_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct PostLiked { post: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!
//!     let mut rx = bus.subscribe::<PostLiked>()?;
//!     bus.publish(PostLiked { post: "p1".into() })?;
//!
//!     if let Some(event) = rx.recv_event().await {
//!         assert_eq!(event.post, "p1");
//!     }
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{DEFAULT_CAPACITY, Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
