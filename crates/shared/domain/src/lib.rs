//! # Domain Models
//!
//! Pure domain types with minimal dependencies (`serde`, `bitflags`): configuration,
//! the slice registry, cross-slice events and notification kinds.
//! No I/O, networking, or heavy logic belongs here.

pub mod config;
pub mod constants;
pub mod events;
pub mod notifications;
pub mod registry;
