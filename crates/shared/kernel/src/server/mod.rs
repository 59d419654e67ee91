//! HTTP plumbing shared by every slice.

mod error;
mod extract;
mod health;
mod pagination;
pub mod router;
mod state;

pub use error::ApiError;
pub use extract::{ApiJson, ApiQuery};
pub use pagination::{Page, PageRequest};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
