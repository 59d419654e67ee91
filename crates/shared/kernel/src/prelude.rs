//! Everything a slice handler usually needs in one import.

pub use crate::safe_nanoid;
pub use crate::security::resource::ResourceGuard;
pub use crate::server::{ApiError, ApiJson, ApiQuery, ApiState, Page, PageRequest};
pub use flock_domain::registry::{FeatureSlice, InitializedSlice};
