//! Accounts feature slice: registration, token login/logout, profiles, the user directory
//! and follow relationships.
//!
//! Other slices authenticate requests through [`CurrentUser`]/[`MaybeUser`] and resolve
//! usernames and follow sets through [`AccountService`].

mod auth;
mod error;
mod handlers;
mod models;
mod repository;
mod router;
mod service;

pub use auth::{CurrentUser, MaybeUser};
pub use error::{AccountsError, AccountsErrorExt};
pub use models::{
    Account, FollowResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    UpdateProfileRequest, UserDetail, UserSummary,
};
pub use repository::FollowDirection;
pub use router::router;
pub use service::AccountService;

use flock_database::{Database, Migration};
use flock_domain::config::ApiConfig;
use flock_event_bus::EventBus;

pub const MIGRATIONS: &[Migration] =
    &[Migration::new("accounts", "0001_accounts", include_str!("../migrations/0001_accounts.surql"))];

/// Accounts feature state
#[flock_derive::flock_slice]
pub struct Accounts {
    pub service: AccountService,
}

/// Initialize the accounts feature.
///
/// The returned slice is also handed to the slices that depend on it before being
/// registered in the API state.
#[must_use]
pub fn init(config: &ApiConfig, database: &Database, events: &EventBus) -> Accounts {
    let service = AccountService::new(&config.security.accounts, database.clone(), events.clone());
    tracing::info!("Accounts slice initialized");

    Accounts::new(AccountsInner { service })
}
