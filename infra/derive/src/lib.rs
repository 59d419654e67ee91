#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros used across the Flock workspace:
//!
//! * [`macro@main`] boots the tuned Tokio runtime from `flock-runtime`.
//! * [`macro@api_model`] and [`macro@api_handler`] wire DTOs and handlers into `serde` and `utoipa`.
//! * [`macro@flock_error`] turns an enum into a context-aware `thiserror` error.
//! * [`macro@flock_slice`] builds the shared handle of a feature slice.
//!
//! Examples below are `ignore`d because a proc-macro crate cannot use its own macros.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the tuned Tokio runtime.
///
/// Turns an `async fn main` returning a `Result` into a synchronous `fn main` that builds
/// a runtime from a `flock_runtime::RuntimeConfig` preset and blocks on the body.
///
/// # Arguments
///
/// * `server` - API server preset (larger stacks, long keep-alive).
/// * `compact` - Half the workers, smaller stacks.
/// * `default` or nothing - One worker per core.
///
/// # Examples
///
/// ```rust,ignore
/// #[flock_runtime::main(server)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Declares an API data model (request or response body, query string).
///
/// # Injected Behaviors
///
/// * **Derives**: `Debug`, `serde::Serialize`, `serde::Deserialize` and `utoipa::ToSchema`
///   unless already derived.
/// * **Serde Policy**:
///     * `rename_all = "snake_case"` by default (can be overridden).
///     * `deny_unknown_fields` by default on structs (can be disabled). Never applied to enums.
///
/// # Example
///
/// ```rust,ignore
/// use flock_derive::api_model;
///
/// #[api_model(deny_unknown_fields = false)]
/// pub struct ProfileUpdate {
///     pub first_name: Option<String>,
///     pub bio: Option<String>,
/// }
///
/// #[api_model]
/// pub enum BulkAction {
///     MarkRead,
///     Delete,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Bridges an Axum handler with its `OpenAPI` description.
///
/// Accepts the usual `utoipa::path` arguments (`get`, `post`, `path = "..."`,
/// `responses(...)`, `tag = ...`) and forwards them verbatim. The handler also gets
/// `#[allow(clippy::unused_async)]` since some handlers never await.
///
/// # Example
///
/// ```rust,ignore
/// use flock_derive::api_handler;
///
/// #[api_handler(
///     get,
///     path = "/health",
///     responses((status = OK, body = HealthResponse)),
///     tag = "System"
/// )]
/// pub async fn health_handler() -> Json<HealthResponse> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Defines a crate error enum with context support.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to `Result<T, Self>` and to `Result<T, Source>` for every wrapped source error.
/// * **Standard Conversions**: `From<Source>` for variants with a `source` field (or a field
///   marked `#[source]` / `#[from]`).
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant exists.
/// * **Introspection**: `kind()` returns the variant name, `context_ref()` the attached context.
///
/// # Requirements
///
/// 1. Applied to an **enum** with named-field variants only.
/// 2. Variants that wrap a source must carry `context: Option<Cow<'static, str>>`.
/// 3. At most one `flock_error` enum per module (a private `format_context` helper is emitted).
///
/// # Example
///
/// ```rust,ignore
/// use flock_derive::flock_error;
/// use std::borrow::Cow;
///
/// #[flock_error]
/// pub enum StoreError {
///     #[error("SurrealDB error{}: {source}", format_context(.context))]
///     Surreal { source: surrealdb::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load() -> Result<Vec<Row>, StoreError> {
///     db.query("SELECT ...").await.context("Loading rows")?;
///     Err("unreachable".into())
/// }
/// ```
#[proc_macro_attribute]
pub fn flock_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Declares a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`, and `<Name>` turns into a cheap `Arc`
/// wrapper that derefs to it and implements `FeatureSlice` so it can be registered in
/// the API state.
///
/// # Example
/// ```rust,ignore
/// #[flock_derive::flock_slice]
/// pub struct Accounts {
///     pub service: AccountService,
/// }
///
/// fn init(service: AccountService) -> Accounts {
///     Accounts::new(AccountsInner { service })
/// }
/// ```
#[proc_macro_attribute]
pub fn flock_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
