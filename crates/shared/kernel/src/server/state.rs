use flock_database::Database;
use flock_domain::config::ApiConfig;
use flock_domain::registry::{FeatureSlice, InitializedSlice};
use flock_event_bus::EventBus;
use fxhash::FxHashMap;
use std::any::TypeId;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[flock_derive::flock_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Feature slice not registered{}: {message}", format_context(.context))]
    MissingSlice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Everything a request handler can reach: config, storage, the event bus and the
/// initialized feature slices, keyed by their concrete type.
#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub database: Database,
    pub events: EventBus,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

/// Shared application state handed to every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    /// The registered slice of type `T`.
    ///
    /// # Errors
    /// [`ApiStateError::MissingSlice`] when the server was assembled without it.
    pub fn slice<T: FeatureSlice>(&self) -> Result<&T, ApiStateError> {
        self.inner
            .slices
            .get(&TypeId::of::<T>())
            .and_then(|initialized| initialized.state.as_any().downcast_ref::<T>())
            .ok_or_else(|| ApiStateError::MissingSlice {
                message: std::any::type_name::<T>().into(),
                context: None,
            })
    }

    /// Names of the registered slices, sorted.
    #[must_use]
    pub fn slice_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.inner.slices.values().map(InitializedSlice::name).collect();
        names.sort_unstable();
        names
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    database: Option<Database>,
    events: Option<EventBus>,
    slices: Vec<InitializedSlice>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn db(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// The bus the slices were initialized with. A fresh one is used when omitted.
    #[must_use]
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn register_slice(mut self, slice: InitializedSlice) -> Self {
        self.slices.push(slice);
        self
    }

    #[must_use]
    pub fn register_slices(mut self, slices: impl IntoIterator<Item = InitializedSlice>) -> Self {
        self.slices.extend(slices);
        self
    }

    /// Finalizes the state.
    ///
    /// # Errors
    /// [`ApiStateError::Validation`] when the config or database is missing, or when two
    /// slices of the same type were registered.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "ApiConfig not provided".into(),
            context: None,
        })?;
        let database = self.database.ok_or_else(|| ApiStateError::Validation {
            message: "Database not provided".into(),
            context: None,
        })?;
        let events = self.events.unwrap_or_default();

        let mut slices = FxHashMap::default();
        for slice in self.slices {
            let name = slice.name();
            if slices.insert(slice.id, slice).is_some() {
                return Err(ApiStateError::Validation {
                    message: format!("Slice '{name}' registered twice").into(),
                    context: None,
                });
            }
        }

        Ok(ApiState { inner: Arc::new(ApiStateInner { config, database, events, slices }) })
    }
}
