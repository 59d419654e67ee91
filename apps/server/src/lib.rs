//! # Flock Server
//!
//! Serves the Flock REST API: the `Axum` routes of every feature slice over one `SurrealDB`
//! handle, with the slices reacting to each other through the event bus.
//!
//! ## Example
//! ```no_run
//! use flock_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder().port(4583).build().await?.run().await
//! }
//! ```

mod router;

use anyhow::{Context, Result, anyhow, bail};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use flock::domain::config::{ApiConfig, SslConfig};
use flock::kernel::server::ApiState;
use flock_database::Database;
use flock_event_bus::EventBus;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// In-flight requests get this long to finish once a shutdown signal arrives.
const GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Configures and assembles a [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
    database: Option<Database>,
}

impl ServerBuilder {
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Serves an already opened database instead of connecting to `database.url`.
    ///
    /// Slice migrations still run against it.
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Opens the database, runs migrations, initializes the slices and their listeners.
    ///
    /// Must be awaited inside a Tokio runtime: the notification listeners are spawned here.
    ///
    /// # Errors
    /// * The TLS certificate or key is configured but missing.
    /// * The database is unreachable, rejects the credentials, or a migration fails.
    /// * A slice fails to initialize.
    pub async fn build(self) -> Result<Server> {
        if let Some(ssl) = &self.cfg.server.ssl {
            check_tls_files(ssl)?;
        }

        let db = match self.database {
            Some(db) => {
                migrate(&db).await?;
                db
            }
            None => connect(&self.cfg).await?,
        };

        let events = EventBus::new();
        let slices = flock::init(&self.cfg, &db, &events)
            .map_err(|e| anyhow!("Feature slices failed to start: {e}"))?;

        let state = ApiState::builder()
            .config(self.cfg)
            .db(db)
            .events(events)
            .register_slices(slices)
            .build()
            .context("Failed to assemble application state")?;
        info!(slices = ?state.slice_names(), "Feature slices registered");

        Ok(Server { state })
    }
}

async fn connect(cfg: &ApiConfig) -> Result<Database> {
    let db_cfg = &cfg.database;
    let mut builder =
        Database::builder().url(&db_cfg.url).session(&db_cfg.namespace, &db_cfg.database);
    if let Some(creds) = &db_cfg.credentials {
        builder = builder.auth(&creds.username, &creds.password);
    }
    for migrations in flock::MIGRATIONS {
        builder = builder.migrations(migrations);
    }

    builder.init().await.with_context(|| format!("Failed to open database at {}", db_cfg.url))
}

async fn migrate(db: &Database) -> Result<()> {
    for migrations in flock::MIGRATIONS {
        db.migrate(migrations).await.context("Failed to migrate the provided database")?;
    }
    Ok(())
}

fn check_tls_files(ssl: &SslConfig) -> Result<()> {
    if !ssl.cert.exists() {
        bail!("TLS certificate not found at {}", ssl.cert.display());
    }
    if !ssl.key.exists() {
        bail!("TLS key not found at {}", ssl.key.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if ssl.key.metadata()?.permissions().mode() & 0o077 != 0 {
            warn!(key = %ssl.key.display(), "TLS private key is readable by group or others");
        }
    }
    Ok(())
}

/// An assembled Flock server. Call [`Server::run`] to start listening.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Listens on `server.address:server.port` (HTTPS when `server.ssl` is set) until
    /// Ctrl+C or SIGTERM, then drains requests and closes the event bus.
    ///
    /// # Errors
    /// Binding the address or loading the TLS material fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);
        let events = self.state.events.clone();
        let app = router::init(self.state).into_make_service();

        let handle = Handle::<SocketAddr>::new();
        tokio::spawn(drain_on_signal(handle.clone()));

        match &cfg.server.ssl {
            Some(ssl) => {
                let tls = RustlsConfig::from_pem_file(&ssl.cert, &ssl.key)
                    .await
                    .context("Failed to load TLS certificate and key")?;
                info!(%address, "Flock listening on https");
                axum_server::bind_rustls(address, tls)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("HTTPS server failed")?;
            }
            None => {
                info!(%address, "Flock listening on http");
                axum_server::bind(address)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("HTTP server failed")?;
            }
        }

        let closed = events.shutdown();
        info!(channels = closed, "Server stopped");
        Ok(())
    }

    /// The application router exactly as [`Server::run`] serves it.
    pub fn router(&self) -> axum::Router {
        router::init(self.state.clone())
    }

    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

async fn drain_on_signal(handle: Handle<SocketAddr>) {
    match shutdown_signal().await {
        Ok(()) => {
            info!(grace = ?GRACE_PERIOD, "Shutdown signal received, draining connections");
            handle.graceful_shutdown(Some(GRACE_PERIOD));
        }
        Err(e) => error!("Cannot listen for shutdown signals: {e:#}"),
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}
