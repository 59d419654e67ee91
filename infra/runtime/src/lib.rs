//! # Runtime
//!
//! Builds the multi-threaded Tokio runtime the Flock server runs on, and re-exports the
//! `#[flock_runtime::main]` attribute that wires it into `main`.
//!
//! Profiles:
//! * `server`: one worker per core, roomy stacks for the `SurrealDB` query engine.
//! * `compact`: half the workers and smaller stacks for small hosts.
//! * `default`: one worker per core, 3 `MiB` stacks.
//!
//! `FLOCK_WORKER_THREADS` (or Tokio's own `TOKIO_WORKER_THREADS`) overrides the worker count.
//!
//! ```rust,ignore
//! #[flock_runtime::main(server)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use flock_derive::main;

use anyhow::anyhow;
use std::num::NonZero;
use std::thread::available_parallelism;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

const WORKER_ENV: [&str; 2] = ["FLOCK_WORKER_THREADS", "TOKIO_WORKER_THREADS"];
const FALLBACK_WORKERS: usize = 4;
const MAX_WORKERS: usize = 1024;
const MIB: usize = 1024 * 1024;
const STACK_RANGE: (usize, usize) = (MIB, 16 * MIB);
const THREAD_NAME: &str = "flock-worker";

/// Worker count from the environment, or one per available core.
fn worker_threads() -> usize {
    WORKER_ENV
        .iter()
        .find_map(|key| {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.trim().parse::<usize>().ok())
                .filter(|&n| (1..=MAX_WORKERS).contains(&n))
        })
        .unwrap_or_else(|| available_parallelism().map_or(FALLBACK_WORKERS, NonZero::get))
}

/// Knobs of the Tokio runtime. Out-of-range values are clamped when the runtime is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: worker_threads(),
            stack_size: 3 * MIB,
            thread_name: THREAD_NAME.to_owned(),
            thread_keep_alive: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// The API server profile.
    #[must_use]
    pub fn server() -> Self {
        Self {
            stack_size: 4 * MIB,
            thread_name: "flock-server".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
            ..Self::default()
        }
    }

    /// Fewer workers and smaller stacks.
    #[must_use]
    pub fn compact() -> Self {
        let defaults = Self::default();
        Self {
            worker_threads: (defaults.worker_threads / 2).max(1),
            stack_size: 2 * MIB,
            thread_keep_alive: Duration::from_secs(30),
            ..defaults
        }
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    /// The values the runtime is actually built with.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let thread_name = if self.thread_name.trim().is_empty() {
            THREAD_NAME.to_owned()
        } else {
            self.thread_name.clone()
        };
        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKERS),
            stack_size: self.stack_size.clamp(STACK_RANGE.0, STACK_RANGE.1),
            thread_name,
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Builds a multi-threaded runtime with the I/O, time and signal drivers enabled.
///
/// # Errors
/// The OS refuses to spawn the worker threads.
///
/// ```rust
/// use flock_runtime::{RuntimeConfig, build_runtime};
///
/// let runtime = build_runtime(&RuntimeConfig::compact().with_worker_threads(2))?;
/// assert_eq!(runtime.block_on(async { 40 + 2 }), 42);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn build_runtime(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.clamped();
    debug!(?config, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to start the Tokio runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        let raw = RuntimeConfig {
            worker_threads: 0,
            stack_size: 1,
            thread_name: "  ".to_owned(),
            thread_keep_alive: Duration::from_secs(1),
        };
        let clamped = raw.clamped();
        assert_eq!(clamped.worker_threads, 1);
        assert_eq!(clamped.stack_size, MIB);
        assert_eq!(clamped.thread_name, THREAD_NAME);

        let huge = RuntimeConfig::default().with_worker_threads(5000).with_stack_size(64 * MIB);
        assert_eq!(huge.clamped().worker_threads, MAX_WORKERS);
        assert_eq!(huge.clamped().stack_size, 16 * MIB);
    }

    #[test]
    fn profiles() {
        let server = RuntimeConfig::server();
        let compact = RuntimeConfig::compact();
        assert_eq!(server.thread_name, "flock-server");
        assert!(server.stack_size > compact.stack_size);
        assert!((1..=server.worker_threads).contains(&compact.worker_threads));
    }

    #[test]
    fn runs_futures() {
        let runtime = build_runtime(&RuntimeConfig::default().with_worker_threads(1)).unwrap();
        assert_eq!(runtime.block_on(async { 7 * 6 }), 42);
    }
}
