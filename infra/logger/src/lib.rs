//! # Logger
//!
//! Installs the process-wide `tracing` subscriber for Flock binaries.
//!
//! Output goes to a compact ANSI console layer, to a rolling file under a log directory, or
//! to both. File output is written by a non-blocking worker, as plain text or JSON lines.
//! `RUST_LOG` refines the configured level unless explicit directives are given.
//!
//! ## Example
//!
//! ```rust
//! # use flock_logger::{LevelFilter, Logger};
//!
//! let _logger = Logger::builder("flock")
//!     .level(LevelFilter::DEBUG)
//!     .directives("surrealdb=warn")
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const LOG_FILE_SUFFIX: &str = "log";

/// Line format of the log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(LoggerError::InvalidConfiguration {
                message: format!("Unknown log format '{other}'").into(),
                context: None,
            }),
        }
    }
}

/// Where and how log files are written.
#[derive(Debug, Clone)]
pub struct FileOutput {
    pub dir: PathBuf,
    pub format: LogFormat,
    pub rotation: Rotation,
    pub max_files: usize,
}

impl FileOutput {
    /// Daily plain-text files in `dir`, keeping the last ten.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), format: LogFormat::Text, rotation: Rotation::DAILY, max_files: 10 }
    }
}

/// Builder for the global subscriber. Obtain one with [`Logger::builder`].
#[must_use = "call .init() to install the subscriber"]
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    directives: Option<String>,
    console: bool,
    file: Option<FileOutput>,
}

impl LoggerBuilder {
    /// Minimum level for events not matched by a directive.
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Per-target directives such as `flock_posts=debug,surrealdb=warn`.
    ///
    /// When set, `RUST_LOG` is ignored.
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Also write to rolling files.
    pub fn file(mut self, output: FileOutput) -> Self {
        self.file = Some(output);
        self
    }

    /// Installs the subscriber.
    ///
    /// Keep the returned [`Logger`] alive until shutdown: dropping it stops the file writer.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, bad directives, no output
    ///   or `max_files == 0`.
    /// * [`LoggerError::Appender`] when the log directory cannot be used.
    /// * [`LoggerError::Subscriber`] when a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Logger name cannot be empty"));
        }
        if !self.console && self.file.is_none() {
            return Err(invalid("No log output enabled"));
        }

        let filter = self.filter()?;
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        if self.console {
            layers.push(fmt::layer().compact().with_ansi(true).boxed());
        }

        let guard = match self.file {
            Some(output) => {
                let (layer, guard) = file_layer(&self.name, output)?;
                layers.push(layer);
                Some(guard)
            }
            None => None,
        };

        tracing_subscriber::registry().with(layers).with(filter).try_init()?;

        Ok(Logger { guard })
    }

    fn filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.directives {
            Some(directives) => builder.parse(directives).map_err(|e| {
                invalid(format!("Invalid log directives '{directives}': {e}"))
            }),
            None => Ok(builder.from_env_lossy()),
        }
    }
}

fn file_layer(
    name: &str,
    output: FileOutput,
) -> Result<(Box<dyn Layer<Registry> + Send + Sync>, WorkerGuard), LoggerError> {
    if output.max_files == 0 {
        return Err(invalid("max_files must be greater than zero"));
    }

    fs::create_dir_all(&output.dir).map_err(|e| LoggerError::Internal {
        message: e.to_string().into(),
        context: Some(format!("Creating {}", output.dir.display()).into()),
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(output.rotation)
        .filename_prefix(name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(output.max_files)
        .build(&output.dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    let layer = match output.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    };
    Ok((layer, guard))
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> LoggerError {
    LoggerError::InvalidConfiguration { message: message.into(), context: None }
}

/// The installed logging system. Holds the file writer's [`WorkerGuard`], if any.
#[must_use = "dropping the logger stops file output"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a builder. `name` prefixes the log files, e.g. `flock-server.2026-10-18.log`.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            level: LevelFilter::INFO,
            directives: None,
            console: true,
            file: None,
        }
    }

    /// Whether events are also going to a file.
    #[must_use]
    pub const fn writes_file(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Flushing log files");
        }
    }
}

/// Parses `"info"`, `" WARN "`, `"off"` and friends.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] for anything `tracing` does not recognize.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    LevelFilter::from_str(level.trim())
        .map_err(|e| invalid(format!("Invalid log level '{level}': {e}")))
}

/// Parses `minutely`, `hourly`, `daily`, `weekly` or `never`.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] for any other value.
pub fn parse_rotation(rotation: &str) -> Result<Rotation, LoggerError> {
    match rotation.trim().to_ascii_lowercase().as_str() {
        "minutely" => Ok(Rotation::MINUTELY),
        "hourly" => Ok(Rotation::HOURLY),
        "daily" => Ok(Rotation::DAILY),
        "weekly" => Ok(Rotation::WEEKLY),
        "never" => Ok(Rotation::NEVER),
        other => Err(invalid(format!("Unknown log rotation '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level(" WARN ").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert!(matches!(parse_level("chatty"), Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn rotations_and_formats() {
        assert_eq!(parse_rotation("Hourly").unwrap(), Rotation::HOURLY);
        assert_eq!(parse_rotation("never").unwrap(), Rotation::NEVER);
        assert!(parse_rotation("yearly").is_err());

        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder("flock").directives("flock=debug");
        assert!(builder.console);
        assert_eq!(builder.level, LevelFilter::INFO);
        assert_eq!(builder.directives.as_deref(), Some("flock=debug"));
        assert!(builder.file.is_none());

        let output = FileOutput::new("logs");
        assert_eq!(output.format, LogFormat::Text);
        assert_eq!(output.rotation, Rotation::DAILY);
        assert_eq!(output.max_files, 10);
    }

    #[test]
    fn rejects_configurations_that_cannot_log() {
        let err = Logger::builder("flock").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder("flock").directives("flock=loud").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
