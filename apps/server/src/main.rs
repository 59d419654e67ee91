use anyhow::Context;
use flock::domain::config::{ApiConfig, LoggingConfig};
use flock::kernel::config::load_config;
use flock_logger::{FileOutput, LogFormat, Logger, parse_level, parse_rotation};
use flock_server::Server;

#[flock_runtime::main(server)]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig = load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let _log = init_logger(&cfg.logging).context("Failed to initialize logging")?;

    Server::builder().config(cfg).build().await?.run().await
}

fn init_logger(cfg: &LoggingConfig) -> anyhow::Result<Logger> {
    let mut builder = Logger::builder(env!("CARGO_PKG_NAME")).level(parse_level(&cfg.level)?);
    if let Some(filter) = &cfg.filter {
        builder = builder.directives(filter);
    }
    if let Some(dir) = &cfg.path {
        builder = builder.file(FileOutput {
            format: if cfg.json { LogFormat::Json } else { LogFormat::Text },
            rotation: parse_rotation(&cfg.rotation)?,
            max_files: cfg.max_files,
            ..FileOutput::new(dir)
        });
    }
    Ok(builder.init()?)
}
