use flock_logger::{FileOutput, LogFormat, Logger, Rotation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn log_file(dir: &Path) -> PathBuf {
    fs::read_dir(dir)
        .expect("log dir")
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created")
}

// One subscriber per process: the file is written as JSON lines and checked as such.
#[test]
fn json_lines_land_in_the_log_directory() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let dir = tmp.path().join("logs");

    let logger = Logger::builder("files")
        .console(false)
        .file(FileOutput {
            format: LogFormat::Json,
            rotation: Rotation::NEVER,
            ..FileOutput::new(&dir)
        })
        .init()?;
    assert!(logger.writes_file());

    tracing::info!(post = "p1", "post published");
    tracing::debug!("below the default level");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let contents = fs::read_to_string(log_file(&dir))?;
    let line = contents.lines().find(|line| line.contains("post published")).expect("event logged");
    assert!(line.starts_with('{'), "expected a JSON object, got: {line}");
    assert!(line.contains("\"post\":\"p1\""));
    assert!(!contents.contains("below the default level"));

    Ok(())
}
