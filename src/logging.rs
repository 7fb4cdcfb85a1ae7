use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logs go to a daily file; the terminal belongs to the UI.
/// Level comes from `RUST_LOG`, `info` by default.
pub fn init(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("hours-atlas")
        .filename_suffix("log")
        .build(log_dir)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(appender).with_ansi(false).with_target(true))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_directory_is_reported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(init(&file.path().join("logs")).is_err());
    }
}
