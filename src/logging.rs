use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub const LOG_FILE_PREFIX: &str = "notes.log";

/// Installs a JSON subscriber writing to a daily rolling file in `log_dir`.
pub fn init_tracing(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())?;

    let _ = LOG_GUARD.set(guard);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn second_initialisation_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_dir = dir.path().join("logs");
        let first = init_tracing(&log_dir);
        assert!(log_dir.is_dir());
        if first.is_ok() {
            tracing::info!("logging initialised");
        }
        assert!(init_tracing(&log_dir).is_err());
    }
}
