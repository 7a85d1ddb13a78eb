use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `info`, or `debug`
/// with `verbose`. A `log_file` adds a daily-rolling JSON log next to it.
pub fn init(verbose: bool, log_file: Option<PathBuf>) {
    // RUST_LOG overrides the verbose flag
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false) // Module paths are noise on a terminal
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    if let Some(log_path) = log_file {
        let (directory, file_name) = log_location(&log_path);
        // The appender needs the directory to exist
        let _ = std::fs::create_dir_all(&directory);

        let file_appender = tracing_appender::rolling::daily(directory, file_name);

        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false) // No escape codes in files
            .json(); // One JSON object per line

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }
}

/// Split a `--log-file` path into the appender's directory and file prefix.
fn log_location(log_path: &Path) -> (PathBuf, OsString) {
    // A bare file name has an empty parent, not None
    let directory = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = log_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("delivery-hub.log"));
    (directory, file_name)
}

fn default_directive(verbose: bool) -> String {
    format!("delivery_hub={}", if verbose { "debug" } else { "info" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "delivery_hub=info");
        assert_eq!(default_directive(true), "delivery_hub=debug");
    }

    #[test]
    fn test_directive_parses() {
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }

    #[test]
    fn test_log_location() {
        let (dir, name) = log_location(Path::new("logs/hub.log"));
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(name, OsString::from("hub.log"));

        let (dir, name) = log_location(Path::new("hub.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, OsString::from("hub.log"));

        let (_, name) = log_location(Path::new("/"));
        assert_eq!(name, OsString::from("delivery-hub.log"));
    }
}
