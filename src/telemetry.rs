//! Logging setup: colored stderr plus a JSON daily-rolling log file.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const ENV_LOG_FILE: &str = "CLASS_ROSTER_LOG";
const DEFAULT_LOG_FILE: &str = "logs/class_roster.log";

/// Where the JSON log goes, split into the directory and file-name prefix
/// that `tracing_appender::rolling::daily` wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub dir: PathBuf,
    pub file_name: PathBuf,
}

impl LogTarget {
    pub fn from_path(path: &str) -> Self {
        let path = Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("logs"));
        let file_name = path
            .file_name()
            .unwrap_or(OsStr::new("class_roster.log"));
        Self {
            dir: dir.to_path_buf(),
            file_name: PathBuf::from(file_name),
        }
    }

    pub fn from_env() -> Self {
        let path = std::env::var(ENV_LOG_FILE).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        Self::from_path(&path)
    }
}

/// Installs the global subscriber.
///
/// Stderr honours `RUST_LOG` (default `info`); the JSON file honours
/// `RUST_LOG_JSON` (default `debug`). Keep the returned guard alive for the
/// life of the process or buffered file lines are lost.
pub fn init(target: &LogTarget) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
