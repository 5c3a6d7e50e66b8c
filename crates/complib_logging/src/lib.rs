//! Logging setup and on-disk locations for complib.
//!
//! Events go to `~/.complib/logs/<app>.log` (size-rotated) and to stderr.
//! While the TUI owns the terminal only warnings reach stderr.

mod rolling;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use rolling::{RollingFile, SharedLog};

const DEFAULT_FILTER: &str = "complib=info,complib_gateway=info";
const KEEP_FILES: usize = 5;
const FILE_LIMIT: u64 = 10 * 1024 * 1024;

pub struct LogConfig<'a> {
    /// File stem for the log file.
    pub app_name: &'a str,
    pub verbose: bool,
    pub tui_mode: bool,
}

impl LogConfig<'_> {
    /// Directive for stderr, or `None` to mirror the file filter.
    fn console_directive(&self) -> Option<&'static str> {
        if self.verbose && !self.tui_mode {
            None
        } else {
            Some("warn")
        }
    }
}

fn file_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let dir = ensure_logs_dir()?;
    let file = RollingFile::open(dir, config.app_name, KEEP_FILES, FILE_LIMIT)
        .with_context(|| format!("Failed to open log file for {}", config.app_name))?;

    let console_filter = match config.console_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => file_filter(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SharedLog::new(file))
                .with_ansi(false)
                .with_filter(file_filter()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")
}

/// `$COMPLIB_HOME`, else `~/.complib` (or `./.complib` without a home dir).
pub fn complib_home() -> PathBuf {
    std::env::var_os("COMPLIB_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".complib")
        })
}

pub fn logs_dir() -> PathBuf {
    complib_home().join("logs")
}

pub fn ensure_logs_dir() -> Result<PathBuf> {
    let dir = logs_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(verbose: bool, tui_mode: bool) -> LogConfig<'static> {
        LogConfig {
            app_name: "complib",
            verbose,
            tui_mode,
        }
    }

    #[test]
    fn test_console_is_quiet_unless_verbose_cli() {
        assert_eq!(config(false, false).console_directive(), Some("warn"));
        assert_eq!(config(true, true).console_directive(), Some("warn"));
        assert_eq!(config(false, true).console_directive(), Some("warn"));
        assert_eq!(config(true, false).console_directive(), None);
    }

    #[test]
    fn test_logs_dir_is_under_home() {
        assert!(logs_dir().starts_with(complib_home()));
        assert!(logs_dir().ends_with("logs"));
    }
}
