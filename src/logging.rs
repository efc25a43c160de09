use crate::config::LogLevel;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for the crate at the requested verbosity
pub fn filter_directive(debug: bool, quiet: bool, configured: LogLevel) -> String {
    let level = if debug {
        LogLevel::Debug
    } else if quiet {
        LogLevel::Error
    } else {
        configured
    };
    format!("memory_context={}", level)
}

/// Initialize logging; command-line flags win over the configured level
pub fn init_logging(
    debug: bool,
    quiet: bool,
    configured: LogLevel,
    log_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let verbose = debug || configured == LogLevel::Debug;
    let env_filter = EnvFilter::new(filter_directive(debug, quiet, configured));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(verbose)
        .with_file(verbose)
        .with_writer(std::io::stderr);

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(file)
            .with_target(true)
            .with_line_number(true)
            .with_file(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(file_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_configured_level() {
        assert_eq!(
            filter_directive(true, true, LogLevel::Error),
            "memory_context=debug"
        );
        assert_eq!(
            filter_directive(false, true, LogLevel::Debug),
            "memory_context=error"
        );
        assert_eq!(
            filter_directive(false, false, LogLevel::Info),
            "memory_context=info"
        );
    }
}
