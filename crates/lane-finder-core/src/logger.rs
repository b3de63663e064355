//! Stderr logger for the `log` facade.
//!
//! Lines look like `[  1.234s  INFO lane_finder_detect::finder] message`.
//! With the `tracing` feature, `init_tracing` installs a `tracing-subscriber`
//! formatter instead.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger at `level`.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// `Warn` for quiet runs, `Info` otherwise.
pub fn log_level(quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

/// `EnvFilter` directive for `level`, e.g. `"warn"`.
#[cfg(feature = "tracing")]
fn default_directive(level: LevelFilter) -> String {
    level.as_str().to_ascii_lowercase()
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, falling back to
/// `level`. `log` records are forwarded through the subscriber's `LogTracer`.
///
/// Span close events carry the per-stage timings of a frame.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_runs_log_warnings_only() {
        assert_eq!(log_level(true), LevelFilter::Warn);
        assert_eq!(log_level(false), LevelFilter::Info);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn tracing_directive_follows_level() {
        assert_eq!(default_directive(log_level(true)), "warn");
        assert_eq!(default_directive(log_level(false)), "info");
        assert!(EnvFilter::try_new(default_directive(LevelFilter::Warn)).is_ok());
    }
}
