//! Stderr logger with per-module level directives.
//!
//! Lines look like `   1.234s INFO  pocket_align_calib::slot: message`, the
//! time measured from installation. Levels come from a directive string such
//! as `warn,pocket_align_calib=debug`: a bare level sets the default and
//! `target=level` pairs override it for a module and its children.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read by [`init_from_env`] and [`init_tracing`].
pub const LOG_ENV_VAR: &str = "POCKET_ALIGN_LOG";

/// Parsed level directives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    /// Sorted longest target first so the most specific match wins.
    targets: Vec<(String, LevelFilter)>,
}

impl LogFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            targets: Vec::new(),
        }
    }

    /// Parse comma-separated directives on top of `default`.
    ///
    /// Malformed pieces are skipped.
    pub fn parse(spec: &str, default: LevelFilter) -> Self {
        let mut filter = Self::new(default);
        for piece in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match piece.split_once('=') {
                Some((target, level)) => {
                    if let Ok(level) = LevelFilter::from_str(level.trim()) {
                        filter.targets.retain(|(t, _)| t != target.trim());
                        filter.targets.push((target.trim().to_owned(), level));
                    }
                }
                None => {
                    if let Ok(level) = LevelFilter::from_str(piece) {
                        filter.default = level;
                    }
                }
            }
        }
        filter.targets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        filter
    }

    /// Level in effect for a record target such as `pocket_align_calib::slot`.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .find(|(t, _)| {
                target
                    .strip_prefix(t.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
            })
            .map_or(self.default, |(_, level)| *level)
    }

    /// Most verbose level any target can reach.
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, Ord::max)
    }
}

struct StderrLogger {
    filter: LogFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut out = std::io::stderr().lock();
        let _ = writeln!(
            out,
            "{:>9.3}s {:<5} {}: {}",
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

/// Install the stderr logger. Later calls keep the first filter.
pub fn init(filter: LogFilter) -> Result<(), log::SetLoggerError> {
    let max = filter.max_level();
    let fresh = StderrLogger {
        filter,
        started: Instant::now(),
    };
    if LOGGER.set(fresh).is_err() {
        return Ok(());
    }
    if let Some(logger) = LOGGER.get() {
        log::set_logger(logger)?;
        log::set_max_level(max);
    }
    Ok(())
}

/// Install the stderr logger with one level for every target.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init(LogFilter::new(level))
}

/// Install the stderr logger from the directives in `POCKET_ALIGN_LOG`,
/// with `default` for targets they do not name.
pub fn init_from_env(default: LevelFilter) -> Result<(), log::SetLoggerError> {
    let spec = std::env::var(LOG_ENV_VAR).unwrap_or_default();
    init(LogFilter::parse(&spec, default))
}

/// Install a `tracing` subscriber reading the same directives.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
