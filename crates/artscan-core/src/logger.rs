//! Session logging.
//!
//! [`LogFilter`] holds `env_logger`-style directives such as
//! `info,artscan_capture=debug`: a default level plus per-target overrides,
//! the longest matching target prefix winning. [`init_with_filter`] installs
//! a stderr logger that prints
//!
//! ```text
//! [  12.345s  INFO capture::photo] photo mode started
//! ```
//!
//! with the elapsed session time and the target shortened by its `artscan_`
//! prefix, so the capture loop and the recognition callbacks line up by eye.

use std::fmt;
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
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid log directive `{0}`")]
pub struct LogFilterError(pub String);

/// Default level plus per-target overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    /// Sorted by descending target length.
    targets: Vec<(String, LevelFilter)>,
}

impl LogFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            targets: Vec::new(),
        }
    }

    /// Override the level of `target` and everything below it.
    pub fn with_target(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        let target = target.into();
        self.targets.retain(|(t, _)| *t != target);
        self.targets.push((target, level));
        self.targets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Level applying to `target`.
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

    /// Most verbose level any target may log at.
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .chain([self.default])
            .max()
            .unwrap_or(self.default)
    }
}

impl FromStr for LogFilter {
    type Err = LogFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = LogFilter::new(LevelFilter::Info);
        for directive in s.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let bad = || LogFilterError(directive.to_owned());
            match directive.split_once('=') {
                Some((target, level)) => {
                    let level = level.trim().parse().map_err(|_| bad())?;
                    let target = target.trim();
                    if target.is_empty() {
                        return Err(bad());
                    }
                    filter = filter.with_target(target, level);
                }
                None => filter.default = directive.parse().map_err(|_| bad())?,
            }
        }
        Ok(filter)
    }
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default.as_str().to_lowercase())?;
        for (target, level) in self.targets.iter().rev() {
            write!(f, ",{target}={}", level.as_str().to_lowercase())?;
        }
        Ok(())
    }
}

/// `artscan_capture::photo` becomes `capture::photo`.
fn short_target(target: &str) -> &str {
    target.strip_prefix("artscan_").unwrap_or(target)
}

fn format_line(elapsed: f64, level: log::Level, target: &str, message: &fmt::Arguments<'_>) -> String {
    format!("[{elapsed:8.3}s {level:>5} {}] {message}", short_target(target))
}

struct SessionLogger {
    filter: LogFilter,
    started: Instant,
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

/// Install the session logger. Only the first call has an effect.
pub fn init_with_filter(filter: LogFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let max = filter.max_level();
    let logger = LOGGER.get_or_init(|| SessionLogger {
        filter,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(max);
    Ok(())
}

/// Install the session logger with one level for every target.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_filter(LogFilter::new(level))
}

/// Install a `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins over `directives`. Span close events carry the timings of
/// the instrumented tick stages.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
