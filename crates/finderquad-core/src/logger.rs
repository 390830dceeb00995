//! Stderr logging for the detection pipeline.
//!
//! Only records emitted by the `finderquad*` crates are printed, as
//! `[  0.012s DEBUG pattern::fusion] message`. Dependencies stay quiet.

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

/// Environment variable read by [`init_from_env`].
pub const LOG_ENV: &str = "FINDERQUAD_LOG";

const TARGET_PREFIX: &str = "finderquad";

struct PipelineLogger {
    level: LevelFilter,
    started: Instant,
}

/// `finderquad_pattern::fusion` -> `pattern::fusion`.
fn short_target(target: &str) -> &str {
    let rest = target.strip_prefix(TARGET_PREFIX).unwrap_or(target);
    rest.trim_start_matches(['_', '-', ':'])
}

impl Log for PipelineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with(TARGET_PREFIX)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let target = match short_target(record.target()) {
            "" => "facade",
            t => t,
        };
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:8.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            target,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<PipelineLogger> = OnceLock::new();

/// Install the pipeline logger at `level`. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| PipelineLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install the pipeline logger at the level named by `FINDERQUAD_LOG`
/// (`off`, `error`, ..., `trace`), falling back to `default`.
pub fn init_from_env(default: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_level(level_from(std::env::var(LOG_ENV).ok().as_deref(), default))
}

fn level_from(value: Option<&str>, default: LevelFilter) -> LevelFilter {
    value
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(default)
}

/// Install a `tracing` subscriber for the `finderquad*` targets.
///
/// `RUST_LOG` overrides the default `finderquad=info` directive. With
/// `json = true` every event and closed stage span is one flat JSON line,
/// which is what batch runs over many images want.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{TARGET_PREFIX}=info")));

    if json {
        let _ = fmt()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(filter)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .compact()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(filter)
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_lose_the_crate_prefix() {
        assert_eq!(short_target("finderquad_pattern::fusion"), "pattern::fusion");
        assert_eq!(short_target("finderquad::detector"), "detector");
        assert_eq!(short_target("finderquad"), "");
        assert_eq!(short_target("imageproc::contours"), "imageproc::contours");
    }

    #[test]
    fn level_parsing_falls_back() {
        assert_eq!(level_from(Some("debug"), LevelFilter::Warn), LevelFilter::Debug);
        assert_eq!(level_from(Some(" TRACE "), LevelFilter::Warn), LevelFilter::Trace);
        assert_eq!(level_from(Some("loud"), LevelFilter::Warn), LevelFilter::Warn);
        assert_eq!(level_from(None, LevelFilter::Info), LevelFilter::Info);
    }
}
