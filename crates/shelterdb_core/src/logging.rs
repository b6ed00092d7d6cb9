//! Console logging setup.
//!
//! One logger per process, writing to stderr. Panics are logged before the
//! previous hook runs.
//!
//! Line format: `timestamp - logger name - level - message`.

use flexi_logger::{DeferredNow, Logger, LoggerHandle, WriteMode};
use log::{error, info, Level, Record};
use once_cell::sync::OnceCell;
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";
const PANIC_MESSAGE_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    level: &'static str,
    _handle: LoggerHandle,
}

/// Initializes process-wide console logging at `level`.
///
/// Repeating the call with the same level is a no-op; a different level is
/// rejected. Never panics.
///
/// # Errors
/// - `level` is not one of `trace|debug|info|warn|error`.
/// - The logger backend fails to start.
pub fn init_logging(level: &str) -> Result<(), String> {
    let requested = level_name(parse_level(level)?);

    let active = ACTIVE.get_or_try_init(|| -> Result<ActiveLogger, String> {
        let handle = Logger::try_with_str(requested)
            .map_err(|err| format!("invalid log level `{requested}`: {err}"))?
            .log_to_stderr()
            .format(console_format)
            .write_mode(WriteMode::Direct)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        log_panics();
        info!(
            "event=logging_init module=core status=ok level={requested} version={}",
            env!("CARGO_PKG_VERSION")
        );

        Ok(ActiveLogger {
            level: requested,
            _handle: handle,
        })
    })?;

    if active.level != requested {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{requested}`",
            active.level
        ));
    }
    Ok(())
}

/// Returns the active log level, or `None` before initialization.
pub fn logging_status() -> Option<&'static str> {
    ACTIVE.get().map(|active| active.level)
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn console_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record<'_>,
) -> std::io::Result<()> {
    write!(
        w,
        "{} - {} - {} - {}",
        now.format(TIMESTAMP_FORMAT),
        record.target(),
        record.level(),
        record.args()
    )
}

fn parse_level(level: &str) -> Result<Level, String> {
    let trimmed = level.trim();
    trimmed.parse::<Level>().map_err(|_| {
        format!("unsupported log level `{trimmed}`; expected trace|debug|info|warn|error")
    })
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Trace => "trace",
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warn",
        Level::Error => "error",
    }
}

/// Chains a hook that logs the panic site and a one-line message summary.
fn log_panics() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(
            "event=panic module=core status=error location={location} message={}",
            one_line(message, PANIC_MESSAGE_LIMIT)
        );
        previous(panic_info);
    }));
}

/// Collapses line breaks and caps the length so a message fits one log line.
fn one_line(message: &str, limit: usize) -> String {
    let mut line: String = message
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(limit)
        .collect();
    if message.chars().count() > limit {
        line.push_str("...");
    }
    line
}
