//! Logger setup for the rover executables
//!
//! Records are written both to stdout and to the session's log file, prefixed with the number of
//! seconds elapsed since the session epoch.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Modules which emit a record every tick, and the most verbose level they may log at.
const TICK_LEVEL_CAPS: [(&str, LevelFilter); 2] = [
    ("rov_lib::auto::per", LevelFilter::Debug),
    ("rov_lib::auto::map", LevelFilter::Debug),
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be `Info` or more verbose, warnings and errors alone are not enough to
///   reconstruct a drive from the log.
/// - The per-tick perception and map chatter is capped at `Debug` even when `Trace` is requested.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}{}",
                prefix(
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.level(),
                    record.target()
                ),
                message
            ))
        })
        .level(min_level);

    TICK_LEVEL_CAPS
        .iter()
        .fold(dispatch, |d, &(module, cap)| {
            d.level_for(module, min_level.min(cap))
        })
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the start of a log line: elapsed time, level and, below `Info`, the record's target.
fn prefix<L: std::fmt::Display>(
    elapsed_s: f64,
    level_str: L,
    level: log::Level,
    target: &str,
) -> String {
    if level > log::Level::Info {
        format!("[{:10.6} {}] {}: ", elapsed_s, level_str, target)
    } else {
        format!("[{:10.6} {}] ", elapsed_s, level_str)
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}
