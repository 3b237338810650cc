//! Logger setup for the CLI.
//!
//! Log records go to stderr so command output on stdout stays parseable.

use clap::ValueEnum;

use crate::error::CliError;

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Install the global logger.
///
/// # Errors
///
/// Returns an error if a logger has already been installed.
pub fn init_logger(level: LogLevel) -> Result<(), CliError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level.into())
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
