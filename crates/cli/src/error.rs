//! CLI error types.

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    /// Settings could not be loaded or the adapter is not usable
    Config(String),
    /// Fixture file did not match the expected shape
    Fixture(String),
    /// IO error
    Io(std::io::Error),
    /// Logger could not be installed
    Logger(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Fixture(msg) => write!(f, "Fixture error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Logger(msg) => write!(f, "Logger error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<log::SetLoggerError> for CliError {
    fn from(err: log::SetLoggerError) -> Self {
        CliError::Logger(err.to_string())
    }
}
