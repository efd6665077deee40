//! Error types for the vector-phosphor crate.
//!
//! The per-tick pipeline never fails; errors only come from building an
//! engine with a bad configuration or from reading host trace logs.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Error type for configuration and trace-log handling.
#[derive(Debug)]
pub enum Error {
    /// Invalid engine configuration.
    InvalidConfig(String),

    /// A trace-log line could not be parsed.
    Parse { line: usize, message: String },

    /// I/O failure while reading a trace log.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Error::Parse { line, message } => write!(f, "parse error on line {}: {}", line, message),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// Create an invalid config error with a message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Create a parse error for the given (1-based) line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Returns true if this is an InvalidConfig error.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Result type for configuration and trace-log operations.
pub type Result<T> = std::result::Result<T, Error>;
