//! Error types for argodiff-core

use std::fmt;

/// Result type alias for argodiff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for argodiff operations
#[derive(Debug)]
pub enum Error {
    /// Invalid configuration
    Config(String),

    /// I/O error
    Io(std::io::Error),

    /// Argo CD API error
    ArgoCd(String),

    /// GitHub API error
    GitHub(String),

    /// Argo CD CLI installation error
    Install(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::ArgoCd(msg) => write!(f, "Argo CD error: {}", msg),
            Error::GitHub(msg) => write!(f, "GitHub error: {}", msg),
            Error::Install(msg) => write!(f, "Install error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Fieldless error category for zero-cost pattern matching.
///
/// Single byte representation (`#[repr(u8)]`), `Copy`, no allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Configuration error
    Config,
    /// I/O operation error
    Io,
    /// Argo CD API error
    ArgoCd,
    /// GitHub API error
    GitHub,
    /// CLI installation error
    Install,
}

impl Error {
    /// Get the error kind, zero allocation.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::ArgoCd(_) => ErrorKind::ArgoCd,
            Error::GitHub(_) => ErrorKind::GitHub,
            Error::Install(_) => ErrorKind::Install,
        }
    }

    /// Borrow the error message, zero allocation.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::ArgoCd(msg)
            | Error::GitHub(msg)
            | Error::Install(msg) => msg,
            Error::Io(_) => "I/O error",
        }
    }
}
