//! Client error taxonomy
//!
//! Controllers never let `Network` escape to the page: suggestion panels hide
//! and the failure is logged. `Validation` aborts an operation before any
//! request is made.

use std::fmt;

/// Errors surfaced by the client core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transport failure, non-2xx status, or a body that is not the expected JSON
    Network(String),
    /// A required field is empty or inconsistent (checked client-side)
    Validation(String),
    /// The backend answered 401 to an authenticated call
    AuthExpired,
    /// The stored `user` entry could not be parsed
    MalformedStoredSession(String),
    /// The local key-value store could not be read or written
    Storage(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Validation(msg) => write!(f, "{}", msg),
            Self::AuthExpired => write!(f, "Session expired, please log in again"),
            Self::MalformedStoredSession(msg) => {
                write!(f, "Stored session is malformed: {}", msg)
            }
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Convenience alias used across the library
pub type ClientResult<T> = Result<T, ClientError>;
