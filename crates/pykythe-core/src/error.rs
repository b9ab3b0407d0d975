//! Error types and exit-code constants for pykythe.
//!
//! This module provides a single unified error type, [`PykytheError`], that
//! every fallible boundary in the pipeline returns. The binary is the only
//! place that converts an error into a process [`ExitCode`]; internally the
//! pipeline just propagates `Result<_, PykytheError>` with `?`.
//!
//! ## Error Code Mapping
//!
//! - `2`: argument error (bad CLI input)
//! - `3`: parser error (upstream parser subprocess failed or produced
//!   malformed output)
//! - `4`: invariant error (duplicate edge, unreachable `Meta.path`, FQN
//!   mismatch, or any other "this should never happen" condition)
//! - `10`: internal/I-O error

use std::fmt;

use thiserror::Error;

/// Exit codes for the `pykythe` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Argument = 2,
    Parser = 3,
    Invariant = 4,
    Internal = 10,
}

impl ExitCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Unified error type for the pykythe pipeline.
#[derive(Debug, Error)]
pub enum PykytheError {
    /// Missing/duplicate/unparseable CLI option, or missing positional.
    #[error("invalid arguments: {message}")]
    Argument { message: String },

    /// Upstream parser subprocess failed or its output was not two
    /// concatenated JSON values.
    #[error("parser error: {message}")]
    Parser { message: String },

    /// An invariant the core guarantees was violated: duplicate edge,
    /// `Meta.path` not reachable under any `rootpath`, a derived module FQN
    /// disagreeing with the requested one, or similar.
    #[error("invariant violated: {message}")]
    Invariant { message: String },

    /// I/O failure or other unexpected internal condition.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl PykytheError {
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    pub fn parser(message: impl Into<String>) -> Self {
        Self::Parser {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<&PykytheError> for ExitCode {
    fn from(err: &PykytheError) -> Self {
        match err {
            PykytheError::Argument { .. } => ExitCode::Argument,
            PykytheError::Parser { .. } => ExitCode::Parser,
            PykytheError::Invariant { .. } => ExitCode::Invariant,
            PykytheError::Internal { .. } => ExitCode::Internal,
        }
    }
}

impl From<PykytheError> for ExitCode {
    fn from(err: PykytheError) -> Self {
        ExitCode::from(&err)
    }
}

impl From<std::io::Error> for PykytheError {
    fn from(err: std::io::Error) -> Self {
        PykytheError::Internal {
            message: format!("I/O error: {err}"),
        }
    }
}

impl From<serde_json::Error> for PykytheError {
    fn from(err: serde_json::Error) -> Self {
        PykytheError::Parser {
            message: format!("JSON error: {err}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PykytheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_to_expected_values() {
        assert_eq!(ExitCode::from(&PykytheError::argument("x")).code(), 2);
        assert_eq!(ExitCode::from(&PykytheError::parser("x")).code(), 3);
        assert_eq!(ExitCode::from(&PykytheError::invariant("x")).code(), 4);
        assert_eq!(ExitCode::from(&PykytheError::internal("x")).code(), 10);
    }
}
