// fortnml/src/error.rs

//! Error types for reading, writing and patching namelists.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fortnml operations.
pub type Result<T> = std::result::Result<T, FortnmlError>;

/// Errors that can occur when parsing, writing, or patching Fortran namelists.
#[derive(Error, Debug)]
pub enum FortnmlError {
    /// Malformed namelist text.
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Malformed array subscript.
    #[error("{variable}: {message}")]
    InvalidIndex { variable: String, message: String },

    /// The input ended before the group terminator.
    #[error("namelist group '{group}' is not terminated")]
    UnterminatedGroup { group: String },

    /// A quoted string was still open at the end of the input.
    #[error("unterminated string starting on line {line}")]
    UnterminatedString { line: usize },

    #[error("unexpected character '{character}' on line {line}")]
    UnexpectedCharacter { line: usize, character: char },

    /// Rejected formatting property.
    #[error("invalid {setting}: {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },

    /// Rejected floating point format specification.
    #[error("invalid float format '{format}': {message}")]
    InvalidFormat { format: String, message: String },

    #[error("file {} already exists", .0.display())]
    FileExists(PathBuf),

    #[error("patch destination cannot be the same as the source file {}", .0.display())]
    PatchTarget(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Broad classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The namelist text could not be parsed.
    Syntax,
    /// A configuration value was rejected when it was set.
    Value,
    /// The filesystem refused or would have clobbered something.
    Io,
}

impl FortnmlError {
    /// Create a new syntax error.
    pub fn syntax<S: Into<String>>(line: usize, message: S) -> Self {
        FortnmlError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Create a new invalid index error.
    pub fn invalid_index<S: Into<String>, M: Into<String>>(variable: S, message: M) -> Self {
        FortnmlError::InvalidIndex {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid setting error.
    pub fn invalid_setting<S: Into<String>>(setting: &'static str, message: S) -> Self {
        FortnmlError::InvalidSetting {
            setting,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FortnmlError::Syntax { .. }
            | FortnmlError::InvalidIndex { .. }
            | FortnmlError::UnterminatedGroup { .. }
            | FortnmlError::UnterminatedString { .. }
            | FortnmlError::UnexpectedCharacter { .. } => ErrorKind::Syntax,
            FortnmlError::InvalidSetting { .. } | FortnmlError::InvalidFormat { .. } => {
                ErrorKind::Value
            }
            FortnmlError::FileExists(_) | FortnmlError::PatchTarget(_) | FortnmlError::Io(_) => {
                ErrorKind::Io
            }
        }
    }
}
