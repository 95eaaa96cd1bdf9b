//! Error taxonomy (§7 of the design). Kinds, not exception types: every
//! public entry point returns one of these rather than panicking, except
//! for the `in_callback` reentrancy guard (a programmer error, not a
//! recoverable parse condition).

use std::fmt;

/// The kind of error, independent of the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad constructor arguments: zero-valued limits, delimiter == quote.
    InvalidArguments,
    /// A growable allocation could not proceed within its configured bound.
    OutOfMemory,
    /// A strict-mode violation: unclosed quote, char after closing quote,
    /// quote inside an unquoted field.
    ParseError,
    /// A quoted field's accumulated length would exceed `max_field_size`.
    FieldTooLarge,
    /// A row's total field size would exceed `max_row_size`.
    RowTooLarge,
    /// Failure from the `parse_stream` / `parse_file` I/O helpers.
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArguments => "invalid arguments",
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::ParseError => "parse error",
            ErrorKind::FieldTooLarge => "field too large",
            ErrorKind::RowTooLarge => "row too large",
            ErrorKind::IoError => "I/O error",
        };
        f.write_str(s)
    }
}

/// The error type returned from every fallible public operation.
///
/// Carries the row number the error was detected at (best-effort — for
/// errors detected before any row has completed, this is the row in
/// progress) so callers don't need the error callback just to log context.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message} (near row {row_number})")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub row_number: u64,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            row_number: 0,
        }
    }

    pub fn at_row(mut self, row_number: u64) -> Self {
        self.row_number = row_number;
        self
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::IoError, e.to_string())
    }
}
