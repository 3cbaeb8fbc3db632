//! Error types for the printer library

use crate::spooler::SpoolOp;
use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// No print queue name was given
    #[error("Printer name is empty")]
    EmptyPrinterName,

    /// A spooler call failed; `code` is the platform last-error value
    #[error("{op} failed for '{printer}' (os error {code})")]
    Spooler {
        printer: String,
        op: SpoolOp,
        code: u32,
    },

    /// The spooler accepted fewer bytes than were submitted
    #[error("Incomplete write to '{printer}': {written} of {expected} bytes")]
    IncompleteWrite {
        printer: String,
        written: usize,
        expected: usize,
    },

    /// Malformed hex input
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// IO error while reading a payload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw spooling is not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
