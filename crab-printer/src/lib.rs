//! # crab-printer
//!
//! Raw spooler printing for ESC/POS ticket printers - low-level capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW bytes reach the printer:
//! - Raw print jobs through the OS spooler (datatype `RAW`)
//! - Queue reset and pending-job queries
//! - Fixed ESC/POS device commands (cut, present, retract, eject)
//! - Text encoding and hex command ingestion
//!
//! WHAT to print, and when, stays in application code (load testing lives
//! in `crab-loadtest`).
//!
//! ## Example
//!
//! ```ignore
//! use crab_printer::{DeviceCommand, PrinterTarget, RawJob, RawSpooler, SystemSpooler};
//!
//! let system = SystemSpooler::open()?;
//! let printer = PrinterTarget::new("Reliance Printer");
//!
//! system.spooler.submit(&printer, &RawJob::new(b"Hello\n".to_vec()))?;
//! system.spooler.send_command(&printer, DeviceCommand::Cut)?;
//! system.spooler.send_command(&printer, DeviceCommand::Present)?;
//! ```

mod encoding;
mod error;
mod escpos;
mod hex;
mod printer;
mod spooler;

// Re-exports
pub use encoding::{encode_ansi, encode_ascii_lossy};
pub use error::{PrintError, PrintResult};
pub use escpos::{CUT, DeviceCommand, EJECT, INIT, PRESENT_12_STEPS, RETRACT};
pub use hex::{parse_hex_string, read_hex_file};
pub use printer::SystemSpooler;
pub use spooler::{
    DEFAULT_DOC_NAME, OsCode, OsResult, PrinterTarget, QueueStatus, QueueStatusSource,
    RAW_DATATYPE, RawJob, RawPrinter, RawSpooler, SpoolOp, SpoolerApi,
};

#[cfg(windows)]
pub use printer::WindowsSpooler;
