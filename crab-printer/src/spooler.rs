//! Raw spooler client
//!
//! A raw job is written to the print queue without any driver rendering:
//!
//! ```text
//! open -> start doc ("RAW") -> start page -> write -> end page -> end doc -> close
//! ```
//!
//! [`SpoolerApi`] is the platform boundary (one method per spooler call).
//! [`RawPrinter`] runs the transaction on top of it with scoped guards, so a
//! failure at any step still ends the page/document and closes the queue.

use crate::encoding::encode_ansi;
use crate::error::{PrintError, PrintResult};
use crate::escpos::DeviceCommand;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Document name shown in the print queue for raw jobs
pub const DEFAULT_DOC_NAME: &str = "ESCPOSTester";

/// Datatype that tells the spooler not to reinterpret the bytes
pub const RAW_DATATYPE: &str = "RAW";

/// Platform error code (Win32 `GetLastError` value)
pub type OsCode = u32;

/// Result of a single platform spooler call
pub type OsResult<T> = Result<T, OsCode>;

/// Spooler call, used for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolOp {
    Open,
    StartDoc,
    StartPage,
    Write,
    EndPage,
    EndDoc,
    Close,
    Reset,
    QueryStatus,
}

impl fmt::Display for SpoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpoolOp::Open => "OpenPrinter",
            SpoolOp::StartDoc => "StartDocPrinter",
            SpoolOp::StartPage => "StartPagePrinter",
            SpoolOp::Write => "WritePrinter",
            SpoolOp::EndPage => "EndPagePrinter",
            SpoolOp::EndDoc => "EndDocPrinter",
            SpoolOp::Close => "ClosePrinter",
            SpoolOp::Reset => "ResetPrinter",
            SpoolOp::QueryStatus => "GetPrinter",
        };
        f.write_str(name)
    }
}

/// Name of an OS-registered print queue
///
/// Purely referential: holding a target never opens the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PrinterTarget(String);

impl PrinterTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PrinterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrinterTarget {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Bytes of one raw job plus the document label shown in the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJob {
    doc_name: String,
    data: Vec<u8>,
}

impl RawJob {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            doc_name: DEFAULT_DOC_NAME.to_string(),
            data: data.into(),
        }
    }

    pub fn with_doc_name(mut self, doc_name: impl Into<String>) -> Self {
        self.doc_name = doc_name.into();
        self
    }

    pub fn doc_name(&self) -> &str {
        &self.doc_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Snapshot of a print queue, read fresh on every query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStatus {
    pub pending_jobs: u32,
}

/// Platform spooler calls
///
/// Each method maps onto exactly one OS call and reports the platform
/// error code on failure. Handles never leave the thread that opened them.
pub trait SpoolerApi {
    type Handle;

    fn open(&self, printer: &str) -> OsResult<Self::Handle>;
    fn start_doc(&self, handle: &Self::Handle, doc_name: &str, datatype: &str) -> OsResult<()>;
    fn start_page(&self, handle: &Self::Handle) -> OsResult<()>;
    /// Returns the number of bytes the spooler accepted
    fn write(&self, handle: &Self::Handle, data: &[u8]) -> OsResult<usize>;
    fn end_page(&self, handle: &Self::Handle) -> OsResult<()>;
    fn end_doc(&self, handle: &Self::Handle) -> OsResult<()>;
    fn close(&self, handle: &Self::Handle) -> OsResult<()>;
    /// Device reset request; many models accept and ignore it
    fn reset(&self, handle: &Self::Handle) -> OsResult<()>;
    fn pending_jobs(&self, handle: &Self::Handle) -> OsResult<u32>;
}

/// Submits raw jobs to a named queue
pub trait RawSpooler: Send + Sync {
    /// Submit one raw job as a self-contained transaction
    fn submit(&self, printer: &PrinterTarget, job: &RawJob) -> PrintResult<()>;

    /// Ask the queue to reset (reboot) the device
    fn reset(&self, printer: &PrinterTarget) -> PrintResult<()>;

    /// Send one of the fixed device-control sequences
    fn send_command(&self, printer: &PrinterTarget, command: DeviceCommand) -> PrintResult<()> {
        self.submit(printer, &RawJob::new(command.bytes()))
    }

    /// Send text encoded to the ANSI code page
    fn submit_text(&self, printer: &PrinterTarget, text: &str) -> PrintResult<()> {
        self.submit(printer, &RawJob::new(encode_ansi(text)))
    }

    /// Send a file's bytes unchanged
    fn submit_file(&self, printer: &PrinterTarget, path: &Path) -> PrintResult<()> {
        let data = std::fs::read(path)?;
        self.submit(printer, &RawJob::new(data))
    }
}

/// Reads the pending job count of a queue
pub trait QueueStatusSource: Send + Sync {
    fn queue_status(&self, printer: &PrinterTarget) -> PrintResult<QueueStatus>;
}

/// Raw spooler client over a platform [`SpoolerApi`]
#[derive(Debug, Clone, Default)]
pub struct RawPrinter<A> {
    api: A,
}

impl<A: SpoolerApi> RawPrinter<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn open<'a>(&'a self, printer: &'a PrinterTarget) -> PrintResult<OpenQueue<'a, A>> {
        if printer.is_empty() {
            return Err(PrintError::EmptyPrinterName);
        }
        let handle = self
            .api
            .open(printer.name())
            .map_err(|code| spool_error(printer, SpoolOp::Open, code))?;
        Ok(OpenQueue {
            api: &self.api,
            printer,
            handle,
        })
    }
}

impl<A> RawSpooler for RawPrinter<A>
where
    A: SpoolerApi + Send + Sync,
{
    #[instrument(skip_all, fields(printer = %printer, doc = job.doc_name(), data_len = job.len()))]
    fn submit(&self, printer: &PrinterTarget, job: &RawJob) -> PrintResult<()> {
        let queue = self.open(printer)?;
        let doc = queue.start_doc(job.doc_name())?;
        let page = doc.start_page()?;

        let written = page.write(job.data())?;
        if written != job.len() {
            return Err(PrintError::IncompleteWrite {
                printer: printer.name().to_string(),
                written,
                expected: job.len(),
            });
        }

        debug!("Raw job written");
        Ok(())
    }

    #[instrument(skip_all, fields(printer = %printer))]
    fn reset(&self, printer: &PrinterTarget) -> PrintResult<()> {
        let queue = self.open(printer)?;
        queue
            .api
            .reset(queue.handle())
            .map_err(|code| spool_error(printer, SpoolOp::Reset, code))?;
        info!("Reset requested");
        Ok(())
    }
}

impl<A> QueueStatusSource for RawPrinter<A>
where
    A: SpoolerApi + Send + Sync,
{
    fn queue_status(&self, printer: &PrinterTarget) -> PrintResult<QueueStatus> {
        let queue = self.open(printer)?;
        let pending_jobs = queue
            .api
            .pending_jobs(queue.handle())
            .map_err(|code| spool_error(printer, SpoolOp::QueryStatus, code))?;
        Ok(QueueStatus { pending_jobs })
    }
}

fn spool_error(printer: &PrinterTarget, op: SpoolOp, code: OsCode) -> PrintError {
    PrintError::Spooler {
        printer: printer.name().to_string(),
        op,
        code,
    }
}

/// Open queue handle, closed on drop
struct OpenQueue<'a, A: SpoolerApi> {
    api: &'a A,
    printer: &'a PrinterTarget,
    handle: A::Handle,
}

impl<'a, A: SpoolerApi> OpenQueue<'a, A> {
    fn handle(&self) -> &A::Handle {
        &self.handle
    }

    fn start_doc(&self, doc_name: &str) -> PrintResult<OpenDoc<'_, 'a, A>> {
        self.api
            .start_doc(self.handle(), doc_name, RAW_DATATYPE)
            .map_err(|code| spool_error(self.printer, SpoolOp::StartDoc, code))?;
        Ok(OpenDoc { queue: self })
    }
}

impl<A: SpoolerApi> Drop for OpenQueue<'_, A> {
    fn drop(&mut self) {
        if let Err(code) = self.api.close(&self.handle) {
            warn!(printer = %self.printer, code, "ClosePrinter failed");
        }
    }
}

/// Started document, ended on drop
struct OpenDoc<'q, 'a, A: SpoolerApi> {
    queue: &'q OpenQueue<'a, A>,
}

impl<'q, 'a, A: SpoolerApi> OpenDoc<'q, 'a, A> {
    fn start_page(&self) -> PrintResult<OpenPage<'_, 'q, 'a, A>> {
        let queue = self.queue;
        queue
            .api
            .start_page(queue.handle())
            .map_err(|code| spool_error(queue.printer, SpoolOp::StartPage, code))?;
        Ok(OpenPage { doc: self })
    }
}

impl<A: SpoolerApi> Drop for OpenDoc<'_, '_, A> {
    fn drop(&mut self) {
        if let Err(code) = self.queue.api.end_doc(self.queue.handle()) {
            warn!(printer = %self.queue.printer, code, "EndDocPrinter failed");
        }
    }
}

/// Started page, ended on drop
struct OpenPage<'d, 'q, 'a, A: SpoolerApi> {
    doc: &'d OpenDoc<'q, 'a, A>,
}

impl<A: SpoolerApi> OpenPage<'_, '_, '_, A> {
    fn write(&self, data: &[u8]) -> PrintResult<usize> {
        let queue = self.doc.queue;
        queue
            .api
            .write(queue.handle(), data)
            .map_err(|code| spool_error(queue.printer, SpoolOp::Write, code))
    }
}

impl<A: SpoolerApi> Drop for OpenPage<'_, '_, '_, A> {
    fn drop(&mut self) {
        let queue = self.doc.queue;
        if let Err(code) = queue.api.end_page(queue.handle()) {
            warn!(printer = %queue.printer, code, "EndPagePrinter failed");
        }
    }
}
