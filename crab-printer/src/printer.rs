//! Platform spooler backends
//!
//! Supports:
//! - Windows print spooler (winspool via Win32 API)
//!
//! Other platforms have no raw spooler; [`SystemSpooler::open`] reports
//! [`PrintError::Unsupported`] there.

use crate::error::PrintResult;
use crate::spooler::{QueueStatusSource, RawSpooler};
use std::sync::Arc;

#[cfg(not(windows))]
use crate::error::PrintError;

/// The OS spooler, as the two capabilities the load tester consumes
#[derive(Clone)]
pub struct SystemSpooler {
    pub spooler: Arc<dyn RawSpooler>,
    pub queue: Arc<dyn QueueStatusSource>,
}

impl SystemSpooler {
    #[cfg(windows)]
    pub fn open() -> PrintResult<Self> {
        let printer = Arc::new(crate::spooler::RawPrinter::new(WindowsSpooler));
        Ok(Self {
            spooler: printer.clone(),
            queue: printer,
        })
    }

    #[cfg(not(windows))]
    pub fn open() -> PrintResult<Self> {
        Err(PrintError::Unsupported(
            "raw spooling requires the Windows print spooler".to_string(),
        ))
    }
}

#[cfg(windows)]
pub use self::win::WindowsSpooler;

#[cfg(windows)]
mod win {
    use crate::spooler::{OsCode, OsResult, SpoolerApi};
    use core::ffi::c_void;
    use windows::Win32::Foundation::GetLastError;
    use windows::Win32::Graphics::Printing::{
        ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, GetPrinterW, OpenPrinterW,
        PRINTER_DEFAULTSW, PRINTER_HANDLE, PRINTER_INFO_2W, ResetPrinterW, StartDocPrinterW,
        StartPagePrinter, WritePrinter,
    };
    use windows::core::{PCWSTR, PWSTR};

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn last_error() -> OsCode {
        unsafe { GetLastError() }.0
    }

    fn check(ok: bool) -> OsResult<()> {
        if ok { Ok(()) } else { Err(last_error()) }
    }

    /// Win32 winspool backend
    ///
    /// Stateless: every handle is opened and closed inside one transaction.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WindowsSpooler;

    impl SpoolerApi for WindowsSpooler {
        type Handle = PRINTER_HANDLE;

        fn open(&self, printer: &str) -> OsResult<PRINTER_HANDLE> {
            let name_w = to_wide(printer);
            let mut handle = PRINTER_HANDLE::default();
            unsafe { OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None) }
                .map_err(|_| last_error())?;
            Ok(handle)
        }

        fn start_doc(&self, handle: &PRINTER_HANDLE, doc_name: &str, datatype: &str) -> OsResult<()> {
            let doc_name_w = to_wide(doc_name);
            let datatype_w = to_wide(datatype);
            let doc_info = DOC_INFO_1W {
                pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
            };
            let job_id = unsafe { StartDocPrinterW(*handle, 1, &doc_info as *const DOC_INFO_1W) };
            check(job_id != 0)
        }

        fn start_page(&self, handle: &PRINTER_HANDLE) -> OsResult<()> {
            check(unsafe { StartPagePrinter(*handle) }.as_bool())
        }

        fn write(&self, handle: &PRINTER_HANDLE, data: &[u8]) -> OsResult<usize> {
            let mut written: u32 = 0;
            let ok = unsafe {
                WritePrinter(
                    *handle,
                    data.as_ptr() as *const c_void,
                    data.len() as u32,
                    &mut written,
                )
            };
            check(ok.as_bool())?;
            Ok(written as usize)
        }

        fn end_page(&self, handle: &PRINTER_HANDLE) -> OsResult<()> {
            check(unsafe { EndPagePrinter(*handle) }.as_bool())
        }

        fn end_doc(&self, handle: &PRINTER_HANDLE) -> OsResult<()> {
            check(unsafe { EndDocPrinter(*handle) }.as_bool())
        }

        fn close(&self, handle: &PRINTER_HANDLE) -> OsResult<()> {
            unsafe { ClosePrinter(*handle) }.map_err(|_| last_error())
        }

        fn reset(&self, handle: &PRINTER_HANDLE) -> OsResult<()> {
            let defaults = PRINTER_DEFAULTSW::default();
            check(unsafe { ResetPrinterW(*handle, Some(&defaults as *const PRINTER_DEFAULTSW)) }.as_bool())
        }

        fn pending_jobs(&self, handle: &PRINTER_HANDLE) -> OsResult<u32> {
            let mut needed: u32 = 0;
            let _ = unsafe { GetPrinterW(*handle, 2, None, &mut needed) };
            if needed == 0 {
                return Err(last_error());
            }

            let mut buf: Vec<u8> = vec![0; needed as usize];
            unsafe { GetPrinterW(*handle, 2, Some(buf.as_mut_slice()), &mut needed) }
                .map_err(|_| last_error())?;

            // Byte buffer carries no alignment guarantee for the struct
            let info = unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const PRINTER_INFO_2W) };
            Ok(info.cJobs)
        }
    }
}
