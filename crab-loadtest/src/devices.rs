//! Device-command callbacks
//!
//! The controller only knows it has to cut, present, eject or reject; how
//! that reaches the printer is up to the implementation it is given.

use crab_printer::{DeviceCommand, PrintResult, PrinterTarget, RawSpooler};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Pause after each command so the device can act on it
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Callbacks invoked synchronously by the run loop
pub trait DeviceCommands: Send + Sync {
    fn on_cut(&self);
    fn on_present(&self);
    fn on_eject(&self);
    fn on_reject(&self);
}

/// Sends each command as its own raw job
pub struct SpoolerDeviceCommands {
    spooler: Arc<dyn RawSpooler>,
    printer: PrinterTarget,
    settle: Duration,
}

impl SpoolerDeviceCommands {
    pub fn new(spooler: Arc<dyn RawSpooler>, printer: PrinterTarget) -> Self {
        Self {
            spooler,
            printer,
            settle: DEFAULT_SETTLE,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn send(&self, command: DeviceCommand) -> PrintResult<()> {
        let result = self.spooler.send_command(&self.printer, command);
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        result
    }

    fn send_logged(&self, command: DeviceCommand) {
        if let Err(e) = self.send(command) {
            warn!(printer = %self.printer, %command, error = %e, "Device command failed");
        }
    }
}

impl DeviceCommands for SpoolerDeviceCommands {
    fn on_cut(&self) {
        self.send_logged(DeviceCommand::Cut);
    }

    fn on_present(&self) {
        self.send_logged(DeviceCommand::Present);
    }

    fn on_eject(&self) {
        self.send_logged(DeviceCommand::Eject);
    }

    fn on_reject(&self) {
        self.send_logged(DeviceCommand::Retract);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crab_printer::{PrintError, RawJob};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        jobs: Mutex<Vec<Vec<u8>>>,
        fail: bool,
    }

    impl RawSpooler for Capture {
        fn submit(&self, printer: &PrinterTarget, job: &RawJob) -> PrintResult<()> {
            if printer.is_empty() {
                return Err(PrintError::EmptyPrinterName);
            }
            self.jobs.lock().unwrap().push(job.data().to_vec());
            if self.fail {
                return Err(PrintError::Unsupported("offline".into()));
            }
            Ok(())
        }

        fn reset(&self, _: &PrinterTarget) -> PrintResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_callbacks_send_exact_bytes() {
        let capture = Arc::new(Capture::default());
        let commands = SpoolerDeviceCommands::new(capture.clone(), "Reliance".into())
            .with_settle(Duration::ZERO);

        commands.on_cut();
        commands.on_present();
        commands.on_eject();
        commands.on_reject();

        assert_eq!(
            *capture.jobs.lock().unwrap(),
            vec![
                vec![0x1B, 0x69],
                vec![0x1D, 0x65, 0x03, 0x0C],
                vec![0x1D, 0x65, 0x05],
                vec![0x1D, 0x65, 0x02],
            ]
        );
    }

    #[test]
    fn test_failure_is_reported_not_raised() {
        let capture = Arc::new(Capture {
            fail: true,
            ..Default::default()
        });
        let commands = SpoolerDeviceCommands::new(capture.clone(), "Reliance".into())
            .with_settle(Duration::ZERO);

        assert!(commands.send(DeviceCommand::Initialize).is_err());
        commands.on_eject();
        assert_eq!(capture.jobs.lock().unwrap().len(), 2);
    }
}
