//! # crab-loadtest
//!
//! Load testing for ESC/POS ticket printers behind the OS print spooler.
//!
//! A run repeatedly prints a synthetic ticket, cuts and presents it, waits
//! for the queue to drain, then ejects it (or, every n-th ticket, retracts
//! it) until the configured count is reached or the run is stopped.
//!
//! ## Example
//!
//! ```ignore
//! use crab_loadtest::{LoadTestController, QueueDrainMonitor, SpoolerDeviceCommands, TestConfiguration};
//! use crab_printer::{PrinterTarget, SystemSpooler};
//! use std::sync::Arc;
//!
//! let system = SystemSpooler::open()?;
//! let printer = PrinterTarget::new("Reliance Printer");
//! let devices = SpoolerDeviceCommands::new(system.spooler.clone(), printer.clone());
//!
//! let controller = LoadTestController::new(
//!     printer,
//!     system.spooler.clone(),
//!     QueueDrainMonitor::new(system.queue.clone()),
//!     Arc::new(devices),
//! );
//!
//! let run = controller.start(TestConfiguration::default()).expect("idle");
//! let summary = run.wait().await?;
//! ```

pub mod config;
pub mod controller;
pub mod corpus;
pub mod devices;
pub mod drain;
pub mod error;
pub mod generator;
pub mod logger;

pub use config::{Config, ContentMode, TestConfiguration};
pub use controller::{
    ControllerState, LoadTestController, LoadTestEvent, RunHandle, RunSnapshot, RunSummary,
    StopHandle,
};
pub use corpus::Corpus;
pub use devices::{DeviceCommands, SpoolerDeviceCommands};
pub use drain::{DrainOutcome, QueueDrainMonitor};
pub use error::{ConfigError, LoadTestError, LoadTestResult};
pub use generator::ContentGenerator;
pub use logger::init_logger;
