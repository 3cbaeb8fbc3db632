//! Load-test controller
//!
//! Drives the ticket cycle against one print queue:
//!
//! ```text
//! generate -> submit -> cut -> present -> drain -> eject | reject -> delay -> repeat
//! ```
//!
//! The cycle runs on a dedicated blocking task. Stopping is cooperative:
//! [`LoadTestController::stop`] only raises a flag, which the loop reads
//! between cycles and while waiting for the queue to drain. An in-flight
//! spooler call or delay is never interrupted.

use crate::config::TestConfiguration;
use crate::devices::DeviceCommands;
use crate::drain::{DrainOutcome, QueueDrainMonitor};
use crate::error::LoadTestResult;
use crate::generator::ContentGenerator;
use crab_printer::{PrinterTarget, RawJob, RawSpooler, encode_ascii_lossy};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Progress notifications, delivered in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTestEvent {
    /// Tickets left in a bounded run, sent before the cycle's submission
    RunCountChanged(i64),
    /// Pending jobs observed while draining
    JobCountChanged(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    /// Stop requested, loop has not reached a checkpoint yet
    Stopping,
}

/// Outcome of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles_completed: u64,
    pub failed_submissions: u64,
    pub ejects: u64,
    pub rejects: u64,
    /// Counter of the last ticket generated
    pub ticket_counter: u64,
    pub cancelled: bool,
}

/// Counters of the active run, readable while it progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSnapshot {
    /// `None` for an unbounded run
    pub tickets_remaining: Option<i64>,
    pub ticket_counter: u64,
}

#[derive(Debug)]
struct RunState {
    tickets_remaining: i64,
    ticket_counter: u64,
    reject_counter: i64,
    cancel_requested: bool,
}

#[derive(Debug)]
struct Shared {
    state: ControllerState,
    run: Option<Arc<Mutex<RunState>>>,
    unbounded: bool,
}

/// Cloneable stop signal for the controller's active run
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Mutex<Shared>>,
}

impl StopHandle {
    /// Request the active run to stop; a no-op when idle
    pub fn stop(&self) {
        let mut shared = self.shared.lock();
        if let Some(run) = shared.run.clone() {
            run.lock().cancel_requested = true;
            shared.state = ControllerState::Stopping;
            info!("Stop requested");
        }
    }
}

/// Handle to a started run
pub struct RunHandle {
    join: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Wait for the run to finish
    pub async fn wait(self) -> LoadTestResult<RunSummary> {
        Ok(self.join.await?)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Load-test state machine for one print queue
#[derive(Clone)]
pub struct LoadTestController {
    printer: PrinterTarget,
    spooler: Arc<dyn RawSpooler>,
    monitor: Arc<QueueDrainMonitor>,
    devices: Arc<dyn DeviceCommands>,
    events: Option<mpsc::UnboundedSender<LoadTestEvent>>,
    seed: Option<u64>,
    shared: Arc<Mutex<Shared>>,
}

impl LoadTestController {
    pub fn new(
        printer: PrinterTarget,
        spooler: Arc<dyn RawSpooler>,
        monitor: QueueDrainMonitor,
        devices: Arc<dyn DeviceCommands>,
    ) -> Self {
        Self {
            printer,
            spooler,
            monitor: Arc::new(monitor),
            devices,
            events: None,
            seed: None,
            shared: Arc::new(Mutex::new(Shared {
                state: ControllerState::Idle,
                run: None,
                unbounded: false,
            })),
        }
    }

    /// Send progress events to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<LoadTestEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Seed ticket content generation
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn printer(&self) -> &PrinterTarget {
        &self.printer
    }

    pub fn state(&self) -> ControllerState {
        self.shared.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() != ControllerState::Idle
    }

    pub fn snapshot(&self) -> Option<RunSnapshot> {
        let shared = self.shared.lock();
        let unbounded = shared.unbounded;
        shared.run.as_ref().map(|run| {
            let run = run.lock();
            RunSnapshot {
                tickets_remaining: (!unbounded).then_some(run.tickets_remaining),
                ticket_counter: run.ticket_counter,
            }
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Request the active run to stop
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    /// Start a run on a blocking task
    ///
    /// Returns `None` without side effects when a run is already active.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, config: TestConfiguration) -> Option<RunHandle> {
        let run_state = Arc::new(Mutex::new(RunState {
            tickets_remaining: config.stop_after,
            ticket_counter: 0,
            reject_counter: 0,
            cancel_requested: false,
        }));
        {
            let mut shared = self.shared.lock();
            if shared.state != ControllerState::Idle {
                debug!(state = ?shared.state, "Start ignored, run already active");
                return None;
            }
            shared.state = ControllerState::Running;
            shared.unbounded = config.is_unbounded();
            shared.run = Some(run_state.clone());
        }

        let mut generator = ContentGenerator::new(self.printer.name(), config.test_name.clone());
        if let Some(seed) = self.seed {
            generator = generator.with_seed(seed);
        }

        let run = CycleRunner {
            printer: self.printer.clone(),
            spooler: self.spooler.clone(),
            monitor: self.monitor.clone(),
            devices: self.devices.clone(),
            events: self.events.clone(),
            shared: self.shared.clone(),
            run_state,
            generator,
            config,
        };

        info!(printer = %self.printer, "Load test started");
        let join = tokio::task::spawn_blocking(move || run.run());
        Some(RunHandle { join })
    }
}

/// Returns the controller to idle when the run ends, even by panic
struct IdleOnDrop {
    shared: Arc<Mutex<Shared>>,
}

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        shared.state = ControllerState::Idle;
        shared.run = None;
    }
}

/// What the loop does at the end of a cycle
enum Disposal {
    Eject,
    Reject,
}

struct CycleRunner {
    printer: PrinterTarget,
    spooler: Arc<dyn RawSpooler>,
    monitor: Arc<QueueDrainMonitor>,
    devices: Arc<dyn DeviceCommands>,
    events: Option<mpsc::UnboundedSender<LoadTestEvent>>,
    shared: Arc<Mutex<Shared>>,
    run_state: Arc<Mutex<RunState>>,
    generator: ContentGenerator,
    config: TestConfiguration,
}

impl CycleRunner {
    fn run(mut self) -> RunSummary {
        let _idle = IdleOnDrop {
            shared: self.shared.clone(),
        };
        let bounded = !self.config.is_unbounded();
        let delay = self.config.inter_cycle_delay();
        let (min_lines, max_lines) = self.config.line_bounds();
        let mut summary = RunSummary::default();

        info!(
            printer = %self.printer,
            mode = %self.config.mode,
            stop_after = self.config.stop_after,
            delay_ms = delay.as_millis() as u64,
            reject_every = self.config.reject_every_nth,
            "Run loop started"
        );

        while !self.should_stop(bounded) {
            if bounded {
                let remaining = self.with_run(|run| {
                    run.tickets_remaining -= 1;
                    run.tickets_remaining
                });
                self.emit(LoadTestEvent::RunCountChanged(remaining));
            }

            let counter = self.with_run(|run| {
                run.ticket_counter += 1;
                run.ticket_counter
            });
            summary.ticket_counter = counter;

            let content = self
                .generator
                .generate(self.config.mode, min_lines, max_lines, counter);
            let job = RawJob::new(encode_ascii_lossy(&content));
            if let Err(e) = self.spooler.submit(&self.printer, &job) {
                warn!(ticket = counter, error = %e, "Ticket submission failed");
                summary.failed_submissions += 1;
            }

            self.devices.on_cut();
            self.devices.on_present();

            let drained = self.monitor.await_drain(
                &self.printer,
                || self.is_cancelled(),
                |pending| self.emit(LoadTestEvent::JobCountChanged(pending)),
            );
            if drained == DrainOutcome::Cancelled {
                debug!(ticket = counter, "Queue not drained, stopping after this ticket");
            }

            match self.next_disposal() {
                Disposal::Reject => {
                    self.devices.on_reject();
                    summary.rejects += 1;
                }
                Disposal::Eject => {
                    self.devices.on_eject();
                    summary.ejects += 1;
                }
            }

            summary.cycles_completed += 1;
            debug!(ticket = counter, "Cycle completed");

            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }

        summary.cancelled = self.is_cancelled();
        info!(
            cycles = summary.cycles_completed,
            failed = summary.failed_submissions,
            cancelled = summary.cancelled,
            "Run loop finished"
        );
        summary
    }

    fn with_run<T>(&self, f: impl FnOnce(&mut RunState) -> T) -> T {
        f(&mut self.run_state.lock())
    }

    fn is_cancelled(&self) -> bool {
        self.with_run(|run| run.cancel_requested)
    }

    fn should_stop(&self, bounded: bool) -> bool {
        self.with_run(|run| run.cancel_requested || (bounded && run.tickets_remaining <= 0))
    }

    /// Every n-th cycle is a reject; the counter restarts after each one
    fn next_disposal(&self) -> Disposal {
        let every = self.config.reject_every_nth;
        self.with_run(|run| {
            run.reject_counter += 1;
            if every > 0 && run.reject_counter >= every {
                run.reject_counter = 0;
                Disposal::Reject
            } else {
                Disposal::Eject
            }
        })
    }

    fn emit(&self, event: LoadTestEvent) {
        if let Some(tx) = &self.events {
            // Receiver gone means nobody is watching; the run carries on
            let _ = tx.send(event);
        }
    }
}
