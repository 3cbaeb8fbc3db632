use anyhow::Context;
use clap::{Parser, Subcommand};
use crab_loadtest::{
    Config, ContentMode, LoadTestController, LoadTestEvent, QueueDrainMonitor,
    SpoolerDeviceCommands, TestConfiguration, init_logger,
};
use crab_printer::{DeviceCommand, PrinterTarget, RawJob, SystemSpooler, parse_hex_string, read_hex_file};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Raw spooler tester for ESC/POS ticket printers
#[derive(Debug, Parser)]
#[command(name = "crab-loadtest", version, about, long_about = None)]
struct Args {
    /// print queue name (overrides PRINTER_NAME)
    #[arg(long, short = 'p', global = true)]
    printer: Option<String>,

    /// debug logging; use RUST_LOG for finer control
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print random tickets until the count is reached or Ctrl-C
    Run(RunArgs),
    /// ESC @ - initialize the printer
    Init,
    /// ESC i - cut the current ticket
    Cut,
    /// GS e 3 12 - present the ticket
    Present,
    /// GS e 5 - eject the ticket
    Eject,
    /// GS e 2 - retract (reject) the ticket
    Reject,
    /// Request a device reset through the spooler (ignored by some models)
    Reset,
    /// Print text encoded to the ANSI code page
    Text { text: String },
    /// Send hex bytes, e.g. "0x1B 0x40"
    Hex { hex: String },
    /// Send a text file of hex digits
    HexFile { path: PathBuf },
    /// Send a file's bytes unchanged
    File { path: PathBuf },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// text-excerpt, filler or empty
    #[arg(long)]
    mode: Option<ContentMode>,

    /// tickets to print; negative runs until stopped
    #[arg(long, allow_negative_numbers = true)]
    stop_after: Option<i64>,

    /// pause between tickets; negative uses 7000 ms
    #[arg(long, allow_negative_numbers = true)]
    delay_ms: Option<i64>,

    #[arg(long)]
    min_lines: Option<u32>,

    #[arg(long)]
    max_lines: Option<u32>,

    /// retract every n-th ticket instead of ejecting; 0 disables
    #[arg(long, allow_negative_numbers = true)]
    reject_every: Option<i64>,

    /// label printed in every ticket header
    #[arg(long)]
    test_name: Option<String>,
}

impl RunArgs {
    fn apply(self, config: &mut TestConfiguration) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(stop_after) = self.stop_after {
            config.stop_after = stop_after;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(min_lines) = self.min_lines {
            config.min_lines = min_lines;
        }
        if let Some(max_lines) = self.max_lines {
            config.max_lines = max_lines;
        }
        if let Some(reject_every) = self.reject_every {
            config.reject_every_nth = reject_every;
        }
        if let Some(test_name) = self.test_name {
            config.test_name = test_name;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(printer) = args.printer {
        config.printer_name = printer;
    }
    let level = if args.verbose { "debug" } else { config.log_level.as_str() };
    init_logger(level, config.log_dir.as_deref());

    let printer = PrinterTarget::new(config.printer_name.clone());
    if printer.is_empty() {
        anyhow::bail!("no printer given; set PRINTER_NAME or pass --printer");
    }
    let system = SystemSpooler::open()?;
    let spooler = system.spooler.clone();

    match args.command {
        Command::Run(run_args) => {
            let mut test = config.test.clone();
            run_args.apply(&mut test);
            run_load_test(system, printer.clone(), test).await?;
        }
        Command::Init => spooler.send_command(&printer, DeviceCommand::Initialize)?,
        Command::Cut => spooler.send_command(&printer, DeviceCommand::Cut)?,
        Command::Present => spooler.send_command(&printer, DeviceCommand::Present)?,
        Command::Eject => spooler.send_command(&printer, DeviceCommand::Eject)?,
        Command::Reject => spooler.send_command(&printer, DeviceCommand::Retract)?,
        Command::Reset => spooler.reset(&printer)?,
        Command::Text { text } => spooler.submit_text(&printer, &text)?,
        Command::Hex { hex } => {
            let bytes = parse_hex_string(&hex)?;
            spooler.submit(&printer, &RawJob::new(bytes))?;
        }
        Command::HexFile { path } => {
            let bytes = read_hex_file(&path)?;
            spooler.submit(&printer, &RawJob::new(bytes))?;
        }
        Command::File { path } => spooler.submit_file(&printer, &path)?,
    }

    tracing::info!(printer = %printer, "Done");
    Ok(())
}

async fn run_load_test(
    system: SystemSpooler,
    printer: PrinterTarget,
    test: TestConfiguration,
) -> anyhow::Result<()> {
    let devices = SpoolerDeviceCommands::new(system.spooler.clone(), printer.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = LoadTestController::new(
        printer,
        system.spooler,
        QueueDrainMonitor::new(system.queue),
        Arc::new(devices),
    )
    .with_events(tx);

    let run = controller
        .start(test)
        .context("a load test is already running")?;

    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, finishing current ticket");
            stop.stop();
        }
    });

    let printer_events = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                LoadTestEvent::RunCountChanged(remaining) => {
                    tracing::info!(remaining, "Tickets remaining");
                }
                LoadTestEvent::JobCountChanged(pending) => {
                    tracing::info!(pending, "Jobs in queue");
                }
            }
        }
    });

    let summary = run.wait().await?;
    // Dropping the controller closes the event channel
    drop(controller);
    let _ = printer_events.await;

    tracing::info!(
        cycles = summary.cycles_completed,
        failed = summary.failed_submissions,
        ejects = summary.ejects,
        rejects = summary.rejects,
        last_ticket = summary.ticket_counter,
        cancelled = summary.cancelled,
        "Load test finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_apply() {
        let args = Args::try_parse_from([
            "crab-loadtest",
            "--printer",
            "Reliance",
            "run",
            "--mode",
            "filler",
            "--stop-after",
            "-1",
            "--delay-ms",
            "-5",
            "--reject-every",
            "2",
        ])
        .unwrap();
        assert_eq!(args.printer.as_deref(), Some("Reliance"));

        let Command::Run(run_args) = args.command else {
            panic!("expected run subcommand");
        };
        let mut test = TestConfiguration::default();
        run_args.apply(&mut test);

        assert_eq!(test.mode, ContentMode::Filler);
        assert!(test.is_unbounded());
        assert_eq!(test.delay_ms, -5);
        assert_eq!(test.reject_every_nth, 2);
        // untouched fields keep their defaults
        assert_eq!(test.min_lines, 25);
    }

    #[test]
    fn test_one_shot_commands_parse() {
        let args = Args::try_parse_from(["crab-loadtest", "hex", "0x1B 0x40", "-p", "Reliance"]).unwrap();
        assert!(matches!(args.command, Command::Hex { ref hex } if hex == "0x1B 0x40"));
        assert_eq!(args.printer.as_deref(), Some("Reliance"));

        assert!(Args::try_parse_from(["crab-loadtest", "run", "--mode", "qr"]).is_err());
    }
}
