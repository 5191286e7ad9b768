// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! EngineWatch - Engine Condition Monitoring
//!
//! Streams engine telemetry through a fault classifier, diagnoses manually
//! entered readings and summarises the maintenance log.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use enginewatch::core::{Event, SessionEvent, CRITICAL_STOP_REASON};
use enginewatch::{
    diagnose, Config, EngineSimulator, EventBus, FaultClassifier, LiveTelemetrySource,
    LogSummary, MaintenanceLog, ManualInput, OperationalMode, ReferenceDataset, SessionPhase,
    StreamingSession, TelemetrySource, VERSION,
};

/// EngineWatch - Engine Condition Monitoring
#[derive(Parser, Debug)]
#[command(name = "enginewatch")]
#[command(author = "EngineWatch Project")]
#[command(version = VERSION)]
#[command(about = "Engine telemetry fault classification and condition monitoring")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream telemetry until a critical fault, the tick ceiling or Ctrl+C
    Monitor {
        /// Tick ceiling for this run
        #[arg(long)]
        ticks: Option<u64>,

        /// Live telemetry endpoint; falls back to the simulator per tick
        #[arg(long)]
        endpoint: Option<String>,

        /// Seed for the simulated engine
        #[arg(long)]
        seed: Option<u64>,

        /// Milliseconds between ticks
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Do not write the maintenance log
        #[arg(long)]
        no_log: bool,
    },

    /// Diagnose one manually entered reading
    Predict {
        /// Temperature in °C (17-120)
        #[arg(long)]
        temperature: f64,

        /// Engine speed (800-4000)
        #[arg(long)]
        rpm: f64,

        /// Fuel efficiency in km/l (4-30)
        #[arg(long)]
        fuel_efficiency: f64,

        /// Torque in Nm (40-200)
        #[arg(long)]
        torque: f64,

        /// Power output in kW (20-100)
        #[arg(long)]
        power_output: f64,

        /// Idle, Cruising or "Heavy Load"
        #[arg(long, default_value = "Cruising")]
        mode: OperationalMode,
    },

    /// Summarise the maintenance log
    Logs {
        /// Number of recent entries to show
        #[arg(long, default_value = "5")]
        tail: usize,

        /// Also print every column of this reference dataset row
        #[arg(long)]
        row: Option<usize>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::from_str(&config.log_level).unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("EngineWatch v{}", VERSION);
    info!("Configuration loaded from {:?}", config_path);

    match args.command {
        Command::Monitor {
            ticks,
            endpoint,
            seed,
            interval_ms,
            no_log,
        } => {
            let mut config = config;
            if let Some(ticks) = ticks {
                config.session.max_ticks = ticks;
            }
            if endpoint.is_some() {
                config.telemetry.endpoint = endpoint;
            }
            if seed.is_some() {
                config.telemetry.seed = seed;
            }
            if let Some(ms) = interval_ms {
                config.session.tick_interval_ms = ms;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_monitor(config, !no_log))
        }
        Command::Predict {
            temperature,
            rpm,
            fuel_efficiency,
            torque,
            power_output,
            mode,
        } => run_predict(
            &config,
            ManualInput {
                temperature,
                rpm,
                fuel_efficiency,
                torque,
                power_output,
                mode,
            },
        ),
        Command::Logs { tail, row } => run_logs(&config, tail, row),
    }
}

/// Run a monitoring session until it halts or Ctrl+C
async fn run_monitor(config: Config, write_log: bool) -> Result<()> {
    let classifier = Arc::new(
        FaultClassifier::from_path(&config.data.model)
            .with_context(|| format!("loading model {:?}", config.data.model))?,
    );
    let simulator = config
        .telemetry
        .seed
        .map(EngineSimulator::with_seed)
        .unwrap_or_default();
    let log = write_log.then(|| MaintenanceLog::new(&config.data.log_file));

    let bus = Arc::new(EventBus::default());
    let printer = tokio::spawn(print_events(bus.subscribe()));

    // Shutdown channel
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    });

    info!("Press Ctrl+C to stop monitoring");

    match &config.telemetry.endpoint {
        Some(endpoint) => {
            let source =
                LiveTelemetrySource::new(endpoint, config.telemetry.timeout(), simulator)?;
            info!("Using live telemetry from {}", endpoint);
            let session = StreamingSession::new(source, classifier, config.session.clone());
            monitor(session, log, bus, shutdown_rx).await?;
        }
        None => {
            info!("Using simulated telemetry");
            let session = StreamingSession::new(simulator, classifier, config.session.clone());
            monitor(session, log, bus, shutdown_rx).await?;
        }
    }

    // All senders are gone once the session is dropped
    let _ = printer.await;
    Ok(())
}

async fn monitor<S: TelemetrySource>(
    session: StreamingSession<S>,
    log: Option<MaintenanceLog>,
    bus: Arc<EventBus>,
    shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let mut session = session.with_events(bus);
    if let Some(log) = log {
        info!("Logging to {:?}", log.path());
        session = session.with_log(log);
    }

    let summary = session.run(shutdown).await?;

    println!();
    println!("Recent history:");
    println!("{:<10} {:>8} {:>6} {:<11} {}", "Time", "Temp", "RPM", "Mode", "Status");
    for entry in session.state().history.iter() {
        println!(
            "{:<10} {:>8.2} {:>6} {:<11} {}",
            entry.time_label(),
            entry.temperature,
            entry.rpm,
            entry.mode.as_str(),
            entry.status()
        );
    }

    println!();
    println!(
        "{} ticks, highest severity: {}",
        summary.ticks,
        summary
            .highest_severity
            .map(|s| s.label())
            .unwrap_or("none")
    );
    if summary.log_failures > 0 {
        warn!("{} ticks could not be logged", summary.log_failures);
    }
    if summary.final_phase == SessionPhase::StoppedCritical {
        println!("{}", CRITICAL_STOP_REASON);
    }
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let SessionEvent::Tick { outcome, .. } = event.payload {
                    let r = &outcome.reading;
                    println!(
                        "[{:>4}] {:>7.2}°C {:>5} rpm {:<11} {:<14} {}",
                        outcome.tick,
                        r.temperature,
                        r.rpm,
                        r.mode.as_str(),
                        outcome.severity.label(),
                        outcome.message
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Display lagged, {} events dropped", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Complete a manual reading from the reference dataset and classify it
fn run_predict(config: &Config, input: ManualInput) -> Result<()> {
    let dataset = ReferenceDataset::load(&config.data.reference_dataset)?;
    let classifier = FaultClassifier::from_path(&config.data.model)?;
    let log = MaintenanceLog::new(&config.data.log_file);

    let diagnosis = diagnose(&input, &dataset, &classifier, Some(&log))?;
    let vibration = diagnosis.reading.vibration;

    println!("Status:    {}", diagnosis.severity.label());
    println!("Diagnosis: {}", diagnosis.message);
    println!(
        "Vibration (from reference row {}): X={:.2} Y={:.2} Z={:.2}",
        diagnosis.row_index, vibration.x, vibration.y, vibration.z
    );
    if let Some(err) = diagnosis.log_error {
        warn!("Diagnosis was not logged: {}", err);
    }
    Ok(())
}

/// Print recent log entries, the status distribution and referenced rows
fn run_logs(config: &Config, tail: usize, row: Option<usize>) -> Result<()> {
    let summary = LogSummary::load(&config.data.log_file)?;

    if summary.is_empty() {
        println!("No maintenance log entries in {:?}", config.data.log_file);
    } else {
        println!("{}", summary.headers.join(" | "));
        for entry in summary.tail(tail) {
            let values: Vec<&str> = entry.fields.iter().map(|(_, v)| v.as_str()).collect();
            println!("{}", values.join(" | "));
        }

        println!();
        println!("Status distribution:");
        for (severity, count) in summary.status_counts() {
            println!("  {:<15} {}", severity.label(), count);
        }

        let rows = summary.dataset_rows();
        if !rows.is_empty() {
            let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
            println!("Reference rows used: {}", rows.join(", "));
        }
    }

    if let Some(index) = row {
        let dataset = ReferenceDataset::load(&config.data.reference_dataset)?;
        match dataset.inspect(index) {
            Some(fields) => {
                println!();
                println!("Reference row {}:", index);
                for (header, value) in fields {
                    println!("  {:<20} {}", header, value);
                }
            }
            None => warn!("Reference row {} not found ({} rows)", index, dataset.len()),
        }
    }

    Ok(())
}
