use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ringsizer::core::db::{ClientInfo, MeasurementDb, MeasurementRepository};
use ringsizer::core::sink::{DbSink, MeasurementSink, NullSink};
use ringsizer::recording::{load_recording, replay};
use ringsizer::{load_config, Finger, MeasurementConfig, MeasurementPipeline, MeasurementSession};

#[derive(Parser)]
#[command(name = "ringsizer")]
#[command(about = "Estimate ring sizes from recorded hand-tracking sessions")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a recorded session and measure one finger
    Measure {
        /// Path to the recording JSON
        #[arg(value_name = "SESSION")]
        session: PathBuf,

        /// Finger to measure (thumb, index, middle, ring, pinky)
        #[arg(short, long)]
        finger: Finger,

        /// Measurement store; results are only printed when omitted
        #[arg(long, value_name = "FILE")]
        db: Option<PathBuf>,

        #[arg(long, default_value = "default")]
        client: String,

        #[arg(long)]
        device: Option<String>,

        /// Pipeline configuration JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },
    /// Export every stored record as CSV
    Export {
        #[arg(long, value_name = "FILE")]
        db: PathBuf,

        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Print stored records as JSON lines
    List {
        #[arg(long, value_name = "FILE")]
        db: PathBuf,

        #[arg(long)]
        client: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Measure {
            session,
            finger,
            db,
            client,
            device,
            config,
            debug_out,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => MeasurementConfig::default(),
            };
            let mut pipeline = MeasurementPipeline::new(config);
            if let Some(debug_dir) = debug_out {
                pipeline = pipeline.with_debug(debug_dir)?;
            }

            info!("Loading recording: {:?}", session);
            let (recording, base_dir) = load_recording(&session)?;
            info!(
                "{} frames at {}x{}",
                recording.frames.len(),
                recording.width,
                recording.height
            );

            let client = ClientInfo {
                client_id: client,
                device_model: device,
            };
            let mut measurement = MeasurementSession::new();
            measurement.select_finger(finger);

            let store = match db {
                Some(path) => Some(MeasurementDb::new(&path).await?),
                None => None,
            };
            let db_sink = store.clone().map(DbSink::new).transpose()?;
            let sink: &dyn MeasurementSink = match &db_sink {
                Some(sink) => sink,
                None => &NullSink,
            };

            let summary = replay(&pipeline, &mut measurement, &recording, &base_dir, sink, &client)?;

            if let Some(sink) = &db_sink {
                sink.flush().await;
            }
            if let Some(store) = &store {
                store.close().await?;
            }

            println!("\n=== Ring Size Result ===");
            println!("Frames processed: {} ({} skipped)", summary.frames, summary.skipped);
            match summary.result {
                Some(result) => {
                    println!("Finger: {}", result.finger);
                    println!("Diameter: {:.2} mm", result.diameter_mm);
                    match (result.size_eu, result.size_us) {
                        (Some(eu), Some(us)) => println!("Size: EU {} / US {}", eu, us),
                        _ => println!("Size: out of range"),
                    }
                    println!(
                        "Mode: {} (confidence {:?})",
                        result.detection_mode.label(),
                        result.confidence
                    );
                }
                None => println!("No stable measurement."),
            }
        }
        Command::Export { db, out } => {
            let store = MeasurementDb::new(&db).await?;
            let rows = store.export_csv(&out).await?;
            store.close().await?;
            println!("Exported {} records to {}", rows, out.display());
        }
        Command::List { db, client } => {
            let store = MeasurementDb::new(&db).await?;
            let records = match client {
                Some(client) => store.get_client_measurements(&client).await?,
                None => store.get_measurements().await?,
            };
            store.close().await?;
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }

    Ok(())
}
