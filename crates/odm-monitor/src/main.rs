//! Oracle Deviation Monitor - Entry Point
//!
//! Replays a simulated price path or reads JSON lines from stdin, and logs
//! the resulting CDE, triggers and published oracle.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use odm_monitor::{AppConfig, Application, SourceKind};
use odm_telemetry::Metrics;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Simulator,
    Stdin,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Simulator => SourceKind::Simulator,
            SourceArg::Stdin => SourceKind::Stdin,
        }
    }
}

/// Oracle Deviation Monitor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via ODM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured input source
    #[arg(short, long, value_enum)]
    source: Option<SourceArg>,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Print the Prometheus text exposition on stdout at exit
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    odm_telemetry::init_logging()?;

    info!("Starting ODM v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(args.config)?;
    if let Some(source) = args.source {
        config.source.kind = source.into();
    }
    info!(
        source = ?config.source.kind,
        capacity = config.buffer.capacity,
        static_threshold = config.detector.static_threshold,
        "Configuration loaded"
    );

    let app = Application::new(config)?;
    let snapshot = app.run_to_completion().await?;

    info!(
        ticks = snapshot.ticks_ingested,
        buffer_len = snapshot.points.len(),
        cde = snapshot.cde,
        triggers = snapshot.triggers.len(),
        published_oracle = ?snapshot.published_oracle,
        cde_alert = snapshot.cde_alert_active,
        "Run complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    if args.metrics {
        print!("{}", Metrics::gather_text()?);
    }

    Ok(())
}
