use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use rideshare_dispatch::application::engine::RideEngine;
use rideshare_dispatch::config::{EngineConfig, SelectionStrategy};
use rideshare_dispatch::domain::ports::EntityStoreBox;
use rideshare_dispatch::infrastructure::in_memory::InMemoryEntityStore;
use rideshare_dispatch::interfaces::csv::command_reader::CommandReader;
use rideshare_dispatch::interfaces::csv::trip_writer::TripWriter;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command script (CSV) to run against the engine
    input: PathBuf,

    /// JSON file with engine settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Flat fare charged per trip
    #[arg(long)]
    flat_fare: Option<Decimal>,

    /// Multiplier applied on top of the flat fare
    #[arg(long)]
    surge: Option<Decimal>,

    /// Driver selection policy for `dispatch` commands
    #[arg(long, value_enum)]
    selection: Option<SelectionStrategy>,

    /// Format of the final trip table
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path).into_diagnostic()?,
            None => EngineConfig::default(),
        };
        if let Some(flat_fare) = self.flat_fare {
            config.flat_fare = flat_fare;
        }
        if let Some(surge) = self.surge {
            config.surge_multiplier = surge;
        }
        if let Some(selection) = self.selection {
            config.selection = selection;
        }
        Ok(config)
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
    {
        eprintln!("tracing init failed: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = cli.engine_config()?;
    let store: EntityStoreBox = Box::new(InMemoryEntityStore::new());
    let engine = RideEngine::from_config(store, &config).into_diagnostic()?;

    // Run the script
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (line, command) in reader.commands() {
        match command {
            Ok(command) => match command.execute(&engine).await {
                Ok(summary) => info!(line, "{summary}"),
                Err(e) => warn!(line, error = %e, "Error processing command"),
            },
            Err(e) => warn!(line, error = %e, "Error reading command"),
        }
    }

    // Output final state
    let trips = engine.all_trips().await.into_diagnostic()?;
    let stdout = io::stdout();
    match cli.format {
        OutputFormat::Csv => {
            let mut writer = TripWriter::new(stdout.lock());
            writer.write_trips(&trips).into_diagnostic()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(stdout.lock(), &trips).into_diagnostic()?;
            println!();
        }
    }

    Ok(())
}
