//! Exact-match placement engine - command line entrypoint.
//!
//! Loads the layered configuration, initializes logging, and runs one of the
//! maintenance or simulation commands against the library.

use clap::{Parser, Subcommand};
use em_placement_lib::config::{
    ConfigLoader, ConfigResult, EngineConfig, DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
use em_placement_lib::error::{report, EngineError, EngineResult, TracingErrorReporter};
use em_placement_lib::simulation::{SimulationReport, Simulator};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

/// Command line arguments.
#[derive(Parser, Debug)]
#[clap(name = "em_placement", version, author, about)]
struct Args {
    /// Path to configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Command to execute
    #[clap(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Fill a simulated table with synthetic keys and print statistics
    Simulate {
        /// Number of keys to insert, overriding the configuration
        #[clap(short, long)]
        keys: Option<u64>,

        /// Print the report as JSON
        #[clap(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

/// Main entry point for the application.
fn main() {
    let args = Args::parse();

    let loaded = ConfigLoader::resolve(
        args.config.as_deref(),
        Path::new(DEFAULT_CONFIG_PATH),
        ENV_PREFIX,
    )
    .load();
    let log = loaded
        .as_ref()
        .map(|config| config.log.clone())
        .unwrap_or_default();
    if let Err(e) = em_placement_lib::init_logging(&log) {
        eprintln!("{e}");
        process::exit(1);
    }

    let command = args.command.unwrap_or(Command::Simulate {
        keys: None,
        json: false,
    });
    if let Err(e) = run(command, loaded) {
        report(&TracingErrorReporter, e, "em_placement");
        process::exit(1);
    }
}

fn run(command: Command, loaded: ConfigResult<EngineConfig>) -> EngineResult<()> {
    match command {
        Command::Simulate { keys, json } => {
            let mut config = loaded?;
            if let Some(keys) = keys {
                config.simulation.keys = keys;
            }
            info!(
                num_slots = config.placement.num_slots,
                entries_per_row = config.placement.entries_per_row,
                max_moves = config.placement.max_moves,
                keys = config.simulation.keys,
                "Starting simulation"
            );

            let report = Simulator::new(config.placement, config.simulation)?.run()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Command::Validate => {
            info!("Validating configuration");
            loaded?;
            info!("Configuration validated successfully");
            Ok(())
        }
        Command::GenConfig { output } => {
            info!("Generating default configuration");

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let toml = toml::to_string_pretty(&EngineConfig::default())
                .map_err(|e| EngineError::Custom(format!("Failed to serialize config: {e}")))?;
            std::fs::write(&output, toml)?;

            info!("Default configuration written to {:?}", output);
            Ok(())
        }
    }
}

fn print_report(report: &SimulationReport) {
    println!("attempted      {}", report.attempted);
    println!("inserted       {}", report.inserted);
    println!("  direct       {}", report.direct_hits);
    println!("  displaced    {}", report.displaced);
    println!("relocations    {}", report.relocations);
    println!("longest chain  {}", report.longest_chain);
    println!("no space       {}", report.no_space);
    println!("aborted        {}", report.aborted);
    println!("load factor    {:.3}", report.load_factor);
}
