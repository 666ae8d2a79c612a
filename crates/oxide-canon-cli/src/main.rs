//! oxide-canon CLI
//!
//! Command-line tool for normalizing and rendering SQL.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_canon::DatabaseEngine;
use oxide_canon_cli::{read_input, run, Action};

/// Canonical SQL for every engine.
#[derive(Parser)]
#[command(name = "oxide-canon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target dialect: sqlserver, mysql, oracle, postgres or sqlite.
    #[arg(short, long, env = "OXIDE_CANON_DIALECT", default_value = "sqlserver", value_parser = parse_engine)]
    dialect: DatabaseEngine,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Print JSON instead of plain text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of the input.
    Analyze {
        /// SQL file to read (stdin if not specified or `-`).
        input: Option<PathBuf>,
    },

    /// List the tables the input references.
    Tables {
        /// SQL file to read (stdin if not specified or `-`).
        input: Option<PathBuf>,
    },

    /// List the parameters the input binds.
    Params {
        /// SQL file to read (stdin if not specified or `-`).
        input: Option<PathBuf>,
    },

    /// Render the input for the target dialect.
    Format {
        /// SQL file to read (stdin if not specified or `-`).
        input: Option<PathBuf>,
    },
}

impl Commands {
    fn split(self) -> (Action, Option<PathBuf>) {
        match self {
            Self::Analyze { input } => (Action::Analyze, input),
            Self::Tables { input } => (Action::Tables, input),
            Self::Params { input } => (Action::Params, input),
            Self::Format { input } => (Action::Format, input),
        }
    }
}

fn parse_engine(value: &str) -> Result<DatabaseEngine, String> {
    value.parse().map_err(|e: oxide_canon::SqlError| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (action, input) = cli.command.split();
    debug!(?action, dialect = %cli.dialect, "running command");
    let sql = read_input(input.as_deref())?;
    let output = run(action, &sql, cli.dialect, cli.json)?;
    println!("{output}");

    Ok(())
}
