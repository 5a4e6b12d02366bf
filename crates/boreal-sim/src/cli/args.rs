//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boreal-sim")]
#[command(author, version, about = "Trace-driven battery dispatch simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the simulator once over a trace and print a summary.
    Run(RunArgs),

    /// Run two configurations over the same trace and report the diff.
    Compare(CompareArgs),

    /// Run the simulator over every trace in a directory.
    Batch(BatchArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// CSV trace file (timestamp, consumption_kwh, spot_price, solar_kwh).
    #[arg(long, value_name = "PATH")]
    pub trace: String,

    /// Engine configuration TOML file. Defaults to the reference household.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Persist the run under this label in the SQLite run store.
    #[arg(long, value_name = "PATH")]
    pub store: Option<String>,

    #[arg(long, default_value = "run")]
    pub label: String,
}

#[derive(Parser)]
pub struct CompareArgs {
    #[arg(long, value_name = "PATH")]
    pub trace: String,

    /// Baseline configuration.
    #[arg(long, value_name = "PATH")]
    pub config_a: Option<String>,

    /// Candidate configuration compared against the baseline.
    #[arg(long, value_name = "PATH")]
    pub config_b: Option<String>,
}

#[derive(Parser)]
pub struct BatchArgs {
    /// Directory of CSV trace files.
    #[arg(long, value_name = "DIR")]
    pub trace_dir: String,

    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    #[arg(long, value_name = "PATH")]
    pub store: Option<String>,
}
