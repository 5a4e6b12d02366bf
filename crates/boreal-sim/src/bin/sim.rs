//! `boreal-sim` CLI entry point: wires trace loading, engine config, the
//! simulator, and table reporting together.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use boreal_backtest::{RunStore, SqliteRunStore, calculate_comparison, load_trace};
use boreal_core::Simulator;
use boreal_sim::cli::{Cli, Commands, TableFormatter};
use boreal_types::EngineConfig;

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(Path::new(path)).map_err(anyhow::Error::from),
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> Result<()> {
    boreal_shared::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let config = load_config(args.config.as_deref())?;
            let trace = load_trace(Path::new(&args.trace))?;
            let summary = Simulator::new(config).run(&trace);

            if let Some(store_path) = &args.store {
                let store = SqliteRunStore::open(store_path)?;
                store.save_run(&args.label, &summary)?;
            }

            println!("{}", TableFormatter::format_summary(&summary));
        }

        Commands::Compare(args) => {
            let trace = load_trace(Path::new(&args.trace))?;
            let config_a = load_config(args.config_a.as_deref())?;
            let config_b = load_config(args.config_b.as_deref())?;

            let summary_a = Simulator::new(config_a).run(&trace);
            let summary_b = Simulator::new(config_b).run(&trace);

            let diff = calculate_comparison(&summary_a, &summary_b);
            println!("{}", TableFormatter::format_comparison(&diff));
        }

        Commands::Batch(args) => {
            let config = load_config(args.config.as_deref())?;
            let store = args.store.as_deref().map(SqliteRunStore::open).transpose()?;

            let entries = std::fs::read_dir(&args.trace_dir)
                .with_context(|| format!("reading trace directory {}", args.trace_dir))?;

            for entry in entries {
                let path: PathBuf = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                    continue;
                }
                let label = path.file_stem().and_then(|s| s.to_str()).unwrap_or("run").to_string();
                let trace = load_trace(&path)?;
                let summary = Simulator::new(config.clone()).run(&trace);

                if let Some(store) = &store {
                    store.save_run(&label, &summary)?;
                }

                println!("== {label} ==");
                println!("{}", TableFormatter::format_summary(&summary));
            }
        }
    }

    Ok(())
}
