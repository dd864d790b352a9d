use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;

use statement_rollup::{
    Dimension, Engine, SchemaRegistry, csv_writer::CSVSink, discover_statements,
};

const DEFAULT_LOG_FILTER: &str = "info";

/// Totals spend and credit across credit-card statement exports.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding the .csv statement exports
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Dimensions to aggregate by, all of them when omitted
    #[arg(short, long, value_enum)]
    dimension: Vec<Dimension>,

    /// Print the normalized transactions instead of totals
    #[arg(long)]
    records: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_FILTER)).init();
    let args = Args::parse();

    let dimensions = if args.dimension.is_empty() {
        Dimension::ALL.to_vec()
    } else {
        args.dimension
    };

    let registry = SchemaRegistry::builtin();
    let mut engine = Engine::new(&registry, CSVSink::stdout());

    if args.records {
        let paths = discover_statements(&args.directory)?;
        let records = engine.load(&paths)?;
        engine.dump(&records)?;
    } else {
        engine.run(&args.directory, &dimensions)?;
    }

    Ok(())
}
