use std::process::ExitCode;

use clap::Parser;
use fabrica_rql::parser::Parser as RqlParser;
use fabrica_rql::{RqlSettings, serialize};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Parses RQL queries and prints their canonical text and criteria tree.
#[derive(Parser, Debug)]
#[command(name = "rql", version)]
struct Args {
    /// Settings file, without extension; defaults to `rql`
    #[arg(long)]
    config: Option<String>,

    /// One or more RQL query strings
    #[arg(required = true)]
    queries: Vec<String>,
}

pub fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings = match args.config.as_deref().map_or_else(RqlSettings::load, RqlSettings::load_from) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "could not load settings");
            return ExitCode::FAILURE;
        }
    };
    let parser = RqlParser::new(&settings);

    let mut failed = false;
    for query in &args.queries {
        match parser.parse(query) {
            Ok(tree) => {
                info!(query = query.as_str(), predicates = tree.criteria().len(), "parsed");
                println!("{}", serialize(&tree));
                println!("{tree:#?}");
            }
            Err(e) => {
                eprintln!("{query}: {e} (status {})", e.status_code());
                failed = true;
            }
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
