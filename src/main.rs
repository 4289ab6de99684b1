//! `modgraph` CLI: lay out the graph of squares for one modulus and print the
//! renderer snapshot as JSON on stdout.  Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use modgraph::types::{InitialSpread, LayoutConfig, Strategy};
use modgraph::Layout;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Simplex,
    Gradient,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpreadArg {
    Modulus,
    Sqrt,
}

/// Graph of squares modulo m, laid out in three dimensions
#[derive(Parser, Debug)]
#[command(name = "modgraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lay out the graph of x -> x*x mod m in 3-D and print it as JSON")]
struct Cli {
    /// Modulus m (number of nodes)
    #[arg(allow_negative_numbers = true)]
    modulus: i64,

    /// JSON layout configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimisation method
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Seed for initial positions
    #[arg(long)]
    seed: Option<u64>,

    /// Side of the initial random cube
    #[arg(long, value_enum)]
    spread: Option<SpreadArg>,

    /// Iteration cap for the minimiser
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Also compute connected subgraphs
    #[arg(short, long)]
    partition: bool,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn layout_config(&self) -> Result<LayoutConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                LayoutConfig::from_json_str(&text)?
            }
            None => LayoutConfig::default(),
        };
        if let Some(s) = self.strategy {
            config.solver.strategy = match s {
                StrategyArg::Simplex => Strategy::Simplex,
                StrategyArg::Gradient => Strategy::Gradient,
            };
        }
        if let Some(s) = self.spread {
            config.spread = match s {
                SpreadArg::Modulus => InitialSpread::Modulus,
                SpreadArg::Sqrt => InitialSpread::SqrtModulus,
            };
        }
        if let Some(n) = self.max_iterations {
            config.solver.max_iterations = n;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.partition |= self.partition;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("warn,modgraph={default_level}"))
            .context("building log filter")?,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_filter(env_filter))
        .init();

    let config = cli.layout_config()?;
    let layout = Layout::compute(cli.modulus, &config)?;

    let snapshot = layout.snapshot();
    let json = if cli.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}
