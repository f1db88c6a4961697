//! Command-line front end for the synthetic market generators
//!
//! Run with: cargo run --release -- generate --model heston --times 24 --time-frame 1h

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use synthetic_market::heston::heston_model_levels_batch;
use synthetic_market::{
    generate, get_correlated_geometric_brownian_motions, sample_correlation, BarFrame, CorrelationMatrix,
    ModelParameters, PriceModel, SimulatorConfig, TimeFrame, VarianceScheme,
};

#[derive(Debug, Parser)]
#[command(name = "synthetic-market", version, about = "Generate synthetic OHLCV market data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an OHLCV series with a Heston, GBM or Merton price path
    Generate(GenerateArgs),
    /// Simulate a correlated Brownian basket and report its sample correlations
    Basket(BasketArgs),
    /// Simulate independent Heston paths in parallel and summarize them
    Paths(PathsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Configuration file; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_parser = parse_model)]
    model: Option<PriceModel>,
    #[arg(long)]
    base_price: Option<f64>,
    #[arg(long)]
    base_volume: Option<f64>,
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    date_format: Option<String>,
    /// Number of bars to generate
    #[arg(long)]
    times: Option<usize>,
    /// Bar duration, e.g. 1min, 15min, 1h, 1d
    #[arg(long)]
    time_frame: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    /// Floor negative variance at zero instead of failing
    #[arg(long)]
    truncate_variance: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
    /// Write to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct BasketArgs {
    #[arg(long, default_value_t = 3)]
    assets: usize,
    /// Pairwise correlation of an equicorrelated matrix
    #[arg(long, default_value_t = 0.5)]
    rho: f64,
    /// Explicit correlation matrix as JSON rows, e.g. '[[1,0.3],[0.3,1]]'
    #[arg(long)]
    matrix: Option<String>,
    #[arg(long, default_value_t = 10_000)]
    steps: usize,
    #[arg(long, default_value = "1d")]
    time_frame: String,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Args)]
struct PathsArgs {
    #[arg(long, default_value_t = 100)]
    paths: usize,
    #[arg(long, default_value_t = 1_440)]
    steps: usize,
    #[arg(long, default_value = "1h")]
    time_frame: String,
    #[arg(long, default_value_t = 100.0)]
    base_price: f64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    truncate_variance: bool,
}

fn parse_model(value: &str) -> Result<PriceModel, String> {
    value.parse().map_err(|e: synthetic_market::SimulationError| e.to_string())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Basket(args) => run_basket(args),
        Command::Paths(args) => run_paths(args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,synthetic_market=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn seeded_rng(seed: Option<u64>) -> (u64, StdRng) {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    (seed, StdRng::seed_from_u64(seed))
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulatorConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulatorConfig::load().context("failed to load config from environment")?,
    };

    let request = &mut config.request;
    if let Some(v) = args.base_price {
        request.base_price = v;
    }
    if let Some(v) = args.base_volume {
        request.base_volume = v;
    }
    if let Some(v) = args.start_date {
        request.start_date = v;
    }
    if let Some(v) = args.date_format {
        request.start_date_format = v;
    }
    if let Some(v) = args.times {
        request.times_to_generate = v;
    }
    if let Some(v) = args.time_frame {
        request.time_frame = v;
    }
    let model = args.model.unwrap_or(config.model);
    let scheme = if args.truncate_variance {
        Some(VarianceScheme::Truncated)
    } else {
        config.variance_scheme
    };

    if let Some(scheme) = scheme {
        let params = match request.params.take() {
            Some(params) => params,
            None => {
                let time_frame: TimeFrame = request.time_frame.parse()?;
                ModelParameters::default_for(
                    request.base_price,
                    time_frame.scale_times_to_generate(request.times_to_generate)?,
                    time_frame.delta(),
                )
            }
        };
        request.params = Some(params.with_variance_scheme(scheme));
    }

    let (seed, mut rng) = seeded_rng(args.seed.or(config.seed));
    info!(%model, seed, "starting generation");

    let frame = generate(model, &config.request, &mut rng).context("simulation failed")?;

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            write_frame(&frame, args.format, file)
        }
        None => write_frame(&frame, args.format, io::stdout().lock()),
    }
}

fn write_frame<W: Write>(frame: &BarFrame, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, frame)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for bar in &frame.bars {
                writer.serialize(bar)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct BasketReport {
    seed: u64,
    assets: usize,
    steps: usize,
    sample_correlation: Vec<Vec<f64>>,
}

fn run_basket(args: BasketArgs) -> Result<()> {
    let matrix = match &args.matrix {
        Some(json) => {
            let rows: Vec<Vec<f64>> = serde_json::from_str(json).context("matrix must be JSON rows")?;
            CorrelationMatrix::from_rows(&rows)?
        }
        None => CorrelationMatrix::equicorrelated(args.assets, args.rho),
    };
    let assets = matrix.dim();
    let time_frame: TimeFrame = args.time_frame.parse()?;
    let params = ModelParameters::default_for(1.0, args.steps, time_frame.delta());

    let (seed, mut rng) = seeded_rng(args.seed);
    let paths = get_correlated_geometric_brownian_motions(&params, &matrix, assets, &mut rng)?;

    let sample: Vec<Vec<f64>> = paths
        .iter()
        .map(|a| paths.iter().map(|b| sample_correlation(a, b)).collect())
        .collect();
    let report = BasketReport {
        seed,
        assets,
        steps: args.steps,
        sample_correlation: sample,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct PathsReport {
    seed: u64,
    paths: usize,
    steps: usize,
    mean_final_price: f64,
    min_final_price: f64,
    max_final_price: f64,
    mean_final_variance: f64,
}

fn run_paths(args: PathsArgs) -> Result<()> {
    anyhow::ensure!(args.paths > 0, "--paths must be at least 1");
    let time_frame: TimeFrame = args.time_frame.parse()?;
    let mut params = ModelParameters::default_for(args.base_price, args.steps, time_frame.delta());
    if args.truncate_variance {
        params = params.with_variance_scheme(VarianceScheme::Truncated);
    }

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let results = heston_model_levels_batch(&params, args.paths, seed)?;

    let finals: Vec<f64> = results.iter().filter_map(|p| p.prices.last().copied()).collect();
    let variances: Vec<f64> = results.iter().filter_map(|p| p.variances.last().copied()).collect();
    let n = finals.len() as f64;

    let report = PathsReport {
        seed,
        paths: args.paths,
        steps: args.steps,
        mean_final_price: finals.iter().sum::<f64>() / n,
        min_final_price: finals.iter().copied().fold(f64::INFINITY, f64::min),
        max_final_price: finals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean_final_variance: variances.iter().sum::<f64>() / n,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
