/// lowpass: read one variable from a safetensors dataset, remove variability
/// faster than `--period` months with a zero-phase Butterworth filter, and
/// write the variable plus its coordinates to a new dataset.
///
/// Log level follows RUST_LOG (default: info).
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use climlpf::{run, LowpassConfig};

#[derive(Parser, Debug)]
#[command(name = "lowpass", about = "Zero-phase low-pass filter for monthly gridded data")]
struct Args {
    /// Input dataset (safetensors).
    #[arg(long, default_value = "tmp.safetensors")]
    input: PathBuf,

    /// Output dataset path.
    #[arg(long, default_value = "tmp2.safetensors")]
    output: PathBuf,

    /// Variable to filter.
    #[arg(long = "var", default_value = "aa")]
    variable: String,

    /// Cutoff period in months (must be > 2).
    #[arg(long, default_value_t = 120.0)]
    period: f64,

    /// Name of the time dimension.
    #[arg(long, default_value = "time")]
    time_dim: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = LowpassConfig {
        period_months: args.period,
        time_dim: args.time_dim,
    };
    run(&args.input, &args.output, &args.variable, &cfg)
}
