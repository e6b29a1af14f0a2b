//! fast-psnr CLI - PSNR between a reference image and one or more candidates

use std::path::PathBuf;

use clap::Parser;
use fast_psnr::{Backend, PsnrOptions};

mod compare;

/// Compute PSNR between a reference image and candidate images (JPEG or PNG).
#[derive(Parser)]
#[command(name = "fast-psnr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Reference image
    reference: PathBuf,

    /// Candidate images compared against the reference
    #[arg(required = true)]
    candidates: Vec<PathBuf>,

    /// Print full reports as JSON
    #[arg(long)]
    json: bool,

    /// Force the scalar kernel instead of the detected SIMD backend
    #[arg(long, env = "FAST_PSNR_SCALAR")]
    scalar: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut options = PsnrOptions::default();
    if cli.scalar {
        options = options.with_backend(Backend::Scalar);
    }

    compare::run(&cli.reference, &cli.candidates, options, cli.json, cli.verbose)
}
