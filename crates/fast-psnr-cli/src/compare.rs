//! Compare command.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use fast_psnr::{DecodedImage, PsnrCalculator, PsnrOptions, PsnrReport};
use rayon::prelude::*;
use serde::Serialize;

#[derive(Serialize)]
struct CandidateReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    report: PsnrReport,
}

pub fn run(
    reference: &Path,
    candidates: &[PathBuf],
    options: PsnrOptions,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let calc = PsnrCalculator::with_options(options);

    if verbose {
        eprintln!("Loading reference: {}", reference.display());
        eprintln!("Backend: {}", calc.options().backend);
    }
    let reference_image = load(&calc, reference)?;

    let start = Instant::now();
    let results: Vec<Result<PsnrReport>> = candidates
        .par_iter()
        .map(|path| {
            let candidate = load(&calc, path)?;
            calc.compare(&reference_image, &candidate)
                .with_context(|| format!("comparing {} with {}", reference.display(), path.display()))
        })
        .collect();

    if verbose {
        eprintln!(
            "Compared {} candidate(s) in {:.1} ms",
            candidates.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    let mut ok = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for (path, result) in candidates.iter().zip(results) {
        match result {
            Ok(report) => ok.push(CandidateReport { path, report }),
            Err(e) => {
                failures += 1;
                eprintln!("Error: {:#}", e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&ok)?);
    } else if candidates.len() == 1 {
        if let Some(c) = ok.first() {
            println!("PSNR: {:.2} dB", c.report.psnr);
        }
    } else {
        for c in &ok {
            println!("{}: {:.2} dB", c.path.display(), c.report.psnr);
        }
    }

    if failures > 0 {
        bail!("{} of {} comparison(s) failed", failures, candidates.len());
    }
    Ok(())
}

fn load(calc: &PsnrCalculator, path: &Path) -> Result<DecodedImage> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    calc.decode(&data)
        .with_context(|| format!("decoding {}", path.display()))
}
