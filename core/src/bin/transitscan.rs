//! Transit search command-line tool.
//!
//! Reads one IPAC `.tbl` light curve, runs the dip detector and period
//! matcher with default parameters, and prints the dip and planet tables.
//!
//! Usage: transitscan <Kepler .tbl file>
//!
//! Set `RUST_LOG=info` for progress on stderr.

use std::env;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use transitscan_core::{LightCurveReader, Report, SearchParams, TransitSearch};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 1 {
        println!("Usage: transitscan <Kepler .tbl file>");
        return Ok(());
    }
    let path = &args[0];

    let series = LightCurveReader::new()
        .read(path)
        .with_context(|| format!("failed to load light curve from {path}"))?;

    let result = TransitSearch::new(SearchParams::default())
        .context("invalid search parameters")?
        .run(&series);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write!(out, "{}", Report::new(&result.dips, &result.planets))?;
    out.flush()?;

    Ok(())
}
