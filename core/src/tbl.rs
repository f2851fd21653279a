//! Readers for light-curve tables.
//!
//! Kepler and K2 light curves distributed by the NASA Exoplanet Archive come
//! as IPAC `.tbl` text files: a block of `\keyword = value` header lines and
//! `|column|column|` descriptor lines, followed by whitespace-aligned data
//! rows.  The time stamp lives in the first column and the flux in the ninth.
//!
//! This module provides a [`LightCurveIO`] trait with a text-table backend
//! ([`TblReader`]).  [`LightCurveReader`] picks the backend from the file
//! extension.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::lightcurve::{SeriesError, TimeSeries};
use crate::types::Measurement;

/// Column holding the observation time.
const TIME_COLUMN: usize = 0;

/// Column holding the flux.
const FLUX_COLUMN: usize = 8;

/// Rows with fewer fields than this are ignored.
const MIN_FIELDS: usize = 9;

/// Token that marks a missing reading.
const NULL_TOKEN: &str = "null";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while reading a light-curve table.
#[derive(Debug, thiserror::Error)]
pub enum TblError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("line {line}, column {column}: cannot parse {token:?} as a number")]
    Parse {
        line: usize,
        column: usize,
        token: String,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstract interface for loading a light curve from a file.
pub trait LightCurveIO {
    fn read(&self, path: &str) -> Result<TimeSeries, TblError>;
}

// ---------------------------------------------------------------------------
// IPAC .tbl reader
// ---------------------------------------------------------------------------

/// Reader for whitespace-aligned text tables.
///
/// Empty lines and lines starting with `\` or `|` are skipped.  Every other
/// line is trimmed of spaces and split on runs of spaces; rows with at least
/// nine fields contribute one sample.
pub struct TblReader;

impl TblReader {
    /// Parse a table from any buffered source.
    pub fn parse<R: BufRead>(reader: R) -> Result<TimeSeries, TblError> {
        let mut time = Vec::new();
        let mut flux = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() || line.starts_with('\\') || line.starts_with('|') {
                continue;
            }

            let fields: Vec<&str> = line
                .trim_matches(' ')
                .split(' ')
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() < MIN_FIELDS {
                continue;
            }

            time.push(Self::parse_field(fields[TIME_COLUMN], idx + 1, TIME_COLUMN)?);
            flux.push(Self::parse_field(fields[FLUX_COLUMN], idx + 1, FLUX_COLUMN)?);
        }

        Ok(TimeSeries::new(time, flux)?)
    }

    fn parse_field(token: &str, line: usize, column: usize) -> Result<Measurement, TblError> {
        if token == NULL_TOKEN {
            return Ok(Measurement::Missing);
        }
        token
            .parse::<f64>()
            .map(Measurement::Present)
            .map_err(|_| TblError::Parse {
                line,
                column,
                token: token.to_string(),
            })
    }
}

impl LightCurveIO for TblReader {
    fn read(&self, path: &str) -> Result<TimeSeries, TblError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }
}

// ---------------------------------------------------------------------------
// High-level reader with format auto-detection
// ---------------------------------------------------------------------------

/// Auto-detecting light-curve reader.
///
/// `.tbl`, `.txt`, `.dat` and extension-less files go to [`TblReader`].
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Default)]
pub struct LightCurveReader;

impl LightCurveReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a light curve, choosing the backend from the extension.
    pub fn read(&self, path: &str) -> Result<TimeSeries, TblError> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "tbl" | "txt" | "dat" | "" => TblReader.read(path),
            other => Err(TblError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl LightCurveReader {
    #[new]
    fn py_new() -> Self {
        Self
    }

    /// Read a table and return `(time, flux)` lists, `None` marking gaps.
    #[pyo3(name = "read")]
    fn py_read(&self, path: &str) -> PyResult<(Vec<Option<f64>>, Vec<Option<f64>>)> {
        let series = self
            .read(path)
            .map_err(|e| pyo3::exceptions::PyIOError::new_err(e.to_string()))?;
        let time = series.time().iter().map(|m| m.value()).collect();
        let flux = series.flux().iter().map(|m| m.value()).collect();
        Ok((time, flux))
    }

    fn __repr__(&self) -> String {
        "LightCurveReader()".to_string()
    }
}
