//! # transitscan-core
//!
//! Transit detection for stellar light curves, with optional Python
//! bindings via [PyO3](https://pyo3.rs).
//!
//! ## Overview
//!
//! A light curve is a series of brightness measurements of one star.  A
//! planet crossing the stellar disc shows up as a short, shallow dip that
//! repeats once per orbit.  This crate finds those dips and groups the ones
//! that recur at a consistent period into planet candidates:
//!
//! | Module         | Purpose                                                   |
//! |----------------|-----------------------------------------------------------|
//! | [`lightcurve`] | Time/flux arrays with gap-aware windowed statistics       |
//! | [`dips`]       | Multi-scale dip detector (parallel duration scan)         |
//! | [`planets`]    | Greedy period matcher and dip-ownership registry          |
//! | [`pipeline`]   | End-to-end search combining both stages                   |
//! | [`tbl`]        | Reads IPAC `.tbl` light-curve tables                      |
//! | [`report`]     | Tab-separated text report                                 |
//! | [`types`]      | Shared data structures (measurements, dips, planets, params) |
//!
//! ## Rust usage
//!
//! ```no_run
//! use transitscan_core::{LightCurveReader, Report, SearchParams, TransitSearch};
//!
//! let series = LightCurveReader::new().read("kplr010666592-2009131110544_slc.tbl")?;
//! let result = TransitSearch::new(SearchParams::default())?.run(&series);
//! print!("{}", Report::new(&result.dips, &result.planets));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Python usage
//!
//! Built with `--features python`, the library exposes a module called
//! `transitscan_core`:
//!
//! ```python
//! import transitscan_core
//!
//! time, flux = transitscan_core.LightCurveReader().read("kplr010666592.tbl")
//! engine = transitscan_core.TransitSearch(transitscan_core.SearchParams())
//! result = engine.search(time, flux)
//!
//! for planet in result.planets:
//!     print(planet)
//! ```

pub mod dips;
pub mod lightcurve;
pub mod pipeline;
pub mod planets;
pub mod report;
pub mod tbl;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use dips::{compress_runs, DipDetector, SearchError};
pub use lightcurve::{RangeStats, SeriesError, TimeSeries};
pub use pipeline::TransitSearch;
pub use planets::{ClaimRegistry, PeriodMatcher};
pub use report::{format_g6, Report};
pub use tbl::{LightCurveIO, LightCurveReader, TblError, TblReader};
pub use types::{AnalysisResult, Dip, Measurement, Planet, SearchParams, TimingMode};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The top-level Python module exposed by this crate.
///
/// Registered classes:
/// - `TransitSearch`: the two-stage search engine
/// - `LightCurveReader`: `.tbl` table reader
/// - `SearchParams`: search configuration
/// - `TimingMode`: period-matcher probe behaviour
/// - `AnalysisResult`: aggregated search output
/// - `Dip`: a single detected dimming event
/// - `Planet`: a periodic candidate
#[cfg(feature = "python")]
#[pymodule]
fn transitscan_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<TransitSearch>()?;
    m.add_class::<LightCurveReader>()?;
    m.add_class::<SearchParams>()?;
    m.add_class::<TimingMode>()?;
    m.add_class::<AnalysisResult>()?;
    m.add_class::<Dip>()?;
    m.add_class::<Planet>()?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Transit dip detection and period matching.")?;

    Ok(())
}
