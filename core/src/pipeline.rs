//! End-to-end transit search: dip detection followed by period matching.

use std::time::Instant;

use log::info;
#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::dips::{DipDetector, SearchError};
use crate::lightcurve::TimeSeries;
use crate::planets::PeriodMatcher;
use crate::types::{AnalysisResult, SearchParams};

/// The transit search engine.
///
/// Construct with [`SearchParams`] and call [`TransitSearch::run`] on a
/// [`TimeSeries`] to obtain an [`AnalysisResult`].
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug)]
pub struct TransitSearch {
    detector: DipDetector,
    matcher: PeriodMatcher,
}

impl TransitSearch {
    pub fn new(params: SearchParams) -> Result<Self, SearchError> {
        let matcher = PeriodMatcher::new(params.timing_mode);
        let detector = DipDetector::new(params)?;
        Ok(Self { detector, matcher })
    }

    pub fn params(&self) -> &SearchParams {
        self.detector.params()
    }

    /// Run both stages over `series`.
    pub fn run(&self, series: &TimeSeries) -> AnalysisResult {
        let start = Instant::now();
        let missing = series.missing_flux();

        info!(
            "Starting transit search: {} samples ({} missing flux)",
            series.len(),
            missing,
        );

        // ------------------------------------------------------------------
        // Stage 1: multi-scale dip detection
        // ------------------------------------------------------------------
        let mut dips = self.detector.detect(series);
        info!("Detected {} dips", dips.len());

        // ------------------------------------------------------------------
        // Stage 2: greedy period matching (tags written back onto the dips)
        // ------------------------------------------------------------------
        let planets = self.matcher.assign(&mut dips);

        let elapsed = start.elapsed().as_millis() as u64;
        info!(
            "Search complete in {} ms: {} dips, {} planets",
            elapsed,
            dips.len(),
            planets.len(),
        );

        AnalysisResult {
            dips,
            planets,
            samples: series.len(),
            missing_samples: missing,
            processing_time_ms: elapsed,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl TransitSearch {
    #[new]
    #[pyo3(signature = (params=None))]
    fn py_new(params: Option<SearchParams>) -> PyResult<Self> {
        Self::new(params.unwrap_or_default())
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    /// Run the search on parallel `time` / `flux` lists, `None` marking gaps.
    #[pyo3(name = "search")]
    fn py_search(&self, time: Vec<Option<f64>>, flux: Vec<Option<f64>>) -> PyResult<AnalysisResult> {
        let series = TimeSeries::from_options(time, flux)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
        Ok(self.run(&series))
    }

    fn __repr__(&self) -> String {
        format!("TransitSearch({:?})", self.params())
    }
}
