//! Common types shared across the transit-search pipeline.
//!
//! These structures represent the data objects of a light-curve transit
//! search: individual flux/time measurements (which may be missing), the
//! dips found by the detector, the periodic planet candidates built from
//! them, search configuration, and the aggregated result.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dips::SearchError;

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// A single time or flux reading.
///
/// Photometry tables contain gaps (the literal `null` in a `.tbl` file).
/// Keeping "missing" as its own variant instead of a NaN sentinel makes every
/// windowed statistic spell out what it does with a gap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    Present(f64),
    Missing,
}

impl Measurement {
    /// The reading, or `None` if it is missing.
    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Measurement::Present(v) => Some(v),
            Measurement::Missing => None,
        }
    }

    #[inline]
    pub fn is_missing(self) -> bool {
        matches!(self, Measurement::Missing)
    }
}

impl From<Option<f64>> for Measurement {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => Measurement::Present(v),
            None => Measurement::Missing,
        }
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Measurement::Present(value)
    }
}

// ---------------------------------------------------------------------------
// Dip
// ---------------------------------------------------------------------------

/// A localised dimming event found by [`crate::dips::DipDetector`].
///
/// A transiting planet blocks a small fraction of the star's light for a
/// few hours.  Each dip records when the dimming began, how long it lasted
/// and how deep it was relative to the surrounding baseline.  The `planet`
/// tag is filled in by [`crate::planets::PeriodMatcher`] once the dip has
/// been attributed to a periodic candidate.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dip {
    /// Time of the first affected sample, in days.
    pub start: f64,

    /// Time span from the first affected sample to the first unaffected
    /// one, in days.
    pub duration: f64,

    /// Fractional brightness drop relative to the local baseline.
    pub depth: f64,

    /// 1-based planet number, or 0 while the dip is unassigned.
    pub planet: u32,
}

impl Dip {
    pub fn new(start: f64, duration: f64, depth: f64) -> Self {
        Self {
            start,
            duration,
            depth,
            planet: 0,
        }
    }

    /// Mid-point of the dip.
    #[inline]
    pub fn center(&self) -> f64 {
        self.start + self.duration / 2.0
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Dip {
    #[new]
    #[pyo3(signature = (start, duration, depth, planet=0))]
    fn py_new(start: f64, duration: f64, depth: f64, planet: u32) -> Self {
        Self {
            start,
            duration,
            depth,
            planet,
        }
    }

    #[pyo3(name = "center")]
    fn py_center(&self) -> f64 {
        self.center()
    }

    #[pyo3(name = "end")]
    fn py_end(&self) -> f64 {
        self.end()
    }

    fn __repr__(&self) -> String {
        format!(
            "Dip(start={:.5} d, duration={:.3} h, depth={:.6}, planet={})",
            self.start,
            self.duration * 24.0,
            self.depth,
            self.planet,
        )
    }
}

// ---------------------------------------------------------------------------
// Planet
// ---------------------------------------------------------------------------

/// A periodic signal candidate assembled from recurring dips.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Time between consecutive transits, in days.
    pub period: f64,

    /// Transit duration in days, taken from the first dip of the candidate.
    pub duration: f64,

    /// Number of transits attributed to this candidate.  Under
    /// [`TimingMode::Legacy`] this is either 0 or at least 3.
    pub transits: u32,

    /// Transit depth, taken from the first dip of the candidate.
    pub depth: f64,
}

impl Planet {
    pub fn new(period: f64, duration: f64, transits: u32, depth: f64) -> Self {
        Self {
            period,
            duration,
            transits,
            depth,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Planet {
    fn __repr__(&self) -> String {
        format!(
            "Planet(period={:.5} d, duration={:.3} h, transits={}, depth={:.6})",
            self.period,
            self.duration * 24.0,
            self.transits,
            self.depth,
        )
    }
}

// ---------------------------------------------------------------------------
// SearchParams
// ---------------------------------------------------------------------------

/// How the period matcher extrapolates and counts follow-up transits.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingMode {
    /// Advance the probe by at most one period per candidate dip.  The
    /// transit counter starts at 3 on the first follow-up.  Matches the
    /// historical output.
    #[default]
    Legacy,
    /// Advance the probe until it catches up with the candidate dip and
    /// count every matched transit, including the seed pair.
    Corrected,
}

/// Configuration parameters for a transit search.
///
/// Durations are measured in samples, not days: the detector slides
/// windows over array indices.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Shortest dip window to try, in samples.
    pub min_duration: usize,

    /// Longest dip window to try, in samples (inclusive).
    pub max_duration: usize,

    /// Multiplier on a flanking window's flux range.  The dip window's
    /// brightest sample must sit more than this many flank ranges below
    /// the flank's faintest sample.
    pub min_dip_depth: f64,

    /// Number of rayon worker threads for the duration scan.  Set to 0 to
    /// use the global pool.
    pub n_workers: usize,

    /// Probe behaviour of the period matcher.
    pub timing_mode: TimingMode,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            min_duration: 3,
            max_duration: 48,
            min_dip_depth: 1.0,
            n_workers: 0,
            timing_mode: TimingMode::Legacy,
        }
    }
}

impl SearchParams {
    /// Reject parameter combinations the detector cannot scan.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.min_duration == 0 {
            return Err(SearchError::BadParams(
                "min_duration must be at least 1 sample".into(),
            ));
        }
        if self.min_duration > self.max_duration {
            return Err(SearchError::BadParams(format!(
                "min_duration ({}) exceeds max_duration ({})",
                self.min_duration, self.max_duration
            )));
        }
        if !self.min_dip_depth.is_finite() || self.min_dip_depth < 0.0 {
            return Err(SearchError::BadParams(format!(
                "min_dip_depth must be finite and non-negative, got {}",
                self.min_dip_depth
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl SearchParams {
    #[new]
    #[pyo3(signature = (min_duration=3, max_duration=48, min_dip_depth=1.0, n_workers=0, timing_mode=TimingMode::Legacy))]
    fn py_new(
        min_duration: usize,
        max_duration: usize,
        min_dip_depth: f64,
        n_workers: usize,
        timing_mode: TimingMode,
    ) -> Self {
        Self {
            min_duration,
            max_duration,
            min_dip_depth,
            n_workers,
            timing_mode,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SearchParams(durations={}..={} samples, min_dip_depth={:.2}, workers={}, timing={:?})",
            self.min_duration,
            self.max_duration,
            self.min_dip_depth,
            self.n_workers,
            self.timing_mode,
        )
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Aggregated output of one transit search run.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Dips in ascending start-time order, with their planet tags set.
    pub dips: Vec<Dip>,

    /// Planet candidates in discovery order (planet number = index + 1).
    pub planets: Vec<Planet>,

    /// Number of samples in the input series.
    pub samples: usize,

    /// Number of samples whose flux was missing.
    pub missing_samples: usize,

    /// Wall-clock time for the search, in milliseconds.
    pub processing_time_ms: u64,
}

impl AnalysisResult {
    /// Serialise the result to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl AnalysisResult {
    #[pyo3(name = "to_json")]
    fn py_to_json(&self) -> PyResult<String> {
        self.to_json()
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "AnalysisResult(dips={}, planets={}, samples={}, missing={}, time={}ms)",
            self.dips.len(),
            self.planets.len(),
            self.samples,
            self.missing_samples,
            self.processing_time_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dip_center_and_end_derive_from_start_and_duration() {
        let dip = Dip::new(10.0, 0.5, 0.01);
        assert_eq!(dip.center(), 10.25);
        assert_eq!(dip.end(), 10.5);
        assert_eq!(dip.planet, 0);
    }

    #[test]
    fn measurement_converts_from_option() {
        assert_eq!(Measurement::from(Some(2.5)), Measurement::Present(2.5));
        assert_eq!(Measurement::from(None), Measurement::Missing);
        assert_eq!(Measurement::Present(1.0).value(), Some(1.0));
        assert!(Measurement::Missing.is_missing());
    }

    #[test]
    fn default_params_match_historical_scan() {
        let params = SearchParams::default();
        assert_eq!(params.min_duration, 3);
        assert_eq!(params.max_duration, 48);
        assert_eq!(params.min_dip_depth, 1.0);
        assert_eq!(params.timing_mode, TimingMode::Legacy);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_duration_range() {
        let zero = SearchParams {
            min_duration: 0,
            ..SearchParams::default()
        };
        assert!(matches!(zero.validate(), Err(SearchError::BadParams(_))));

        let inverted = SearchParams {
            min_duration: 10,
            max_duration: 5,
            ..SearchParams::default()
        };
        let msg = inverted.validate().unwrap_err().to_string();
        assert!(msg.contains("exceeds max_duration"));

        let nan_depth = SearchParams {
            min_dip_depth: f64::NAN,
            ..SearchParams::default()
        };
        assert!(nan_depth.validate().is_err());
    }

    #[test]
    fn result_serialises_to_json() {
        let result = AnalysisResult {
            dips: vec![Dip::new(1.0, 0.25, 0.02)],
            planets: vec![Planet::new(3.5, 0.25, 3, 0.02)],
            samples: 100,
            missing_samples: 4,
            processing_time_ms: 7,
        };
        let json = result.to_json().expect("serialisable");
        assert!(json.contains("\"planets\""));
        assert!(json.contains("\"transits\": 3"));
        let back: AnalysisResult = serde_json::from_str(&json).expect("round trip");
        assert_eq!(back, result);
    }
}
