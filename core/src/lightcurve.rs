//! In-memory light curve with gap-aware windowed statistics.
//!
//! A light curve is a pair of equal-length arrays: observation times and
//! measured flux.  Either may contain gaps.  The detector only ever asks
//! two questions of a window of samples: "what are the faintest and
//! brightest readings?" and, for diagnostics, "what is the mean?"  Both
//! skip missing readings, and both accept index ranges that hang off
//! either end of the series.

use ndarray::{s, Array1, ArrayView1};

use crate::types::Measurement;

/// Errors raised while assembling a [`TimeSeries`].
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    #[error("time and flux arrays differ in length ({time} vs {flux})")]
    LengthMismatch { time: usize, flux: usize },
}

// ---------------------------------------------------------------------------
// RangeStats
// ---------------------------------------------------------------------------

/// Minimum and maximum flux over a window, plus how many readings fed them.
///
/// A window with no present readings reports `count == 0` and the
/// `(+inf, -inf)` extremes of [`RangeStats::EMPTY`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeStats {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl RangeStats {
    pub const EMPTY: RangeStats = RangeStats {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        count: 0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `max - min`.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.max + self.min) / 2.0
    }

    #[inline]
    fn include(mut self, value: f64) -> Self {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.count += 1;
        self
    }
}

// ---------------------------------------------------------------------------
// TimeSeries
// ---------------------------------------------------------------------------

/// Immutable (time, flux) sample arrays.
///
/// Times are assumed non-decreasing; this is not checked.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    time: Array1<Measurement>,
    flux: Array1<Measurement>,
}

impl TimeSeries {
    pub fn new(time: Vec<Measurement>, flux: Vec<Measurement>) -> Result<Self, SeriesError> {
        if time.len() != flux.len() {
            return Err(SeriesError::LengthMismatch {
                time: time.len(),
                flux: flux.len(),
            });
        }
        Ok(Self {
            time: Array1::from(time),
            flux: Array1::from(flux),
        })
    }

    /// Build a series from optional readings, `None` marking a gap.
    pub fn from_options(time: Vec<Option<f64>>, flux: Vec<Option<f64>>) -> Result<Self, SeriesError> {
        Self::new(
            time.into_iter().map(Measurement::from).collect(),
            flux.into_iter().map(Measurement::from).collect(),
        )
    }

    /// Build a fully-populated series.
    pub fn from_values(time: &[f64], flux: &[f64]) -> Result<Self, SeriesError> {
        Self::new(
            time.iter().copied().map(Measurement::from).collect(),
            flux.iter().copied().map(Measurement::from).collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    pub fn time(&self) -> ArrayView1<'_, Measurement> {
        self.time.view()
    }

    pub fn flux(&self) -> ArrayView1<'_, Measurement> {
        self.flux.view()
    }

    /// Number of samples whose flux reading is missing.
    pub fn missing_flux(&self) -> usize {
        self.flux.iter().filter(|m| m.is_missing()).count()
    }

    /// Clip a signed `[lo, hi)` range to valid indices.
    fn clip(&self, lo: isize, hi: isize) -> Option<(usize, usize)> {
        let lo = lo.max(0) as usize;
        let hi = hi.clamp(0, self.len() as isize) as usize;
        (lo < hi).then_some((lo, hi))
    }

    /// Faintest and brightest present flux in `[lo, hi)`.
    ///
    /// Indices outside the series are ignored; a window with nothing
    /// present returns [`RangeStats::EMPTY`].
    pub fn range_stats(&self, lo: isize, hi: isize) -> RangeStats {
        let Some((lo, hi)) = self.clip(lo, hi) else {
            return RangeStats::EMPTY;
        };
        self.flux
            .slice(s![lo..hi])
            .iter()
            .filter_map(|m| m.value())
            .fold(RangeStats::EMPTY, RangeStats::include)
    }

    /// Mean of the present flux in `[lo, hi)`; NaN when nothing is present.
    pub fn average(&self, lo: isize, hi: isize) -> f64 {
        let Some((lo, hi)) = self.clip(lo, hi) else {
            return f64::NAN;
        };
        let (sum, count) = self
            .flux
            .slice(s![lo..hi])
            .iter()
            .filter_map(|m| m.value())
            .fold((0.0_f64, 0_usize), |(sum, n), v| (sum + v, n + 1));
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Measurement::{Missing, Present};

    fn series(flux: Vec<Measurement>) -> TimeSeries {
        let time = (0..flux.len()).map(|i| Present(i as f64)).collect();
        TimeSeries::new(time, flux).expect("equal lengths")
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = TimeSeries::from_values(&[0.0, 1.0], &[1.0]).unwrap_err();
        assert!(matches!(err, SeriesError::LengthMismatch { time: 2, flux: 1 }));
    }

    #[test]
    fn range_stats_skips_missing_samples() {
        let ts = series(vec![Present(3.0), Missing, Present(1.0), Present(2.0)]);
        let stats = ts.range_stats(0, 4);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.span(), 2.0);
    }

    #[test]
    fn all_missing_window_is_empty() {
        let ts = series(vec![Present(1.0), Missing, Missing, Present(1.0)]);
        let stats = ts.range_stats(1, 3);
        assert!(stats.is_empty());
        assert_eq!(stats, RangeStats::EMPTY);
    }

    #[test]
    fn out_of_bounds_ranges_are_clipped() {
        let ts = series(vec![Present(5.0), Present(4.0), Present(6.0)]);
        let stats = ts.range_stats(-4, 2);
        assert_eq!((stats.min, stats.max, stats.count), (4.0, 5.0, 2));

        let tail = ts.range_stats(2, 100);
        assert_eq!((tail.min, tail.max, tail.count), (6.0, 6.0, 1));

        assert!(ts.range_stats(-6, -3).is_empty());
        assert!(ts.range_stats(3, 9).is_empty());
        assert!(ts.range_stats(2, 1).is_empty());
    }

    #[test]
    fn average_ignores_gaps_and_is_nan_when_empty() {
        let ts = series(vec![Present(1.0), Missing, Present(3.0)]);
        assert_eq!(ts.average(0, 3), 2.0);
        assert!(ts.average(1, 2).is_nan());
        assert!(ts.average(10, 20).is_nan());
    }

    #[test]
    fn missing_flux_counts_gaps() {
        let ts = series(vec![Missing, Present(1.0), Missing]);
        assert_eq!(ts.missing_flux(), 2);
        assert_eq!(ts.len(), 3);
        assert!(!ts.is_empty());
    }
}
