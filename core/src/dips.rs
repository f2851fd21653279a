//! Multi-scale dip detector: the first stage of the transit search.
//!
//! # Background
//!
//! When a planet crosses the face of its star, the observed flux drops for
//! a few hours and then recovers.  Rather than fitting a transit model, the
//! detector asks a purely local question at every sample and every
//! candidate duration: is the brightest point inside this window clearly
//! fainter than the faintest point of the stretches just before and just
//! after it?
//!
//! # Algorithm overview
//!
//! For each duration `d` from `min_duration` to `max_duration` samples and
//! each start index `i`, three windows are compared:
//!
//! ```text
//!   before            dip               after
//!   [i-2d, i-d)       [i, i+d)          [i+2d, i+3d)
//! ```
//!
//! The window fires when all three contain data and
//! `dip.max < flank.min - k * (flank.max - flank.min)` holds for both
//! flanks.  A fired window writes its normalised depth
//! `(baseline - dip.min) / baseline` into every sample it covers, where the
//! baseline is the mean of the two flank mid-ranges.
//!
//! Writes are applied in ascending duration, then ascending start index, so
//! the value left at a sample comes from the last window to cover it.  The
//! per-duration scans are independent reads of the series and run on
//! **rayon**; only the application of their results is serial.
//!
//! Finally, each maximal run of non-zero depth becomes one [`Dip`].

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use ndarray::{s, Array1, ArrayView1};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::lightcurve::TimeSeries;
use crate::types::{Dip, Measurement, SearchParams};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during a dip search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search parameters invalid: {0}")]
    BadParams(String),

    #[error("could not build worker pool: {0}")]
    ThreadPool(String),
}

/// A window that passed the flank test: its start index and depth.
type Fire = (usize, f64);

// ---------------------------------------------------------------------------
// DipDetector
// ---------------------------------------------------------------------------

/// Scans a [`TimeSeries`] at every configured window duration and reports
/// the dips it finds.
///
/// With `n_workers > 0` the detector owns a dedicated rayon pool, built once
/// here and shared by clones; otherwise scans run on the global pool.
#[derive(Clone, Debug)]
pub struct DipDetector {
    params: SearchParams,
    pool: Option<Arc<ThreadPool>>,
}

impl DipDetector {
    pub fn new(params: SearchParams) -> Result<Self, SearchError> {
        params.validate()?;
        let pool = if params.n_workers > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(params.n_workers)
                .build()
                .map_err(|e| SearchError::ThreadPool(e.to_string()))?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Self { params, pool })
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Detect dips in `series`.
    ///
    /// Dips come back in ascending start-time order with `planet == 0`.
    pub fn detect(&self, series: &TimeSeries) -> Vec<Dip> {
        let depths = self.depth_profile(series);
        let dips = compress_runs(series.time(), depths.view());
        debug!("Compressed depth profile into {} dips", dips.len());
        dips
    }

    /// Build the per-sample depth profile: 0 where nothing fired, otherwise
    /// the depth of the last window that covered the sample.
    pub fn depth_profile(&self, series: &TimeSeries) -> Array1<f64> {
        let start = Instant::now();
        let n = series.len();
        let durations: Vec<usize> = (self.params.min_duration..=self.params.max_duration).collect();

        info!(
            "Scanning {} samples at {} durations ({}..={} samples, k={:.2})",
            n,
            durations.len(),
            self.params.min_duration,
            self.params.max_duration,
            self.params.min_dip_depth,
        );

        // Each duration's windows are independent reads; collect() keeps
        // them in duration order for the serial merge below.
        let scan = || -> Vec<Vec<Fire>> {
            durations
                .par_iter()
                .map(|&duration| self.scan_duration(series, duration))
                .collect()
        };
        let fires = match &self.pool {
            Some(pool) => pool.install(scan),
            None => scan(),
        };

        // Later windows overwrite earlier ones, whatever their depth.
        let mut depths = Array1::<f64>::zeros(n);
        let mut fired = 0usize;
        for (&duration, windows) in durations.iter().zip(&fires) {
            for &(i, depth) in windows {
                let end = (i + duration).min(n);
                depths.slice_mut(s![i..end]).fill(depth);
            }
            fired += windows.len();
        }

        info!(
            "Duration scan complete in {} ms: {} windows fired",
            start.elapsed().as_millis(),
            fired,
        );
        depths
    }

    /// Every window of length `duration` that passes the flank test, in
    /// ascending start order.
    fn scan_duration(&self, series: &TimeSeries, duration: usize) -> Vec<Fire> {
        (0..series.len())
            .filter_map(|i| {
                flank_test(series, i, duration, self.params.min_dip_depth).map(|depth| (i, depth))
            })
            .collect()
    }
}

/// Compare the dip window starting at `i` against its two flanks.
///
/// Returns the normalised depth if the window fires.
fn flank_test(series: &TimeSeries, i: usize, duration: usize, k: f64) -> Option<f64> {
    let i = i as isize;
    let d = duration as isize;

    let before = series.range_stats(i - 2 * d, i - d);
    let after = series.range_stats(i + 2 * d, i + 3 * d);
    let dip = series.range_stats(i, i + d);

    if dip.is_empty() || before.is_empty() || after.is_empty() {
        return None;
    }
    if dip.max < before.min - k * before.span() && dip.max < after.min - k * after.span() {
        let baseline = (before.midpoint() + after.midpoint()) / 2.0;
        Some((baseline - dip.min) / baseline)
    } else {
        None
    }
}

/// Collapse a depth profile into dips.
///
/// Each maximal run of non-zero entries `[run_start, run_end)` becomes a dip
/// starting at `time[run_start]` and lasting `time[run_end] - time[run_start]`,
/// carrying the depth found at `run_end - 1`.  A run that reaches the end of
/// the profile is closed at the last sample instead.  Missing times yield a
/// start or duration of 0.
pub fn compress_runs(time: ArrayView1<'_, Measurement>, depths: ArrayView1<'_, f64>) -> Vec<Dip> {
    let mut dips = Vec::new();
    let mut last_depth = 0.0;
    let mut run_start = 0usize;

    for (i, &depth) in depths.iter().enumerate() {
        if depth != 0.0 {
            if last_depth == 0.0 {
                run_start = i;
            }
        } else if last_depth != 0.0 {
            dips.push(make_dip(time, run_start, i, last_depth));
        }
        last_depth = depth;
    }

    if last_depth != 0.0 {
        dips.push(make_dip(time, run_start, depths.len() - 1, last_depth));
    }

    dips
}

fn make_dip(time: ArrayView1<'_, Measurement>, from: usize, to: usize, depth: f64) -> Dip {
    let start = time.get(from).and_then(|m| m.value());
    let end = time.get(to).and_then(|m| m.value());
    let duration = match (start, end) {
        (Some(s), Some(e)) => e - s,
        _ => 0.0,
    };
    Dip::new(start.unwrap_or(0.0), duration, depth)
}
