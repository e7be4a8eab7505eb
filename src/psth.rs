//! Peri-stimulus time histogram (PSTH), i.e., the trial-averaged firing rate around events.
use itertools::Itertools;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::PsthError;
use crate::trial::{Trial, Window};
use crate::{MAX_PSTH_BINS, MS_PER_SECOND};

/// Tolerance on the ratio between the window span and the bin size before rounding it up.
const BIN_TOL: f64 = 1e-9;

/// A firing rate curve sampled at the centers of fixed-width time bins.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PsthCurve {
    /// The bin centers relative to the event, in milliseconds.
    pub time_axis: Vec<f64>,
    /// The trial-averaged firing rate in each bin, in Hz.
    pub rate: Vec<f64>,
    /// The width of the bins, in milliseconds.
    pub bin_size: f64,
}

impl PsthCurve {
    pub fn num_bins(&self) -> usize {
        self.rate.len()
    }

    /// Iterate over `(bin center, rate)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time_axis
            .iter()
            .zip_eq(self.rate.iter())
            .map(|(t, r)| (*t, *r))
    }

    /// The mean number of spikes per trial over the whole window.
    pub fn mean_spike_count(&self) -> f64 {
        self.rate.iter().sum::<f64>() * self.bin_size / MS_PER_SECOND
    }

    /// The largest firing rate of the curve, if any.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.iter()
            .max_by(|(_, r1), (_, r2)| r1.total_cmp(r2))
    }
}

/// Check that the bin size is positive, finite and narrower than the window,
/// and that the window fits in at most [`MAX_PSTH_BINS`] bins.
pub fn validate_bin_size(bin_size: f64, window: &Window) -> Result<(), PsthError> {
    if !(bin_size.is_finite() && bin_size > 0.0) {
        return Err(PsthError::InvalidBinSize(format!(
            "bin size must be a positive number, got {}",
            bin_size
        )));
    }
    if window.span() <= bin_size {
        return Err(PsthError::InvalidBinSize(format!(
            "window end ({}) must be greater than window start ({}) + bin size ({})",
            window.post, window.pre, bin_size
        )));
    }
    if window.span() / bin_size > MAX_PSTH_BINS as f64 {
        return Err(PsthError::InvalidBinSize(format!(
            "bin size ({}) too small for a {}ms window, at most {} bins are supported",
            bin_size,
            window.span(),
            MAX_PSTH_BINS
        )));
    }
    Ok(())
}

/// The number of PSTH bins needed to cover the window, the last one possibly extending past its end.
pub fn num_psth_bins(window: &Window, bin_size: f64) -> usize {
    ((window.span() / bin_size - BIN_TOL).ceil() as usize).max(1)
}

/// The spike counts of every trial (rows) in every bin (columns).
/// Bins are half-open `[lower, upper)` except the last one which also includes its upper edge.
/// Spikes outside the window are ignored.
pub fn binned_counts(trials: &[Trial], window: &Window, bin_size: f64) -> DMatrix<u32> {
    let num_bins = num_psth_bins(window, bin_size);

    let mut counts = DMatrix::<u32>::zeros(trials.len(), num_bins);
    for (i, trial) in trials.iter().enumerate() {
        trial
            .aligned_times
            .iter()
            .filter(|t| window.contains(**t))
            .for_each(|t| {
                let k = (((t - window.pre) / bin_size).floor() as usize).min(num_bins - 1);
                counts[(i, k)] += 1;
            });
    }
    counts
}

/// Compute the PSTH of the trials, i.e., the mean spike count per bin across trials converted to Hz.
///
/// # Examples
///
/// ```rust
/// use approx::assert_relative_eq;
/// use rusty_psth::psth::compute_psth;
/// use rusty_psth::record::RawRecord;
/// use rusty_psth::trial::Trial;
///
/// let trials = vec![
///     Trial { event: RawRecord::new("stim", 0.0), aligned_times: vec![-5.0, 5.0, 6.0] },
///     Trial { event: RawRecord::new("stim", 100.0), aligned_times: vec![7.0] },
/// ];
/// let psth = compute_psth(&trials, -10.0, 10.0, 10.0).unwrap();
///
/// assert_eq!(psth.time_axis, vec![-5.0, 5.0]);
/// assert_relative_eq!(psth.rate[0], 50.0);
/// assert_relative_eq!(psth.rate[1], 150.0);
/// ```
pub fn compute_psth(
    trials: &[Trial],
    pre: f64,
    post: f64,
    bin_size: f64,
) -> Result<PsthCurve, PsthError> {
    let window = Window::build(pre, post)?;
    validate_bin_size(bin_size, &window)?;
    if trials.is_empty() {
        return Err(PsthError::NoTrials);
    }

    let counts = binned_counts(trials, &window, bin_size).map(|c| c as f64);
    let bin_seconds = bin_size / MS_PER_SECOND;
    let rate: Vec<f64> = counts
        .row_mean()
        .iter()
        .map(|mean_count| mean_count / bin_seconds)
        .collect();

    let time_axis: Vec<f64> = (0..rate.len())
        .map(|k| pre + k as f64 * bin_size + bin_size / 2.0)
        .collect();

    log::debug!(
        "PSTH computed over {} trials and {} bins of {}ms",
        trials.len(),
        rate.len(),
        bin_size
    );

    Ok(PsthCurve {
        time_axis,
        rate,
        bin_size,
    })
}
