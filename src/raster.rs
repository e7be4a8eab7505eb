//! Raster matrix of spike counts per trial and per time column.
use nalgebra::DMatrix;

use crate::trial::{Trial, Window};

/// A trial-by-time matrix of spike counts.
///
/// Each column covers `bin_scale` milliseconds of the window, starting at its lower bound.
/// The number of columns only depends on the window and the bin scale, never on the spikes.
#[derive(Debug, PartialEq, Clone)]
pub struct RasterMatrix {
    counts: DMatrix<u32>,
    window: Window,
    bin_scale: usize,
}

impl RasterMatrix {
    /// Build the raster of the trials for the given window and bin scale (in ms per column).
    /// Spikes landing past the last column, e.g., exactly at the window end, are assigned to the last column.
    pub fn build(trials: &[Trial], window: &Window, bin_scale: usize) -> Self {
        let bin_scale = bin_scale.max(1);
        let num_bins = ((window.span() / bin_scale as f64).floor() as usize).max(1);
        let mut counts = DMatrix::<u32>::zeros(trials.len(), num_bins);

        for (i, trial) in trials.iter().enumerate() {
            for time in trial.aligned_times.iter() {
                let j = column_index(*time, window.pre, bin_scale, num_bins);
                counts[(i, j)] = counts[(i, j)].saturating_add(1);
            }
        }

        RasterMatrix {
            counts,
            window: *window,
            bin_scale,
        }
    }

    /// The number of rows, i.e., one per trial.
    pub fn num_trials(&self) -> usize {
        self.counts.nrows()
    }

    /// The number of time columns.
    pub fn num_bins(&self) -> usize {
        self.counts.ncols()
    }

    /// The number of milliseconds per column.
    pub fn bin_scale(&self) -> usize {
        self.bin_scale
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The spike count of a given trial and column, if it exists.
    pub fn get(&self, trial: usize, bin: usize) -> Option<u32> {
        self.counts.get((trial, bin)).copied()
    }

    /// The underlying count matrix.
    pub fn counts(&self) -> &DMatrix<u32> {
        &self.counts
    }

    /// The total number of spikes of a trial.
    pub fn row_sum(&self, trial: usize) -> u32 {
        self.counts.row(trial).iter().sum()
    }

    /// The total number of spikes in the raster.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// The rows of the raster, one vector of counts per trial.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.counts
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    /// The inverted grayscale intensities used for display: 0.0 where a column holds a spike, 1.0 elsewhere.
    pub fn inverted(&self) -> DMatrix<f64> {
        self.counts.map(|count| 1.0 - count.min(1) as f64)
    }

    /// The plot extent `(left, right, bottom, top)`, i.e., the window along time and the trials along the vertical axis.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        (
            self.window.pre,
            self.window.post,
            0.0,
            self.num_trials() as f64,
        )
    }
}

/// The column of a relative spike time, clamped to the valid columns.
fn column_index(time: f64, pre: f64, bin_scale: usize, num_bins: usize) -> usize {
    let j = ((time - pre) / bin_scale as f64).floor().max(0.0) as usize;
    j.min(num_bins - 1)
}
