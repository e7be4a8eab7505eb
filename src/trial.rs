//! Trialization, i.e., alignment of neuron spikes to each experiment event.
use serde::{Deserialize, Serialize};

use crate::error::PsthError;
use crate::raster::RasterMatrix;
use crate::record::{EventRecord, NeuronSpikeRecord};
use crate::{MAX_PIXELS, MAX_WINDOW_SPAN_MS};

/// An analysis window relative to an event, in milliseconds.
/// Both ends are inclusive.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Window {
    /// The start of the window, e.g., -500 for half a second before the event.
    pub pre: f64,
    /// The end of the window, e.g., 2500 for two and a half seconds after the event.
    pub post: f64,
}

impl Window {
    /// Create a new window with the specified bounds.
    /// Returns an error if the bounds are not finite, if the end is not after the start
    /// or if the window is wider than [`MAX_WINDOW_SPAN_MS`].
    pub fn build(pre: f64, post: f64) -> Result<Self, PsthError> {
        if !(pre.is_finite() && post.is_finite()) {
            return Err(PsthError::InvalidWindow(format!(
                "window bounds must be finite, got [{}, {}]",
                pre, post
            )));
        }
        if post <= pre {
            return Err(PsthError::InvalidWindow(format!(
                "window end ({}) must be greater than window start ({})",
                post, pre
            )));
        }
        if post - pre > MAX_WINDOW_SPAN_MS {
            return Err(PsthError::InvalidWindow(format!(
                "window span ({}ms) exceeds the maximum of {}ms",
                post - pre,
                MAX_WINDOW_SPAN_MS
            )));
        }
        Ok(Window { pre, post })
    }

    /// The duration of the window.
    pub fn span(&self) -> f64 {
        self.post - self.pre
    }

    /// Returns true if the (relative) time lies in the window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.pre && time <= self.post
    }
}

/// The spikes aligned to one occurrence of an experiment event.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Trial {
    /// The event the spikes are aligned to.
    pub event: EventRecord,
    /// The spike times relative to the event, in the order of the neuron events.
    pub aligned_times: Vec<f64>,
}

impl Trial {
    pub fn num_spikes(&self) -> usize {
        self.aligned_times.len()
    }
}

/// The outcome of a trialization: one trial per event and the raster built from them.
#[derive(Debug, PartialEq, Clone)]
pub struct Trialization {
    pub window: Window,
    pub trials: Vec<Trial>,
    pub raster: RasterMatrix,
}

impl Trialization {
    /// The number of milliseconds merged into one raster column.
    pub fn bin_scale(&self) -> usize {
        self.raster.bin_scale()
    }
}

/// Returns the number of milliseconds per raster column for a window span.
/// Spans wider than [`MAX_PIXELS`] are downsampled so the raster stays within that many columns.
pub fn bin_scale(span: f64) -> usize {
    if span > MAX_PIXELS as f64 {
        (span / MAX_PIXELS as f64).ceil() as usize
    } else {
        1
    }
}

/// Align the neuron spikes to every event `t`, keeping those with `pre <= s - t <= post`.
/// The neuron events are pooled, i.e., the channel they come from is not taken into account.
/// Trials follow the order of `events`, and spikes within a trial follow the order of `neuron_events`.
pub fn align(
    events: &[EventRecord],
    neuron_events: &[NeuronSpikeRecord],
    window: &Window,
) -> Vec<Trial> {
    events
        .iter()
        .map(|event| {
            // The window is checked on the aligned times so that they always lie in it
            let aligned_times = neuron_events
                .iter()
                .map(|spike| spike.time - event.time)
                .filter(|time| window.contains(*time))
                .collect();
            Trial {
                event: event.clone(),
                aligned_times,
            }
        })
        .collect()
}

/// Align the neuron spikes to every event and build the raster matrix of the resulting trials.
///
/// # Examples
///
/// ```rust
/// use rusty_psth::record::RawRecord;
/// use rusty_psth::trial::trialize;
///
/// let events = vec![RawRecord::new("stim", 1000.0)];
/// let neuron_events = vec![RawRecord::new("_ch1", 1002.0), RawRecord::new("_ch1", 998.0)];
///
/// let trialization = trialize(&events, &neuron_events, -10.0, 10.0).unwrap();
/// assert_eq!(trialization.trials[0].aligned_times, vec![2.0, -2.0]);
/// assert_eq!(trialization.raster.num_trials(), 1);
/// assert_eq!(trialization.raster.num_bins(), 20);
/// ```
pub fn trialize(
    events: &[EventRecord],
    neuron_events: &[NeuronSpikeRecord],
    pre: f64,
    post: f64,
) -> Result<Trialization, PsthError> {
    let window = Window::build(pre, post)?;
    if events.is_empty() {
        return Err(PsthError::EmptyEventSet);
    }

    let trials = align(events, neuron_events, &window);

    let scale = bin_scale(window.span());
    if scale > 1 {
        log::debug!(
            "Window span of {}ms exceeds {} columns, raster grouped into {}ms bins",
            window.span(),
            MAX_PIXELS,
            scale
        );
    }
    let raster = RasterMatrix::build(&trials, &window, scale);

    log::debug!(
        "{} trials built with {} aligned spikes in total",
        trials.len(),
        trials.iter().map(Trial::num_spikes).sum::<usize>()
    );

    Ok(Trialization {
        window,
        trials,
        raster,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;
    use approx::assert_abs_diff_eq;

    fn scenario() -> (Vec<RawRecord>, Vec<RawRecord>) {
        (
            vec![RawRecord::new("stim", 1000.0)],
            vec![
                RawRecord::new("_ch1", 1.002 * 1000.0),
                RawRecord::new("_ch1", 0.998 * 1000.0),
            ],
        )
    }

    #[test]
    fn test_window_build() {
        assert!(Window::build(-10.0, 10.0).is_ok());
        assert!(matches!(
            Window::build(10.0, 10.0),
            Err(PsthError::InvalidWindow(_))
        ));
        assert!(matches!(
            Window::build(10.0, -10.0),
            Err(PsthError::InvalidWindow(_))
        ));
        assert!(matches!(
            Window::build(f64::NEG_INFINITY, 10.0),
            Err(PsthError::InvalidWindow(_))
        ));
        assert!(matches!(
            Window::build(0.0, f64::NAN),
            Err(PsthError::InvalidWindow(_))
        ));
        assert!(matches!(
            Window::build(-1e300, 1e300),
            Err(PsthError::InvalidWindow(_))
        ));
        assert!(Window::build(0.0, MAX_WINDOW_SPAN_MS).is_ok());
    }

    #[test]
    fn test_window_contains() {
        let window = Window::build(-1.0, 1.0).unwrap();
        assert!(window.contains(-1.0));
        assert!(window.contains(0.0));
        assert!(window.contains(1.0));
        assert!(!window.contains(1.5));
        assert!(!window.contains(-1.5));
    }

    #[test]
    fn test_bin_scale() {
        assert_eq!(bin_scale(20.0), 1);
        assert_eq!(bin_scale(700.0), 1);
        assert_eq!(bin_scale(701.0), 2);
        assert_eq!(bin_scale(1400.0), 2);
        assert_eq!(bin_scale(3000.0), 5);
        assert_eq!(bin_scale(10_000.0), 15);
    }

    #[test]
    fn test_trialize_spikes_in_window() {
        let (events, neuron_events) = scenario();
        let trialization = trialize(&events, &neuron_events, -10.0, 10.0).unwrap();

        assert_eq!(trialization.trials.len(), 1);
        assert_eq!(trialization.trials[0].event.name, "stim");

        let aligned = &trialization.trials[0].aligned_times;
        assert_eq!(aligned.len(), 2);
        assert_abs_diff_eq!(aligned[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(aligned[1], -2.0, epsilon = 1e-9);
        assert!(aligned.iter().all(|t| trialization.window.contains(*t)));
    }

    #[test]
    fn test_trialize_spikes_out_of_window() {
        let (events, neuron_events) = scenario();
        let trialization = trialize(&events, &neuron_events, -1.0, 1.0).unwrap();

        assert_eq!(trialization.trials.len(), 1);
        assert!(trialization.trials[0].aligned_times.is_empty());
        assert_eq!(trialization.raster.row_sum(0), 0);
    }

    #[test]
    fn test_trialize_inclusive_bounds() {
        let events = vec![RawRecord::new("stim", 100.0)];
        let neuron_events = vec![
            RawRecord::new("_ch1", 90.0),
            RawRecord::new("_ch1", 110.0),
            RawRecord::new("_ch1", 89.5),
            RawRecord::new("_ch1", 110.5),
        ];
        let trialization = trialize(&events, &neuron_events, -10.0, 10.0).unwrap();
        assert_eq!(trialization.trials[0].aligned_times, vec![-10.0, 10.0]);
        assert_eq!(trialization.raster.row_sum(0), 2);
    }

    #[test]
    fn test_trialize_keeps_event_order() {
        let events = vec![
            RawRecord::new("b", 500.0),
            RawRecord::new("a", 100.0),
            RawRecord::new("b", 300.0),
        ];
        let neuron_events = vec![RawRecord::new("_ch1", 105.0), RawRecord::new("_ch2", 499.0)];
        let trialization = trialize(&events, &neuron_events, -20.0, 20.0).unwrap();

        let names: Vec<&str> = trialization
            .trials
            .iter()
            .map(|trial| trial.event.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a", "b"]);
        assert_eq!(trialization.trials[0].aligned_times, vec![-1.0]);
        assert_eq!(trialization.trials[1].aligned_times, vec![5.0]);
        assert!(trialization.trials[2].aligned_times.is_empty());
    }

    #[test]
    fn test_trialize_overlapping_trials_share_spikes() {
        let events = vec![RawRecord::new("stim", 100.0), RawRecord::new("stim", 110.0)];
        let neuron_events = vec![RawRecord::new("_ch1", 105.0)];
        let trialization = trialize(&events, &neuron_events, -10.0, 10.0).unwrap();
        assert_eq!(trialization.trials[0].aligned_times, vec![5.0]);
        assert_eq!(trialization.trials[1].aligned_times, vec![-5.0]);
    }

    #[test]
    fn test_trialize_rounding_at_window_start() {
        // 1.0009s - 1.001s rounds to slightly less than -0.1ms
        let events = vec![RawRecord::new("stim", 1.001 * 1000.0)];
        let neuron_events = vec![RawRecord::new("_ch1", 1.0009 * 1000.0)];
        let trialization = trialize(&events, &neuron_events, -0.1, 10.0).unwrap();

        let aligned = &trialization.trials[0].aligned_times;
        assert!(aligned.iter().all(|t| trialization.window.contains(*t)));
        assert_eq!(trialization.raster.row_sum(0) as usize, aligned.len());
    }

    #[test]
    fn test_trialize_errors() {
        let (events, neuron_events) = scenario();
        assert!(matches!(
            trialize(&events, &neuron_events, 10.0, 10.0),
            Err(PsthError::InvalidWindow(_))
        ));
        assert!(matches!(
            trialize(&events, &neuron_events, 10.0, -10.0),
            Err(PsthError::InvalidWindow(_))
        ));
        assert_eq!(
            trialize(&[], &neuron_events, -10.0, 10.0),
            Err(PsthError::EmptyEventSet)
        );
    }

    #[test]
    fn test_trialize_without_neuron_events() {
        let (events, _) = scenario();
        let trialization = trialize(&events, &[], -10.0, 10.0).unwrap();
        assert!(trialization.trials[0].aligned_times.is_empty());
        assert_eq!(trialization.raster.num_trials(), 1);
        assert_eq!(trialization.raster.total(), 0);
    }

    #[test]
    fn test_trialize_large_window_downsamples() {
        let (events, neuron_events) = scenario();
        let trialization = trialize(&events, &neuron_events, -5000.0, 5000.0).unwrap();
        assert_eq!(trialization.bin_scale(), 15);
        assert_eq!(trialization.raster.num_bins(), 666);
        assert_eq!(trialization.raster.row_sum(0), 2);
    }
}
