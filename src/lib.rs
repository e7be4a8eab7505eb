//! This crate provides tools for analyzing neural spikes recorded around experimental events in Rust.
//!
//! An event log lists named, timestamped records: experiment events (e.g., a stimulus onset)
//! and neuron spikes (records named `_ch...`). The spikes are aligned to every occurrence of
//! an event (a trial), from which two standard views are derived: a raster, i.e., the spike counts
//! per trial over time, and a peri-stimulus time histogram (PSTH), i.e., the firing rate averaged
//! over trials.
//!
//! # Loading Events
//!
//! ```rust
//! use rusty_psth::parser::parse_lines;
//!
//! let log = parse_lines(["# recording 1", "stim,1.000", "_ch1,1.002", "_ch1,0.998", "stim,abc"]);
//!
//! // Timestamps are converted from seconds to milliseconds
//! assert_eq!(log.events[0].time, 1000.0);
//! assert_eq!(log.summary.event_count, 1);
//! assert_eq!(log.summary.neuron_event_count, 2);
//! assert_eq!(log.summary.malformed_count, 1);
//! ```
//!
//! # Trialization and Raster
//!
//! ```rust
//! use rusty_psth::parser::parse_lines;
//! use rusty_psth::trial::trialize;
//!
//! let log = parse_lines(["stim,1.0", "_ch1,1.002", "stim,2.0", "_ch1,2.5"]);
//!
//! // Align the spikes in a window from 500ms before to 2500ms after each event
//! let trialization = trialize(&log.events, &log.neuron_events, -500.0, 2500.0).unwrap();
//! assert_eq!(trialization.trials.len(), 2);
//!
//! // A 3000ms window does not fit in 700 columns: each column covers 5ms
//! assert_eq!(trialization.raster.bin_scale(), 5);
//! assert_eq!(trialization.raster.num_bins(), 600);
//! ```
//!
//! # PSTH
//!
//! ```rust
//! use rusty_psth::config::AnalysisConfig;
//! use rusty_psth::session::AnalysisSession;
//!
//! let mut session = AnalysisSession::new();
//! session.load_lines(["stim,1.0", "_ch1,1.002", "stim,2.0", "_ch1,2.5"]);
//! session.configure(&AnalysisConfig::new(-500.0, 2500.0, 50.0)).unwrap();
//! session.run_trialization().unwrap();
//!
//! let psth = session.run_psth().unwrap();
//! assert_eq!(psth.num_bins(), 60);
//! assert_eq!(psth.time_axis[0], -475.0);
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod psth;
pub mod raster;
pub mod record;
pub mod report;
pub mod session;
pub mod trial;

/// The maximum number of raster columns, beyond which several milliseconds share a column.
pub const MAX_PIXELS: usize = 700;
/// The widest supported analysis window, in milliseconds (one day).
pub const MAX_WINDOW_SPAN_MS: f64 = 86_400_000.0;
/// The maximum number of PSTH bins.
pub const MAX_PSTH_BINS: usize = 1_000_000;
/// The name prefix of neuron spike records, followed by the channel name.
pub const NEURON_PREFIX: &str = "_ch";
/// The name prefix of reserved records.
pub const RESERVED_PREFIX: &str = "_";
/// The number of milliseconds in a second.
pub const MS_PER_SECOND: f64 = 1000.0;
