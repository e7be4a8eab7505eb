//! Analysis session, i.e., the state shared by the successive analysis stages.
//!
//! A session goes through the stages `Empty → Loaded → Trialized → Binned`.
//! Each stage keeps the outputs of the previous ones, so that a PSTH can be recomputed with
//! another bin size without trializing again, or a new window applied without reloading the log.
//! Any upstream change discards every downstream result:
//! - loading a log discards the trials, the raster and the PSTH;
//! - changing the window discards the trials, the raster and the PSTH;
//! - changing the bin size discards the PSTH.
//!
//! # Examples
//!
//! ```rust
//! use rusty_psth::session::{AnalysisSession, SessionState};
//!
//! let mut session = AnalysisSession::new();
//! let summary = session.load_lines(["stim,1.000", "_ch1,1.002", "_ch1,0.998", "stim,2.000"]);
//! assert_eq!(summary.event_count, 2);
//! assert_eq!(summary.neuron_event_count, 2);
//!
//! session.configure_window(-10.0, 10.0).unwrap();
//! session.configure_bin_size(5.0).unwrap();
//!
//! let trialization = session.run_trialization().unwrap();
//! assert_eq!(trialization.trials.len(), 2);
//!
//! let psth = session.run_psth().unwrap();
//! assert_eq!(psth.num_bins(), 4);
//! assert_eq!(session.state(), SessionState::Binned);
//! ```
use derivative::Derivative;
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::error::PsthError;
use crate::parser::{self, EventLog, LoadSummary};
use crate::psth::{compute_psth, validate_bin_size, PsthCurve};
use crate::raster::RasterMatrix;
use crate::report::{Diagnostic, LogReporter, Reporter};
use crate::trial::{trialize, Trial, Trialization, Window};

/// The stage reached by a session.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SessionState {
    /// No event log loaded.
    Empty,
    /// An event log is loaded.
    Loaded,
    /// The spikes are aligned to the events and the raster is built.
    Trialized,
    /// The PSTH is computed.
    Binned,
}

#[derive(Debug)]
enum Stage {
    Empty,
    Loaded(EventLog),
    Trialized(EventLog, Trialization),
    Binned(EventLog, Trialization, PsthCurve),
}

impl Stage {
    fn state(&self) -> SessionState {
        match self {
            Stage::Empty => SessionState::Empty,
            Stage::Loaded(..) => SessionState::Loaded,
            Stage::Trialized(..) => SessionState::Trialized,
            Stage::Binned(..) => SessionState::Binned,
        }
    }

    fn event_log(&self) -> Option<&EventLog> {
        match self {
            Stage::Empty => None,
            Stage::Loaded(event_log)
            | Stage::Trialized(event_log, _)
            | Stage::Binned(event_log, _, _) => Some(event_log),
        }
    }

    fn trialization(&self) -> Option<&Trialization> {
        match self {
            Stage::Trialized(_, trialization) | Stage::Binned(_, trialization, _) => {
                Some(trialization)
            }
            _ => None,
        }
    }

    fn psth(&self) -> Option<&PsthCurve> {
        match self {
            Stage::Binned(_, _, psth) => Some(psth),
            _ => None,
        }
    }

    /// Go back to the `Loaded` stage, dropping the trials and the PSTH.
    fn into_loaded(self) -> Stage {
        match self {
            Stage::Trialized(event_log, _) | Stage::Binned(event_log, _, _) => {
                Stage::Loaded(event_log)
            }
            stage => stage,
        }
    }

    /// Go back to the `Trialized` stage, dropping the PSTH.
    fn into_trialized(self) -> Stage {
        match self {
            Stage::Binned(event_log, trialization, _) => {
                Stage::Trialized(event_log, trialization)
            }
            stage => stage,
        }
    }
}

/// A single-operator analysis session over one event log at a time.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct AnalysisSession {
    stage: Stage,
    window: Option<Window>,
    bin_size: Option<f64>,
    #[derivative(Debug = "ignore")]
    reporter: Box<dyn Reporter>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    /// Create an empty session reporting its diagnostics to the `log` facade.
    pub fn new() -> Self {
        Self::with_reporter(LogReporter)
    }

    /// Create an empty session reporting its diagnostics to the given reporter.
    pub fn with_reporter<R: Reporter + 'static>(reporter: R) -> Self {
        AnalysisSession {
            stage: Stage::Empty,
            window: None,
            bin_size: None,
            reporter: Box::new(reporter),
        }
    }

    /// The stage reached by the session.
    pub fn state(&self) -> SessionState {
        self.stage.state()
    }

    /// Load an event log file, replacing the current one and discarding every result.
    /// On failure, the session is left untouched.
    pub fn load_events<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadSummary, PsthError> {
        let event_log = parser::load_from(path)?;
        Ok(self.install(event_log))
    }

    /// Load an event log from its lines, replacing the current one and discarding every result.
    pub fn load_lines<I, S>(&mut self, lines: I) -> LoadSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.install(parser::parse_lines(lines))
    }

    fn install(&mut self, event_log: EventLog) -> LoadSummary {
        for malformed in event_log.malformed.iter() {
            self.reporter
                .report(&Diagnostic::MalformedRecord(malformed.clone()));
        }

        let summary = event_log.summary.clone();
        self.reporter.report(&Diagnostic::Loaded(summary.clone()));
        self.stage = Stage::Loaded(event_log);
        summary
    }

    /// Set the analysis window, in milliseconds relative to the events.
    /// A new window discards the trials, the raster and the PSTH.
    /// Returns an error, leaving the session untouched, if the window is invalid or too narrow for the bin size.
    pub fn configure_window(&mut self, pre: f64, post: f64) -> Result<(), PsthError> {
        let window = Window::build(pre, post)?;
        if let Some(bin_size) = self.bin_size {
            validate_bin_size(bin_size, &window)?;
        }

        if self.window != Some(window) {
            self.window = Some(window);
            self.downgrade(Stage::into_loaded);
        }
        Ok(())
    }

    /// Set the PSTH bin size, in milliseconds.
    /// A new bin size discards the PSTH.
    /// Returns an error, leaving the session untouched, if the bin size is not positive or not narrower than the window.
    pub fn configure_bin_size(&mut self, bin_size: f64) -> Result<(), PsthError> {
        match self.window {
            Some(window) => validate_bin_size(bin_size, &window)?,
            None if !(bin_size.is_finite() && bin_size > 0.0) => {
                return Err(PsthError::InvalidBinSize(format!(
                    "bin size must be a positive number, got {}",
                    bin_size
                )))
            }
            None => {}
        }

        if self.bin_size != Some(bin_size) {
            self.bin_size = Some(bin_size);
            self.downgrade(Stage::into_trialized);
        }
        Ok(())
    }

    /// Set both the window and the bin size at once.
    /// Nothing is changed if the configuration is invalid.
    pub fn configure(&mut self, config: &AnalysisConfig) -> Result<(), PsthError> {
        let window = config.validate()?;

        if self.window != Some(window) {
            self.window = Some(window);
            self.downgrade(Stage::into_loaded);
        }
        if self.bin_size != Some(config.bin_size_ms) {
            self.bin_size = Some(config.bin_size_ms);
            self.downgrade(Stage::into_trialized);
        }
        Ok(())
    }

    fn downgrade(&mut self, transition: fn(Stage) -> Stage) {
        let stage = std::mem::replace(&mut self.stage, Stage::Empty);
        self.stage = transition(stage);
    }

    /// Align the neuron spikes to the events of the loaded log and build the raster.
    /// Requires a loaded log with at least one experiment event and one neuron event, and a configured window.
    /// Any previous PSTH is discarded.
    pub fn run_trialization(&mut self) -> Result<&Trialization, PsthError> {
        let event_log = self.stage.event_log().ok_or_else(|| {
            PsthError::InvalidOperation("an event log must be loaded before trialization".to_string())
        })?;
        let window = self.window.ok_or_else(|| {
            PsthError::InvalidOperation("the window must be configured before trialization".to_string())
        })?;
        if event_log.events.is_empty() {
            return Err(PsthError::EmptyEventSet);
        }
        if event_log.neuron_events.is_empty() {
            return Err(PsthError::NoNeuronEvents);
        }

        let trialization = trialize(
            &event_log.events,
            &event_log.neuron_events,
            window.pre,
            window.post,
        )?;
        if trialization.bin_scale() > 1 {
            self.reporter.report(&Diagnostic::BinScale {
                span: window.span(),
                bin_scale: trialization.bin_scale(),
            });
        }

        self.stage = match std::mem::replace(&mut self.stage, Stage::Empty) {
            Stage::Loaded(event_log)
            | Stage::Trialized(event_log, _)
            | Stage::Binned(event_log, _, _) => Stage::Trialized(event_log, trialization),
            Stage::Empty => Stage::Empty,
        };

        self.stage.trialization().ok_or_else(|| {
            PsthError::InvalidOperation("trialization was discarded".to_string())
        })
    }

    /// Compute the PSTH of the current trials.
    /// Requires a prior trialization and a configured bin size.
    pub fn run_psth(&mut self) -> Result<&PsthCurve, PsthError> {
        let trialization = self.stage.trialization().ok_or_else(|| {
            PsthError::InvalidOperation("trialization must be run before the PSTH".to_string())
        })?;
        let bin_size = self.bin_size.ok_or_else(|| {
            PsthError::InvalidOperation("the bin size must be configured before the PSTH".to_string())
        })?;

        let psth = compute_psth(
            &trialization.trials,
            trialization.window.pre,
            trialization.window.post,
            bin_size,
        )?;

        self.stage = match std::mem::replace(&mut self.stage, Stage::Empty) {
            Stage::Trialized(event_log, trialization)
            | Stage::Binned(event_log, trialization, _) => {
                Stage::Binned(event_log, trialization, psth)
            }
            stage => stage,
        };

        self.stage.psth().ok_or_else(|| {
            PsthError::InvalidOperation("PSTH was discarded".to_string())
        })
    }

    /// The loaded event log, if any.
    pub fn event_log(&self) -> Option<&EventLog> {
        self.stage.event_log()
    }

    /// The counts of the loaded event log, if any.
    pub fn summary(&self) -> Option<&LoadSummary> {
        self.stage.event_log().map(|event_log| &event_log.summary)
    }

    /// The current trialization, if any.
    pub fn trialization(&self) -> Option<&Trialization> {
        self.stage.trialization()
    }

    pub fn trials(&self) -> Option<&[Trial]> {
        self.stage
            .trialization()
            .map(|trialization| &trialization.trials[..])
    }

    pub fn raster(&self) -> Option<&RasterMatrix> {
        self.stage
            .trialization()
            .map(|trialization| &trialization.raster)
    }

    /// The current PSTH, if any.
    pub fn psth(&self) -> Option<&PsthCurve> {
        self.stage.psth()
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    pub fn bin_size(&self) -> Option<f64> {
        self.bin_size
    }
}
