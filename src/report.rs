//! Reporting of diagnostics and summaries to the presentation layer.
//!
//! The analysis never depends on a reporter for its control flow: reporters only receive
//! what happened, e.g., skipped lines or the raster downsampling, to show it to the operator.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::parser::{LoadSummary, MalformedLine};

/// A non-fatal event worth showing to the operator.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A line of the event log was skipped.
    MalformedRecord(MalformedLine),
    /// An event log was loaded.
    Loaded(LoadSummary),
    /// The raster groups several milliseconds per column to fit the display.
    BinScale { span: f64, bin_scale: usize },
}

impl Diagnostic {
    /// A human-readable message for the diagnostic.
    pub fn message(&self) -> String {
        match self {
            Diagnostic::MalformedRecord(malformed) => {
                format!("{}, line skipped: {}", malformed.to_error(), malformed.line)
            }
            Diagnostic::Loaded(summary) => format!(
                "Loaded {} experiment events and {} neuron events ({} lines discarded)",
                summary.event_count,
                summary.neuron_event_count,
                summary.discarded_count()
            ),
            Diagnostic::BinScale { bin_scale, .. } => format!(
                "Time window too big to show all single spikes. Grouping spikes into {}ms bins for raster plot.",
                bin_scale
            ),
        }
    }
}

/// A sink for diagnostics, implemented by the presentation layer.
pub trait Reporter {
    /// Report a diagnostic.
    fn report(&self, diagnostic: &Diagnostic);
}

/// A reporter forwarding diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::MalformedRecord(_) => log::warn!("{}", diagnostic.message()),
            Diagnostic::Loaded(_) | Diagnostic::BinScale { .. } => {
                log::info!("{}", diagnostic.message())
            }
        }
    }
}

/// A reporter keeping every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drain the diagnostics reported so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic.clone());
    }
}

impl<R: Reporter + ?Sized> Reporter for std::rc::Rc<R> {
    fn report(&self, diagnostic: &Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// The files a renderer writes the raster and PSTH plots to.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExportPaths {
    pub raster: PathBuf,
    pub psth: PathBuf,
}

impl ExportPaths {
    /// The plot files for a base name in a directory, i.e., `{basename}_raster_plot.png` and `{basename}_psth.png`.
    pub fn new<P: AsRef<Path>>(dir: P, basename: &str) -> Self {
        let dir = dir.as_ref();
        ExportPaths {
            raster: dir.join(format!("{}_raster_plot.png", basename)),
            psth: dir.join(format!("{}_psth.png", basename)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MalformedReason;
    use std::rc::Rc;

    #[test]
    fn test_recording_reporter() {
        let reporter = Rc::new(RecordingReporter::new());
        let shared = Rc::clone(&reporter);

        shared.report(&Diagnostic::BinScale {
            span: 3000.0,
            bin_scale: 5,
        });
        assert_eq!(reporter.diagnostics().len(), 1);
        assert_eq!(reporter.take().len(), 1);
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_message() {
        let diagnostic = Diagnostic::MalformedRecord(MalformedLine {
            line_number: 3,
            line: "stim,abc".to_string(),
            reason: MalformedReason::InvalidTimestamp("abc".to_string()),
        });
        assert_eq!(
            diagnostic.message(),
            "Malformed record at line 3: invalid timestamp 'abc', line skipped: stim,abc"
        );

        let diagnostic = Diagnostic::BinScale {
            span: 10_000.0,
            bin_scale: 15,
        };
        assert!(diagnostic.message().contains("15ms bins"));
    }

    #[test]
    fn test_export_paths() {
        let paths = ExportPaths::new("/tmp/plots", "output");
        assert_eq!(paths.raster, PathBuf::from("/tmp/plots/output_raster_plot.png"));
        assert_eq!(paths.psth, PathBuf::from("/tmp/plots/output_psth.png"));
    }
}
