//! Error module for the Rusty PSTH library.
use std::error::Error;
use std::fmt;

use crate::parser::MalformedReason;

/// Error types for the library.
#[derive(Debug, PartialEq, Clone)]
pub enum PsthError {
    /// Error for I/O operations, e.g., the event log cannot be read.
    IOError(String),
    /// A line of the event log could not be turned into a record.
    /// Never returned by a load: malformed lines are skipped and reported.
    MalformedRecord {
        line_number: usize,
        reason: MalformedReason,
    },
    /// Error for an invalid analysis window, e.g., the window end is not after its start.
    InvalidWindow(String),
    /// Error for an invalid PSTH bin size, e.g., non-positive or wider than the window.
    InvalidBinSize(String),
    /// No experiment event to align spikes to.
    EmptyEventSet,
    /// No trial to aggregate into a PSTH.
    NoTrials,
    /// No neuron event in the loaded log.
    NoNeuronEvents,
    /// Error for an operation called out of order, e.g., binning before trialization.
    InvalidOperation(String),
    /// Error for an unusable configuration file.
    InvalidConfig(String),
}

impl fmt::Display for PsthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PsthError::IOError(e) => write!(f, "I/O error: {}", e),
            PsthError::MalformedRecord {
                line_number,
                reason,
            } => write!(f, "Malformed record at line {}: {}", line_number, reason),
            PsthError::InvalidWindow(e) => write!(f, "Invalid window: {}", e),
            PsthError::InvalidBinSize(e) => write!(f, "Invalid bin size: {}", e),
            PsthError::EmptyEventSet => {
                write!(f, "No experiment event found, please load another event file")
            }
            PsthError::NoTrials => write!(f, "No trial to aggregate"),
            PsthError::NoNeuronEvents => {
                write!(f, "No neuron event found, please load a file with spike events")
            }
            PsthError::InvalidOperation(e) => write!(f, "Invalid operation: {}", e),
            PsthError::InvalidConfig(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl Error for PsthError {}

impl From<std::io::Error> for PsthError {
    fn from(e: std::io::Error) -> Self {
        PsthError::IOError(e.to_string())
    }
}

impl PsthError {
    /// Returns true if the error is about the analysis parameters rather than the loaded data.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PsthError::InvalidWindow(_) | PsthError::InvalidBinSize(_) | PsthError::InvalidConfig(_)
        )
    }

    /// Returns true if the parameters are fine but the loaded data cannot be analyzed.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            PsthError::EmptyEventSet | PsthError::NoTrials | PsthError::NoNeuronEvents
        )
    }
}
