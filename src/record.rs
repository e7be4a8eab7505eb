//! Timestamped records read from an event log.
use serde::{Deserialize, Serialize};

use crate::{NEURON_PREFIX, RESERVED_PREFIX};

/// The category of a record, derived from its name.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum RecordKind {
    /// An occurrence of a named experimental condition.
    Event,
    /// A spike detected on a recording channel (name starts with `_ch`).
    NeuronSpike,
    /// Any other name starting with `_`, reserved for internal use and ignored.
    Reserved,
}

impl RecordKind {
    /// Classify a (trimmed) record name.
    pub fn classify(name: &str) -> Self {
        if name.starts_with(NEURON_PREFIX) {
            RecordKind::NeuronSpike
        } else if name.starts_with(RESERVED_PREFIX) {
            RecordKind::Reserved
        } else {
            RecordKind::Event
        }
    }
}

/// A named record with a timestamp in milliseconds.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// The name of the record, e.g., `stim` or `_ch1`.
    pub name: String,
    /// The time of the record, in milliseconds.
    pub time: f64,
}

impl RawRecord {
    pub fn new(name: impl Into<String>, time: f64) -> Self {
        RawRecord {
            name: name.into(),
            time,
        }
    }

    /// The category of the record.
    pub fn kind(&self) -> RecordKind {
        RecordKind::classify(&self.name)
    }

    /// The recording channel of a neuron spike, i.e., the suffix after `_ch`.
    /// Returns `None` for any other kind of record.
    pub fn channel(&self) -> Option<&str> {
        self.name.strip_prefix(NEURON_PREFIX)
    }
}

/// A record naming an experimental event.
pub type EventRecord = RawRecord;

/// A record naming a spike on a recording channel.
pub type NeuronSpikeRecord = RawRecord;
