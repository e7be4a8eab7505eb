//! Event log parsing.
//!
//! An event log is a line-oriented text file where each record reads `name,timestamp`,
//! with the timestamp in seconds. Blank lines and lines starting with `#` are ignored.
//! Records named `_ch...` are neuron spikes, other names starting with `_` are reserved,
//! and every other name is an experiment event. Timestamps are converted to milliseconds.
//!
//! Malformed lines never fail a load: they are skipped and kept aside for reporting.
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::PsthError;
use crate::record::{EventRecord, NeuronSpikeRecord, RawRecord, RecordKind};
use crate::MS_PER_SECOND;

/// The reason why a line could not be turned into a record.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum MalformedReason {
    /// The line does not have exactly two comma-separated fields.
    FieldCount(usize),
    /// The timestamp is not a finite decimal number.
    InvalidTimestamp(String),
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MalformedReason::FieldCount(n) => write!(f, "expected 2 fields, found {}", n),
            MalformedReason::InvalidTimestamp(ts) => write!(f, "invalid timestamp '{}'", ts),
        }
    }
}

/// A skipped line of the event log.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MalformedLine {
    /// The (1-based) line number in the source.
    pub line_number: usize,
    /// The offending line, trimmed.
    pub line: String,
    pub reason: MalformedReason,
}

impl MalformedLine {
    pub fn to_error(&self) -> PsthError {
        PsthError::MalformedRecord {
            line_number: self.line_number,
            reason: self.reason.clone(),
        }
    }
}

/// Counts gathered while parsing an event log.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct LoadSummary {
    /// The number of lines that are neither blank nor comments.
    pub num_lines: usize,
    /// The number of experiment events.
    pub event_count: usize,
    /// The number of neuron events (all channels pooled).
    pub neuron_event_count: usize,
    /// The number of records with a reserved name.
    pub reserved_count: usize,
    /// The number of malformed lines.
    pub malformed_count: usize,
    /// The number of neuron events per channel name.
    pub channels: BTreeMap<String, usize>,
}

impl LoadSummary {
    /// The number of lines that did not produce an event or a neuron event.
    pub fn discarded_count(&self) -> usize {
        self.reserved_count + self.malformed_count
    }
}

/// The content of an event log, split into experiment events and neuron events.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct EventLog {
    /// The experiment events, in file order.
    pub events: Vec<EventRecord>,
    /// The neuron events of all channels, in file order.
    pub neuron_events: Vec<NeuronSpikeRecord>,
    pub summary: LoadSummary,
    /// The lines that were skipped because they could not be parsed.
    pub malformed: Vec<MalformedLine>,
}

impl EventLog {
    fn push(&mut self, record: RawRecord) {
        match record.kind() {
            RecordKind::Event => {
                self.summary.event_count += 1;
                self.events.push(record);
            }
            RecordKind::NeuronSpike => {
                self.summary.neuron_event_count += 1;
                *self
                    .summary
                    .channels
                    .entry(record.name.clone())
                    .or_insert(0) += 1;
                self.neuron_events.push(record);
            }
            RecordKind::Reserved => {
                log::trace!("Reserved record '{}' ignored", record.name);
                self.summary.reserved_count += 1;
            }
        }
    }

    fn skip(&mut self, line_number: usize, line: &str, reason: MalformedReason) {
        self.summary.malformed_count += 1;
        self.malformed.push(MalformedLine {
            line_number,
            line: line.to_string(),
            reason,
        });
    }
}

/// Parse a single (trimmed, non-comment) line into a record with a timestamp in milliseconds.
pub fn parse_record(line: &str) -> Result<RawRecord, MalformedReason> {
    let (name, timestamp) = line
        .split(',')
        .collect_tuple()
        .ok_or_else(|| MalformedReason::FieldCount(line.split(',').count()))?;

    let name = name.trim();
    let timestamp = timestamp.trim();
    let seconds = timestamp
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| MalformedReason::InvalidTimestamp(timestamp.to_string()))?;

    Ok(RawRecord::new(name, seconds * MS_PER_SECOND))
}

/// Parse the lines of an event log.
pub fn parse_lines<I, S>(lines: I) -> EventLog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut event_log = EventLog::default();

    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        event_log.summary.num_lines += 1;

        match parse_record(line) {
            Ok(record) => event_log.push(record),
            Err(reason) => {
                log::debug!("Line {} skipped ({}): {}", i + 1, reason, line);
                event_log.skip(i + 1, line, reason);
            }
        }
    }

    event_log
}

/// Read and parse an event log file.
/// The file is read entirely before parsing, and invalid UTF-8 sequences are replaced.
pub fn load_from<P: AsRef<Path>>(path: P) -> Result<EventLog, PsthError> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| PsthError::IOError(format!("{}: {}", path.display(), e)))?;
    let text = String::from_utf8_lossy(&bytes);

    let event_log = parse_lines(text.lines());
    log::debug!(
        "Parsed {} experiment events and {} neuron events from {}",
        event_log.summary.event_count,
        event_log.summary.neuron_event_count,
        path.display()
    );
    Ok(event_log)
}
