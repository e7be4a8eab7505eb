//! Analysis parameters.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::PsthError;
use crate::psth::validate_bin_size;
use crate::trial::Window;

/// The default window start, in milliseconds.
pub const DEFAULT_PRE_MS: f64 = -500.0;
/// The default window end, in milliseconds.
pub const DEFAULT_POST_MS: f64 = 2500.0;
/// The default PSTH bin size, in milliseconds.
pub const DEFAULT_BIN_SIZE_MS: f64 = 50.0;

/// The window and bin size of an analysis, in milliseconds.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pre_ms: f64,
    pub post_ms: f64,
    pub bin_size_ms: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            pre_ms: DEFAULT_PRE_MS,
            post_ms: DEFAULT_POST_MS,
            bin_size_ms: DEFAULT_BIN_SIZE_MS,
        }
    }
}

impl AnalysisConfig {
    pub fn new(pre_ms: f64, post_ms: f64, bin_size_ms: f64) -> Self {
        AnalysisConfig {
            pre_ms,
            post_ms,
            bin_size_ms,
        }
    }

    /// Check the window and the bin size, and return the window.
    pub fn validate(&self) -> Result<Window, PsthError> {
        let window = Window::build(self.pre_ms, self.post_ms)?;
        validate_bin_size(self.bin_size_ms, &window)?;
        Ok(window)
    }

    /// Read a configuration from a JSON file. Missing fields take their default value.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, PsthError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PsthError::IOError(format!("{}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| PsthError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert_eq!(config, AnalysisConfig::new(-500.0, 2500.0, 50.0));
        assert_eq!(
            config.validate(),
            Ok(Window {
                pre: -500.0,
                post: 2500.0
            })
        );
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            AnalysisConfig::new(100.0, -100.0, 10.0).validate(),
            Err(PsthError::InvalidWindow(_))
        ));
        assert!(matches!(
            AnalysisConfig::new(-100.0, 100.0, 0.0).validate(),
            Err(PsthError::InvalidBinSize(_))
        ));
        assert!(matches!(
            AnalysisConfig::new(-100.0, 100.0, 200.0).validate(),
            Err(PsthError::InvalidBinSize(_))
        ));
        assert!(AnalysisConfig::new(-100.0, 100.0, 199.0).validate().is_ok());
    }

    #[test]
    fn test_load_from() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"pre_ms": -100.0, "bin_size_ms": 10.0}}"#).unwrap();

        let config = AnalysisConfig::load_from(file.path()).unwrap();
        assert_eq!(config, AnalysisConfig::new(-100.0, DEFAULT_POST_MS, 10.0));
    }

    #[test]
    fn test_load_from_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            AnalysisConfig::load_from(file.path()),
            Err(PsthError::InvalidConfig(_))
        ));

        assert!(matches!(
            AnalysisConfig::load_from("missing/config.json"),
            Err(PsthError::IOError(_))
        ));
    }
}
