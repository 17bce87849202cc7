//! SMP/E defaults file.
//!
//! ```yaml
//! SMPECSI:
//!   dataset: SMPE.GLOBAL.CSI
//! TEMP_DATASET:
//!   primary_space: 1G
//!   secondary_space: 1G
//!   volume: USRAT8
//! SMPECNTL:
//!   filename: /tmp/smpecntl
//! OUTPUT_DATASET:
//!   primary_space: 1G
//!   secondary_space: 1G
//!   volume: USRAT8
//! ```

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use crate::service::DatasetSpec;

/// Keys that must be present, in the order they are checked.
pub const REQUIRED_KEYS: &[(&str, &str)] = &[
    ("SMPECSI", "dataset"),
    ("TEMP_DATASET", "primary_space"),
    ("TEMP_DATASET", "secondary_space"),
    ("TEMP_DATASET", "volume"),
    ("SMPECNTL", "filename"),
    ("OUTPUT_DATASET", "primary_space"),
    ("OUTPUT_DATASET", "secondary_space"),
    ("OUTPUT_DATASET", "volume"),
];

/// Configuration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {}", .path.display())]
    #[diagnostic(code(config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", .path.display())]
    #[diagnostic(code(config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Yaml file missing {section}:{key}")]
    #[diagnostic(code(config::missing_key))]
    MissingKey { section: String, key: String },
}

/// Space and volume for one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationDefaults {
    pub primary_space: String,
    pub secondary_space: String,
    pub volume: String,
}

impl AllocationDefaults {
    /// Apply space and volume to `spec`.
    pub fn apply(&self, spec: DatasetSpec) -> DatasetSpec {
        spec.space(&self.primary_space, &self.secondary_space)
            .volume(&self.volume)
    }
}

/// Defaults for the SMP/E list tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmpeDefaults {
    /// Global CSI data set.
    pub csi: String,
    /// SMPWRK6 work data set allocation.
    pub work: AllocationDefaults,
    /// Where the SMPCNTL deck is written.
    pub control_file: PathBuf,
    /// SMPLIST output data set allocation.
    pub output: AllocationDefaults,
}

impl SmpeDefaults {
    /// Load from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let defaults = Self::from_value(&value)?;
        debug!(path = %path.display(), csi = %defaults.csi, "Loaded SMP/E defaults");
        Ok(defaults)
    }

    /// Build from parsed YAML, naming the first missing key.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        for (section, key) in REQUIRED_KEYS {
            lookup(value, section, key)?;
        }
        let allocation = |section: &str| -> Result<AllocationDefaults, ConfigError> {
            Ok(AllocationDefaults {
                primary_space: lookup(value, section, "primary_space")?,
                secondary_space: lookup(value, section, "secondary_space")?,
                volume: lookup(value, section, "volume")?,
            })
        };
        Ok(Self {
            csi: lookup(value, "SMPECSI", "dataset")?,
            work: allocation("TEMP_DATASET")?,
            control_file: PathBuf::from(lookup(value, "SMPECNTL", "filename")?),
            output: allocation("OUTPUT_DATASET")?,
        })
    }
}

/// `SECTION:key` as a string. Scalars of any type are accepted; the key
/// match falls back to case-insensitive (`Dataset` for `dataset`).
fn lookup(value: &Value, section: &str, key: &str) -> Result<String, ConfigError> {
    let missing = || ConfigError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
    };
    let map = value
        .get(section)
        .and_then(Value::as_mapping)
        .ok_or_else(missing)?;
    let entry = map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.as_str().is_some_and(|k| k.eq_ignore_ascii_case(key)))
            .map(|(_, v)| v)
    });
    match entry {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        _ => Err(missing()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
SMPECSI:
  Dataset: SMPE.GLOBAL.CSI
TEMP_DATASET:
  primary_space: 1G
  secondary_space: 500M
  volume: USRAT8
SMPECNTL:
  filename: /tmp/smpecntl
OUTPUT_DATASET:
  primary_space: 10
  secondary_space: 5
  volume: USRAT9
";

    fn parse(yaml: &str) -> Result<SmpeDefaults, ConfigError> {
        SmpeDefaults::from_value(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_full_file() {
        let defaults = parse(FULL).unwrap();
        assert_eq!(defaults.csi, "SMPE.GLOBAL.CSI");
        assert_eq!(defaults.work.secondary_space, "500M");
        assert_eq!(defaults.control_file, PathBuf::from("/tmp/smpecntl"));
        assert_eq!(defaults.output.primary_space, "10");
        assert_eq!(defaults.output.volume, "USRAT9");
    }

    #[test]
    fn test_names_first_missing_key() {
        let yaml = FULL.replace("  volume: USRAT8\n", "");
        let err = parse(&yaml).unwrap_err();
        assert_eq!(err.to_string(), "Yaml file missing TEMP_DATASET:volume");
    }

    #[test]
    fn test_missing_section() {
        let yaml = FULL.replace("SMPECNTL:\n  filename: /tmp/smpecntl\n", "");
        let err = parse(&yaml).unwrap_err();
        assert_eq!(err.to_string(), "Yaml file missing SMPECNTL:filename");
    }

    #[test]
    fn test_apply_allocation() {
        let defaults = parse(FULL).unwrap();
        let spec = defaults.work.apply(DatasetSpec::pds());
        assert_eq!(spec.primary_space.as_deref(), Some("1G"));
        assert_eq!(spec.volumes.as_deref(), Some("USRAT8"));
    }

    #[test]
    fn test_load_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = SmpeDefaults::load_from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "SMPECSI: [unclosed").unwrap();
        assert!(matches!(
            SmpeDefaults::load_from_file(&bad).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }
}
