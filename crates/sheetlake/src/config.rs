//! Run configuration loaded from `settings.yaml`.
//!
//! Every field has a default, so an empty document is a valid configuration.
//! Managed output directories derive from `output_root` unless set
//! explicitly under `paths`.
//!
//! ```yaml
//! input_root: ./datalake
//! output_root: ./data
//! extensions: [".xlsx", ".csv"]
//! excel:
//!   header_search_rows: 200
//! header_detection:
//!   min_header_confidence: 0.6
//! copy:
//!   overwrite: false
//!   dry_run: false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::{Result, SheetlakeError};

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LakeConfig {
    /// Root of the lake to scan.
    pub input_root: PathBuf,
    /// Root under which managed directories are derived.
    pub output_root: PathBuf,
    /// File extensions to pick up.
    pub extensions: Vec<String>,
    pub excel: ExcelSettings,
    pub header_detection: HeaderDetectionSettings,
    pub copy: CopySettings,
    pub paths: PathSettings,
    /// YAML mapping of normalized header aliases.
    pub aliases_path: PathBuf,
    /// YAML mapping of schema hash to label.
    pub labels_path: PathBuf,
    pub logging: LoggingSettings,
    /// Transforms applied to consolidated tables.
    pub transforms: Vec<TransformSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelSettings {
    /// Rows previewed per file when looking for the header.
    pub header_search_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderDetectionSettings {
    /// Confidence floor in [0, 1]; below it files are quarantined.
    pub min_header_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopySettings {
    /// Replace existing destination files.
    pub overwrite: bool,
    /// Classify and write artifacts without copying anything.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub staging_dir: Option<PathBuf>,
    pub classified_dir: Option<PathBuf>,
    pub quarantine_dir: Option<PathBuf>,
    pub processed_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
    /// Optional log file in addition to stderr.
    pub file: Option<PathBuf>,
}

/// A configured transform for consolidated tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformSpec {
    /// Extract a code from the first present source column into `target`,
    /// optionally mapping it through lookup tables into further columns.
    RegexExtract {
        /// Applies to labels starting with this prefix.
        label_prefix: String,
        /// Candidate source columns, first present wins.
        source_columns: Vec<String>,
        /// Regex whose first capture group is the extracted code.
        pattern: String,
        /// Column receiving the code.
        target: String,
        /// `column -> (code -> value)` lookups.
        #[serde(default)]
        lookups: indexmap::IndexMap<String, indexmap::IndexMap<String, String>>,
        /// Fail the schema when none of the source columns is present.
        #[serde(default)]
        require_source: bool,
    },
}

impl Default for LakeConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("./datalake"),
            output_root: PathBuf::from("./data"),
            extensions: vec![".xlsx".to_string(), ".csv".to_string()],
            excel: ExcelSettings::default(),
            header_detection: HeaderDetectionSettings::default(),
            copy: CopySettings::default(),
            paths: PathSettings::default(),
            aliases_path: PathBuf::from("config/header_aliases.yaml"),
            labels_path: PathBuf::from("config/schema_labels.yaml"),
            logging: LoggingSettings::default(),
            transforms: Vec::new(),
        }
    }
}

impl Default for ExcelSettings {
    fn default() -> Self {
        Self {
            header_search_rows: 200,
        }
    }
}

impl Default for HeaderDetectionSettings {
    fn default() -> Self {
        Self {
            min_header_confidence: 0.60,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from this settings file.
    File(PathBuf),
    /// The default settings file was absent; built-in defaults are in use.
    Defaults { tried: PathBuf },
}

impl ConfigOrigin {
    /// Emit the load event for this origin.
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => debug!(path = %path.display(), "config loaded"),
            ConfigOrigin::Defaults { tried } => {
                warn!(path = %tried.display(), "config file not found, using defaults")
            }
        }
    }
}

/// Command-line overrides applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_root: Option<PathBuf>,
    /// Also re-derives every managed directory under the new root.
    pub output_root: Option<PathBuf>,
    pub header_search_rows: Option<usize>,
    pub min_header_confidence: Option<f64>,
    pub overwrite: bool,
    pub dry_run: bool,
}

impl LakeConfig {
    /// Load and validate a settings file.
    ///
    /// When `path` is `None` the default location is tried and defaults are
    /// used if it does not exist. An explicit path that does not exist is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config, origin) = Self::load_with_origin(path)?;
        origin.log();
        Ok(config)
    }

    /// Same as [`LakeConfig::load`] but logs nothing, returning where the
    /// configuration came from instead. For callers that install their
    /// subscriber from the loaded settings.
    pub fn load_with_origin(path: Option<&Path>) -> Result<(Self, ConfigOrigin)> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if explicit {
                return Err(SheetlakeError::Config(format!(
                    "config not found: {}",
                    path.display()
                )));
            }
            return Ok((Self::default(), ConfigOrigin::Defaults { tried: path }));
        }

        let contents = fs::read_to_string(&path).map_err(|e| SheetlakeError::io(&path, e))?;
        let config = Self::from_yaml_str(&contents).map_err(|e| match e {
            SheetlakeError::Yaml { source, .. } => SheetlakeError::Yaml {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        Ok((config, ConfigOrigin::File(path)))
    }

    /// Parse and validate a settings document.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(contents).map_err(|source| SheetlakeError::Yaml {
            path: PathBuf::from("<settings>"),
            source,
        })?;

        let config = match value {
            Value::Null => Self::default(),
            Value::Mapping(_) => {
                serde_yaml::from_value(value).map_err(|source| SheetlakeError::Yaml {
                    path: PathBuf::from("<settings>"),
                    source,
                })?
            }
            _ => {
                return Err(SheetlakeError::Config(
                    "settings root must be a mapping".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate.
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(input_root) = overrides.input_root {
            self.input_root = input_root;
        }
        if let Some(output_root) = overrides.output_root {
            self.output_root = output_root;
            self.paths = PathSettings::default();
        }
        if let Some(rows) = overrides.header_search_rows {
            self.excel.header_search_rows = rows;
        }
        if let Some(confidence) = overrides.min_header_confidence {
            self.header_detection.min_header_confidence = confidence;
        }
        self.copy.overwrite |= overrides.overwrite;
        self.copy.dry_run |= overrides.dry_run;

        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.excel.header_search_rows == 0 {
            return Err(SheetlakeError::Config(
                "excel.header_search_rows must be at least 1".to_string(),
            ));
        }
        let confidence = self.header_detection.min_header_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SheetlakeError::Config(format!(
                "header_detection.min_header_confidence must be within [0, 1], got {}",
                confidence
            )));
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(SheetlakeError::Config(
                "extensions must list at least one file extension".to_string(),
            ));
        }
        Ok(())
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.managed_dir(&self.paths.staging_dir, "staging")
    }

    pub fn classified_dir(&self) -> PathBuf {
        self.managed_dir(&self.paths.classified_dir, "classified")
    }

    pub fn quarantine_dir(&self) -> PathBuf {
        self.managed_dir(&self.paths.quarantine_dir, "quarantine")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.managed_dir(&self.paths.processed_dir, "processed")
    }

    fn managed_dir(&self, explicit: &Option<PathBuf>, name: &str) -> PathBuf {
        explicit
            .clone()
            .unwrap_or_else(|| self.output_root.join(name))
    }
}

/// Which YAML scalars a string mapping accepts as keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MappingKeys {
    /// Strings, numbers and booleans, stringified.
    Scalar,
    /// Strings only. For identifiers like schema hashes, where YAML reads an
    /// unquoted all-digit or exponent-shaped hash as a number and its text
    /// no longer round-trips.
    String,
}

/// Load a flat YAML mapping of scalars as string pairs.
///
/// A missing file or an empty document yields no pairs. Null keys or values
/// are skipped. A document that is not a mapping, a mapping holding nested
/// collections, or a key the policy rejects is a configuration error.
pub(crate) fn load_string_mapping(
    path: &Path,
    what: &str,
    keys: MappingKeys,
) -> Result<Vec<(String, String)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path).map_err(|e| SheetlakeError::io(path, e))?;
    let value: Value = serde_yaml::from_str(&contents).map_err(|source| SheetlakeError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    let mapping = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(SheetlakeError::Config(format!(
                "{} file '{}' must be a mapping",
                what,
                path.display()
            )))
        }
    };

    let mut pairs = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        if keys == MappingKeys::String && (key.is_number() || key.is_bool()) {
            let shown = serde_yaml::to_string(&key).unwrap_or_default();
            return Err(SheetlakeError::Config(format!(
                "{} file '{}' has non-string key {}; quote it",
                what,
                path.display(),
                shown.trim()
            )));
        }
        let (Some(key), Some(value)) = (scalar_to_string(&key), scalar_to_string(&value)) else {
            if key.is_mapping() || key.is_sequence() || value.is_mapping() || value.is_sequence() {
                return Err(SheetlakeError::Config(format!(
                    "{} file '{}' must map scalars to scalars",
                    what,
                    path.display()
                )));
            }
            continue;
        };
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
