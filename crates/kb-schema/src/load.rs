//! # Document Loading
//!
//! Reads a structured document from disk and parses it into a
//! `serde_json::Value`. JSON is the native format; YAML documents are
//! accepted and converted to the equivalent JSON value tree so that both
//! can be validated against the same JSON Schema.
//!
//! A load is a single read followed by a single parse. There are no
//! retries and no side effects beyond reading the file.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Serialization format of a document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.json` and any unrecognised extension.
    Json,
    /// `.yaml` or `.yml`.
    Yaml,
}

impl DocumentFormat {
    /// Pick the format for `path` from its extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    /// Returns the format name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a document could not be loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Nothing exists at the given location.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// Location that was requested.
        path: PathBuf,
    },

    /// The file exists but its contents are not a valid document.
    #[error("invalid {format} in {}: {reason}", path.display())]
    Parse {
        /// Location of the malformed document.
        path: PathBuf,
        /// Format the parser expected.
        format: DocumentFormat,
        /// Parser diagnostic, including position where available.
        reason: String,
        /// 1-based line of the error, when the parser reports one.
        line: Option<usize>,
        /// 1-based column of the error, when the parser reports one.
        column: Option<usize>,
    },

    /// The file exists but could not be read (permissions, not a regular
    /// file).
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Location that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Load and parse the document at `path`.
///
/// # Errors
///
/// - [`LoadError::NotFound`] if no file exists at `path`.
/// - [`LoadError::Parse`] if the contents are not UTF-8 text, or not valid
///   JSON (or YAML, for `.yaml`/`.yml` files). The reason carries the
///   parser's message, which includes line and column.
/// - [`LoadError::Read`] for any other I/O failure.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let format = DocumentFormat::from_path(path);
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::InvalidData => LoadError::Parse {
            path: path.to_path_buf(),
            format,
            reason: e.to_string(),
            line: None,
            column: None,
        },
        _ => LoadError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    match format {
        DocumentFormat::Json => parse_json(path, &content),
        DocumentFormat::Yaml => parse_yaml(path, &content),
    }
}

fn parse_json(path: &Path, content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        format: DocumentFormat::Json,
        reason: e.to_string(),
        // serde_json reports line 0 for errors without a position.
        line: (e.line() > 0).then_some(e.line()),
        column: (e.line() > 0).then_some(e.column()),
    })
}

fn parse_yaml(path: &Path, content: &str) -> Result<Value, LoadError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| {
        let location = e.location();
        LoadError::Parse {
            path: path.to_path_buf(),
            format: DocumentFormat::Yaml,
            reason: e.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    })?;

    yaml_to_json_value(&yaml).map_err(|reason| LoadError::Parse {
        path: path.to_path_buf(),
        format: DocumentFormat::Yaml,
        reason,
        line: None,
        column: None,
    })
}

/// Convert a `serde_yaml::Value` into the equivalent `serde_json::Value`.
///
/// Tags are dropped. Scalar mapping keys are stringified; sequence or
/// mapping keys have no JSON equivalent and are rejected, as are floats
/// that JSON cannot represent (NaN, infinities).
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("number {f} has no JSON representation"))
            } else {
                Err(format!("unsupported YAML number: {n}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => return Err(format!("unsupported YAML mapping key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
