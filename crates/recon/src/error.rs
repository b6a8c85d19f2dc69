use thiserror::Error;

use crate::record::{DocumentKind, RefField};

/// Structural failures. Data-quality problems (missing references, bad dates,
/// empty collections) never surface here; they degrade coverage instead.
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (missing source, duplicate link name, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A link or the pairing section names a source that is not configured.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A field selector names a field the document kind does not carry.
    #[error("{kind} records do not carry field '{field}'")]
    FieldNotCarried { kind: DocumentKind, field: RefField },

    /// A configured column is absent from an input file's header.
    #[error("source '{source_name}': missing column '{column}'")]
    MissingColumn { source_name: String, column: String },

    /// File read / CSV framing error.
    #[error("IO error: {0}")]
    Io(String),

    /// Excel workbook could not be opened or read.
    #[error("workbook error: {0}")]
    Workbook(String),
}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Io(e.to_string())
    }
}
