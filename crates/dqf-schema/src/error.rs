use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to access schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema document: {message}")]
    InvalidDocument { message: String },

    #[error("duplicate canonical key: {key}")]
    DuplicateKey { key: String },

    #[error("invalid canonical key: {key:?}")]
    InvalidKey { key: String },

    #[error("column {key} declares mismatched header {header:?}")]
    HeaderMismatch { key: String, header: String },

    #[error("invalid header pattern for {key}: {source}")]
    InvalidHeaderPattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid value transform pattern for {key} ({pattern:?}): {source}")]
    InvalidTransform {
        key: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("value transforms reference unknown column: {key}")]
    UnknownColumn { key: String },
}

impl SchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
