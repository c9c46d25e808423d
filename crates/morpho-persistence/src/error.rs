//! Errores de persistencia.

use std::path::PathBuf;

use morpho_study::StudySerializationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed study file '{path}': {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: StudySerializationError,
    },
}
