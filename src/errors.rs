//! Errores de la aplicación: envuelven los de cada crate.

use std::path::PathBuf;

use morpho_core::{AnalysisError, RegistryError};
use morpho_persistence::PersistenceError;
use morpho_study::StudyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Study(#[from] StudyError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("a study already exists at '{0}'")]
    StudyExists(PathBuf),
    #[error("no study found at '{0}'")]
    StudyNotFound(PathBuf),
    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
