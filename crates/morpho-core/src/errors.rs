//! Errores del core.
//!
//! Cada enum cubre una preocupación: parámetros, cableado del flow, análisis,
//! runner y registro de tipos de análisis. Los errores estructurales
//! (`FlowError::is_structural`) indican una definición de flow incorrecta y no
//! deben recuperarse; el resto los corrige quien maneja el estudio.

use std::path::PathBuf;

use thiserror::Error;

use crate::naming::NamingError;
use crate::runner::RunState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("unknown parameter '{name}'")]
    Unknown { name: String },
    #[error("parameter '{name}' is a file parameter and only accepts paths")]
    NotAFile { name: String },
    #[error("malformed parameters: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("step '{step}': input '{param}' is not produced upstream nor provided externally")]
    IncompleteWiring { step: String, param: String },
    #[error("step '{step}': '{param}' declared both as input and output")]
    OverlappingParameters { step: String, param: String },
    #[error("output '{param}' produced by both '{first}' and '{second}'")]
    DuplicateProducer { param: String, first: String, second: String },
    #[error("step '{step}': output '{param}' has no matching external output parameter")]
    UnboundOutput { step: String, param: String },
    #[error("step '{step}': no value for parameter '{param}'")]
    MissingParameterValue { step: String, param: String },
}

impl FlowError {
    /// `true` si el error viene de la definición del flow y no de los valores
    /// de un sujeto concreto.
    pub fn is_structural(&self) -> bool {
        !matches!(self, FlowError::MissingParameterValue { .. })
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parameters(#[from] ParameterError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error("importation failed for '{source_path}': {reason}")]
    Importation { source_path: PathBuf, reason: String },
    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("runner is not idle (state: {state})")]
    AlreadyRunning { state: RunState },
    #[error("some output files already exist: {paths:?}")]
    OutputFileExist { paths: Vec<PathBuf> },
    #[error("some input files do not exist: {paths:?}")]
    MissingInputFile { paths: Vec<PathBuf> },
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("another run is being started on this runner")]
    StartInProgress,
    #[error("another caller is already waiting on this runner")]
    WaitInProgress,
    #[error("runner is still running")]
    StillRunning,
    #[error("cannot prepare output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot start worker: {0}")]
    Worker(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown analysis type '{0}'")]
    UnknownAnalysisType(String),
    #[error("unknown naming policy '{0}'")]
    UnknownNamingPolicy(String),
    #[error("'{0}' is already registered")]
    Duplicate(String),
    #[error("analysis type '{name}' has a broken step flow: {source}")]
    Structural {
        name: String,
        #[source]
        source: FlowError,
    },
}
