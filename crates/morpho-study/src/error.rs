use morpho_core::{AnalysisError, NamingError, ParameterError, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("subject '{0}' already exists in the study")]
    SubjectExists(String),
    #[error("unknown subject '{0}'")]
    UnknownSubject(String),
    #[error("subject '{0}' is running")]
    SubjectRunning(String),
    #[error("cannot import subject '{subject}': {source}")]
    Importation {
        subject: String,
        #[source]
        source: AnalysisError,
    },
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Estado persistido mal formado. La carga falla entera: nunca se devuelve
/// un estudio parcial.
#[derive(Debug, Error)]
pub enum StudySerializationError {
    #[error("study tree must be an object")]
    NotAnObject,
    #[error("missing or invalid field '{0}'")]
    Field(&'static str),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("subject record '{key}' is malformed: {reason}")]
    Subject { key: String, reason: String },
    #[error("subject record '{key}' describes subject '{id}'")]
    KeyMismatch { key: String, id: String },
    #[error("subject '{id}' has no '{section}' record")]
    MissingRecord { id: String, section: &'static str },
    #[error("'{section}' record '{id}' has no subject")]
    OrphanRecord { id: String, section: &'static str },
    #[error("subject '{id}': {source}")]
    Parameters {
        id: String,
        #[source]
        source: ParameterError,
    },
    #[error("subject '{id}': {source}")]
    Analysis {
        id: String,
        #[source]
        source: AnalysisError,
    },
}
