use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::step::CommandDescription;

/// Resultado de un proceso externo terminado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    /// `None` cuando el proceso terminó por señal (p. ej. tras `terminate`).
    pub exit_code: Option<i32>,
    pub diagnostic: String,
}

impl ExecOutcome {
    pub fn success() -> Self {
        Self { exit_code: Some(0),
               diagnostic: String::new() }
    }

    pub fn failure(exit_code: Option<i32>, diagnostic: impl Into<String>) -> Self {
        Self { exit_code,
               diagnostic: diagnostic.into() }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("cannot launch '{program}': {reason}")]
    Launch { program: String, reason: String },
}

/// Proceso en curso devuelto por `ExecutionEngine::launch`.
pub trait ProcessHandle: Send + Sync {
    /// Bloquea hasta que el proceso termine.
    fn wait(&self) -> ExecOutcome;

    /// Pide la terminación del proceso; `wait` debe volver poco después.
    fn terminate(&self);
}

/// Motor de procesos externos consumido por el runner.
pub trait ExecutionEngine: Send + Sync + fmt::Debug {
    fn launch(&self, command: &CommandDescription) -> Result<Arc<dyn ProcessHandle>, EngineError>;
}
