//! Derivación del estado visible de un sujeto.
//!
//! Función pura sobre `(estado del runner, salidas existentes, salidas
//! faltantes)`. Quien la consuma (un poller, la CLI) puede memorizar el
//! resultado y comparar para detectar cambios.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::runner::RunState;

/// Prioridad: `Running` > `LastRunFailed` > `NoOutputFiles` >
/// `AllOutputFilesExist` > `SomeOutputFilesExist`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    Running,
    LastRunFailed,
    NoOutputFiles,
    AllOutputFilesExist,
    SomeOutputFilesExist,
}

impl SubjectStatus {
    pub fn label(self) -> &'static str {
        match self {
            SubjectStatus::Running => "is running",
            SubjectStatus::LastRunFailed => "last run failed",
            SubjectStatus::NoOutputFiles => "no output files",
            SubjectStatus::AllOutputFilesExist => "output files exist",
            SubjectStatus::SomeOutputFilesExist => "some output files exist",
        }
    }
}

impl fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `Stopped` cuenta como fallo: la ejecución no terminó.
pub fn derive_status(state: RunState, existing: usize, missing: usize) -> SubjectStatus {
    match state {
        RunState::Running => SubjectStatus::Running,
        RunState::Failed | RunState::Stopped => SubjectStatus::LastRunFailed,
        _ if existing == 0 => SubjectStatus::NoOutputFiles,
        _ if missing == 0 => SubjectStatus::AllOutputFilesExist,
        _ => SubjectStatus::SomeOutputFilesExist,
    }
}
