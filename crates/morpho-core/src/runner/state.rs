use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Stopped,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed | RunState::Stopped)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
            RunState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Step que hizo fallar la última ejecución.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub index: usize,
    pub step_id: String,
    /// `None` si el proceso no llegó a lanzarse o terminó por señal.
    pub exit_code: Option<i32>,
    pub diagnostic: String,
}

/// Lectura consistente del estado del runner: estado y diagnóstico se leen
/// bajo el mismo lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: Option<Uuid>,
    pub state: RunState,
    pub current_step: Option<String>,
    pub failure: Option<StepFailure>,
}

impl Default for RunSnapshot {
    fn default() -> Self {
        Self { run_id: None,
               state: RunState::Idle,
               current_step: None,
               failure: None }
    }
}
