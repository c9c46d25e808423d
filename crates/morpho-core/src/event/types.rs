//! Tipos de evento de una ejecución.
//!
//! El runner emite un evento por transición observable a un `EventStore`
//! append-only; sirven para inspeccionar una ejecución pasada sin depender
//! del snapshot actual.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija la cantidad de steps.
    RunStarted { step_count: usize },
    /// Un step lanzó su proceso. No implica éxito.
    StepStarted { step_index: usize, step_id: String },
    /// El proceso del step terminó con estado 0.
    StepFinished { step_index: usize, step_id: String },
    /// El proceso terminó con error o no pudo lanzarse. La ejecución no
    /// continúa.
    StepFailed {
        step_index: usize,
        step_id: String,
        exit_code: Option<i32>,
        diagnostic: String,
    },
    /// `stop()` interrumpió la ejecución antes o durante `step_index`.
    RunStopped { step_index: usize },
    /// Todos los steps terminaron bien.
    RunCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
