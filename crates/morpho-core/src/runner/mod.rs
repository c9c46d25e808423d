//! Runner: ejecuta los steps de un Analysis contra un motor de procesos
//! externos y es el único dueño del estado "se está ejecutando".
//!
//! Transiciones:
//! - `Idle` -> `Running` con `run()`
//! - `Running` -> `Succeeded` cuando todos los steps terminan con estado 0
//! - `Running` -> `Failed` en el primer step con estado distinto de 0
//! - `Running` -> `Stopped` con `stop()`
//! - terminal -> `Idle` con `reset()`

mod core;
mod engine;
mod state;

pub use self::core::Runner;
pub use engine::{EngineError, ExecOutcome, ExecutionEngine, ProcessHandle};
pub use state::{RunSnapshot, RunState, StepFailure};
