//! Motores de ejecución de comandos externos.

mod local;
mod simulated;

pub use local::LocalProcessEngine;
pub use simulated::SimulatedEngine;
