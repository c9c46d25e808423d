//! Steps: nodos del flow con nombres de entrada/salida declarados y un
//! contrato de ejecución opaco (construir un comando externo).
//!
//! - `StepDefinition`: interfaz neutral que ve el runner.
//! - `CommandStep`: definición declarativa (programa + argumentos) usada por
//!   los steps incluidos.
//! - `Step`: nodo del flow; guarda los valores ligados por `StepFlow::propagate`.

mod bound;
mod command;
pub mod definition;

pub use bound::BoundValues;
pub use command::{Arg, CommandDescription, CommandStep};
pub use definition::{Step, StepDefinition};
