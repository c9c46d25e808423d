//! Morphoflow
//!
//! Librería de la aplicación que envuelve los crates `morpho-*`:
//! - `config`: configuración global desde `.env` y el entorno.
//! - `errors`: error de aplicación.
//! - `workspace`: abrir, crear y guardar estudios.
//!
//! La usa `main.rs` (la CLI).

pub mod config;
pub mod errors;
pub mod workspace;

pub use config::{AppConfig, EngineKind, CONFIG};
pub use errors::AppError;
pub use workspace::{images_in, Workspace};
