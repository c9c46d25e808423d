//! morpho-persistence
//!
//! Guarda y carga estudios como un único archivo JSON. El archivo es el único
//! estado persistido: el árbol de directorios se deriva de él.
//!
//! Módulos:
//! - `config`: configuración del store desde el entorno (.env).
//! - `error`: errores de persistencia.
//! - `json`: `JsonStudyFile`, escritura atómica con respaldo opcional.

pub mod config;
pub mod error;
pub mod json;

pub use config::{init_dotenv, StoreConfig};
pub use error::PersistenceError;
pub use json::JsonStudyFile;
