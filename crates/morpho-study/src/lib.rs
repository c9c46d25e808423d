//! morpho-study: el estudio (conjunto de sujetos con su análisis) y su
//! ejecución.
//!
//! - `Study`: agregado `sujeto -> Analysis`, con alta atómica, resultados por
//!   selección y serialización a un árbol JSON.
//! - `StudyRunner`: un `Runner` por sujeto; sujetos distintos corren en
//!   paralelo.
//! - `StatusBoard`: recálculo de estados por tick, con diff y observadores.

pub mod error;
pub mod runner;
pub mod selection;
pub mod status;
pub mod study;

pub use error::{StudyError, StudySerializationError};
pub use runner::{RunReport, StudyRunner};
pub use selection::Selection;
pub use status::{StatusBoard, StatusChange, StatusObserver};
pub use study::Study;
