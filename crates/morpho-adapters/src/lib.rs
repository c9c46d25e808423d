//! morpho-adapters: piezas concretas enchufadas al core.
//!
//! Este crate provee:
//! - El tipo de análisis intra-sujeto (`IntraAnalysis`): corrección de sesgo,
//!   análisis de histograma, segmentación del cerebro y separación de
//!   hemisferios.
//! - Políticas de nombres `brainvisa` y `flat`.
//! - Motores de ejecución: procesos locales del sistema y uno simulado.
//! - El cargador de archivos de histograma `.han`.
//! - `default_registry()` con todo lo anterior registrado.
//!
//! Nota: El core sólo conoce comandos opacos y rutas. Los nombres de los
//! programas y el formato de los archivos viven aquí.

pub mod engines;
pub mod intra;
pub mod loaders;
pub mod naming;
pub mod registry;

pub use engines::{LocalProcessEngine, SimulatedEngine};
pub use intra::IntraAnalysis;
pub use loaders::{HistoAnalysis, HistoAnalysisLoader, TissueStats};
pub use naming::{BrainvisaNaming, FlatNaming};
pub use registry::default_registry;
