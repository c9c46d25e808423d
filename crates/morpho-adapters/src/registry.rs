use std::sync::Arc;

use morpho_core::{AnalysisRegistry, RegistryError};

use crate::intra::IntraAnalysis;
use crate::naming::{BrainvisaNaming, FlatNaming};

/// Registro con los tipos de análisis y políticas de nombres incluidos. Un
/// flow mal definido hace fallar esta llamada, no la primera ejecución.
pub fn default_registry() -> Result<AnalysisRegistry, RegistryError> {
    let mut registry = AnalysisRegistry::new();
    registry.register_analysis(Arc::new(IntraAnalysis::new()))?;
    registry.register_naming(Arc::new(BrainvisaNaming))?;
    registry.register_naming(Arc::new(FlatNaming))?;
    Ok(registry)
}
