use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use super::AnalysisBlueprint;
use crate::errors::{FlowError, RegistryError};
use crate::naming::NamingPolicy;

/// Mapa de constructores validado al arrancar: un tipo de análisis o una
/// política desconocidos fallan con un error claro en la búsqueda.
#[derive(Debug, Default, Clone)]
pub struct AnalysisRegistry {
    blueprints: IndexMap<String, Arc<dyn AnalysisBlueprint>>,
    naming: IndexMap<String, Arc<dyn NamingPolicy>>,
}

impl AnalysisRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un tipo de análisis tras construir y propagar su flow con los
    /// nombres declarados.
    pub fn register_analysis(&mut self, blueprint: Arc<dyn AnalysisBlueprint>) -> Result<(), RegistryError> {
        let name = blueprint.name().to_string();
        if self.blueprints.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        let structural = |source: FlowError| RegistryError::Structural { name: name.clone(), source };
        let inputs = blueprint.input_parameters();
        if !inputs.is_file_param(blueprint.raw_input_name()) {
            return Err(structural(FlowError::IncompleteWiring { step: name.clone(),
                                                                param: blueprint.raw_input_name().to_string() }));
        }
        let mut flow = blueprint.build_flow().map_err(structural)?;
        flow.propagate(&inputs, &blueprint.output_parameters()).map_err(structural)?;
        debug!("registered analysis type '{}' ({} steps)", name, flow.len());
        self.blueprints.insert(name, blueprint);
        Ok(())
    }

    pub fn register_naming(&mut self, policy: Arc<dyn NamingPolicy>) -> Result<(), RegistryError> {
        let name = policy.name().to_string();
        if self.naming.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.naming.insert(name, policy);
        Ok(())
    }

    pub fn analysis(&self, name: &str) -> Result<Arc<dyn AnalysisBlueprint>, RegistryError> {
        self.blueprints
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAnalysisType(name.to_string()))
    }

    pub fn naming(&self, name: &str) -> Result<Arc<dyn NamingPolicy>, RegistryError> {
        self.naming
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownNamingPolicy(name.to_string()))
    }

    pub fn analysis_names(&self) -> impl Iterator<Item = &str> {
        self.blueprints.keys().map(String::as_str)
    }

    pub fn naming_names(&self) -> impl Iterator<Item = &str> {
        self.naming.keys().map(String::as_str)
    }
}
