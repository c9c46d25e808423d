use std::fmt;

use super::{BoundValues, CommandDescription};
use crate::errors::FlowError;
use crate::params::ParamValue;

/// Trait que define un Step. El runner sólo lo usa para obtener un comando
/// ejecutable a partir de los valores ligados.
pub trait StepDefinition: Send + Sync + fmt::Debug {
    /// Identificador estable y único dentro del flow.
    fn id(&self) -> &str;

    /// Nombre opcional amigable.
    fn name(&self) -> &str {
        self.id()
    }

    /// Nombres de parámetros de entrada declarados.
    fn inputs(&self) -> &[String];

    /// Nombres de parámetros de salida declarados.
    fn outputs(&self) -> &[String];

    /// Comprobaciones estructurales propias de la definición.
    fn validate(&self) -> Result<(), FlowError> {
        Ok(())
    }

    /// Comando externo construido con los valores ligados en este momento.
    fn build_command(&self, bound: &BoundValues) -> Result<CommandDescription, FlowError>;
}

/// Nodo del flow: una definición más sus valores ligados.
#[derive(Debug)]
pub struct Step {
    definition: Box<dyn StepDefinition>,
    bound: BoundValues,
}

impl Step {
    /// Falla si la definición declara un mismo nombre como entrada y salida.
    pub fn new(definition: Box<dyn StepDefinition>) -> Result<Self, FlowError> {
        if let Some(name) = definition.outputs().iter().find(|o| definition.inputs().contains(o)) {
            return Err(FlowError::OverlappingParameters { step: definition.id().to_string(),
                                                          param: name.clone() });
        }
        definition.validate()?;
        let names = definition.inputs()
                              .iter()
                              .chain(definition.outputs().iter())
                              .map(String::as_str);
        let bound = BoundValues::new(definition.id(), names);
        Ok(Self { definition, bound })
    }

    pub fn id(&self) -> &str {
        self.definition.id()
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn inputs(&self) -> &[String] {
        self.definition.inputs()
    }

    pub fn outputs(&self) -> &[String] {
        self.definition.outputs()
    }

    pub fn bound(&self) -> &BoundValues {
        &self.bound
    }

    pub(crate) fn bind(&mut self, name: &str, value: Option<ParamValue>) {
        self.bound.bind(name, value);
    }

    pub(crate) fn clear_bindings(&mut self) {
        self.bound.clear();
    }

    /// Falla con `MissingParameterValue` si algún valor requerido está vacío.
    pub fn build_command(&self) -> Result<CommandDescription, FlowError> {
        self.definition.build_command(&self.bound)
    }
}
