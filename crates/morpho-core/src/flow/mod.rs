//! StepFlow: grafo de dependencias fijo de un tipo de análisis.
//!
//! El cableado es por nombre y en orden de declaración:
//! 1. una entrada se liga a la entrada externa del mismo nombre, si existe;
//! 2. si no, a la salida ya ligada de un step anterior con ese nombre;
//! 3. si no, la definición está mal (`IncompleteWiring`).
//!
//! Toda salida de step se liga a la salida externa del mismo nombre. Como sólo
//! se consideran productores anteriores, ninguna salida puede alimentar a su
//! propio step ni a uno previo: el grafo resultante es un DAG.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::FlowError;
use crate::params::{ParamValue, ParameterSet};
use crate::step::{CommandDescription, Step, StepDefinition};

/// Origen del valor ligado a un parámetro de un step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingSource {
    ExternalInput,
    Upstream { step: String },
    ExternalOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub step: String,
    pub param: String,
    pub source: BindingSource,
}

#[derive(Debug)]
pub struct StepFlow {
    steps: Vec<Step>,
    bindings: Vec<Binding>,
    propagated: bool,
}

impl StepFlow {
    /// Construye el flow y valida lo que no depende de parámetros externos:
    /// solapamiento entrada/salida y productores duplicados.
    pub fn new(definitions: Vec<Box<dyn StepDefinition>>) -> Result<Self, FlowError> {
        let steps = definitions.into_iter().map(Step::new).collect::<Result<Vec<_>, _>>()?;
        let mut producers: HashMap<&str, &str> = HashMap::new();
        for step in &steps {
            for out in step.outputs() {
                if let Some(first) = producers.insert(out.as_str(), step.id()) {
                    return Err(FlowError::DuplicateProducer { param: out.clone(),
                                                              first: first.to_string(),
                                                              second: step.id().to_string() });
                }
            }
        }
        Ok(Self { steps,
                  bindings: Vec::new(),
                  propagated: false })
    }

    /// Liga cada entrada/salida de cada step. Determinista: con los mismos
    /// nombres externos produce siempre los mismos `bindings`.
    ///
    /// Si el cableado falla, el flow conserva el cableado anterior intacto.
    pub fn propagate(&mut self, inputs: &ParameterSet, outputs: &ParameterSet) -> Result<(), FlowError> {
        let mut staged: Vec<Vec<(String, Option<ParamValue>)>> = Vec::with_capacity(self.steps.len());
        let mut bindings = Vec::new();
        let mut produced: HashMap<&str, (usize, Option<ParamValue>)> = HashMap::new();

        for (idx, step) in self.steps.iter().enumerate() {
            let mut values = Vec::new();
            for name in step.inputs() {
                let (value, source) = if inputs.contains(name) {
                    (inputs.get(name).ok().flatten().cloned(), BindingSource::ExternalInput)
                } else if let Some((producer, value)) = produced.get(name.as_str()) {
                    (value.clone(), BindingSource::Upstream { step: self.steps[*producer].id().to_string() })
                } else {
                    return Err(FlowError::IncompleteWiring { step: step.id().to_string(),
                                                             param: name.clone() });
                };
                values.push((name.clone(), value));
                bindings.push(Binding { step: step.id().to_string(),
                                        param: name.clone(),
                                        source });
            }

            for name in step.outputs() {
                if !outputs.contains(name) {
                    return Err(FlowError::UnboundOutput { step: step.id().to_string(),
                                                          param: name.clone() });
                }
                let value = outputs.get(name).ok().flatten().cloned();
                values.push((name.clone(), value.clone()));
                bindings.push(Binding { step: step.id().to_string(),
                                        param: name.clone(),
                                        source: BindingSource::ExternalOutput });
                produced.insert(name.as_str(), (idx, value));
            }
            staged.push(values);
        }

        for (step, values) in self.steps.iter_mut().zip(staged) {
            step.clear_bindings();
            for (name, value) in values {
                step.bind(&name, value);
            }
        }
        self.bindings = bindings;
        debug!("propagated {} bindings over {} steps", self.bindings.len(), self.steps.len());
        self.propagated = true;
        Ok(())
    }

    pub fn is_propagated(&self) -> bool {
        self.propagated
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps de los que `step_id` consume alguna salida.
    pub fn upstream_of(&self, step_id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for b in self.bindings.iter().filter(|b| b.step == step_id) {
            if let BindingSource::Upstream { step } = &b.source {
                if !out.contains(&step.as_str()) {
                    out.push(step.as_str());
                }
            }
        }
        out
    }

    /// Comandos de todos los steps en orden; falla en el primer valor vacío.
    pub fn build_commands(&self) -> Result<Vec<CommandDescription>, FlowError> {
        self.steps.iter().map(Step::build_command).collect()
    }
}
