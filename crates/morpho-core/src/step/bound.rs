use indexmap::IndexMap;

use crate::errors::FlowError;
use crate::params::ParamValue;

/// Valores ligados a los nombres declarados de un step.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValues {
    step: String,
    values: IndexMap<String, Option<ParamValue>>,
}

impl BoundValues {
    pub(crate) fn new<'a>(step: &str, names: impl Iterator<Item = &'a str>) -> Self {
        Self { step: step.to_string(),
               values: names.map(|n| (n.to_string(), None)).collect() }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// Valor no vacío de `name`, o `MissingParameterValue`.
    pub fn require(&self, name: &str) -> Result<&ParamValue, FlowError> {
        match self.get(name) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(FlowError::MissingParameterValue { step: self.step.clone(),
                                                        param: name.to_string() }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ParamValue>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub(crate) fn bind(&mut self, name: &str, value: Option<ParamValue>) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        }
    }

    pub(crate) fn clear(&mut self) {
        for slot in self.values.values_mut() {
            *slot = None;
        }
    }
}
