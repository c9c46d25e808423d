use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{BoundValues, StepDefinition};
use crate::errors::FlowError;

/// Descripción opaca de un comando externo ejecutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescription {
    pub step_id: String,
    pub program: String,
    pub args: Vec<String>,
    /// Rutas que el comando debe producir (salidas ligadas del step).
    pub outputs: Vec<PathBuf>,
}

impl fmt::Display for CommandDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            write!(f, " {a}")?;
        }
        Ok(())
    }
}

/// Pieza de la línea de comandos de un `CommandStep`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Texto fijo (flags, modos).
    Literal(String),
    /// Valor ligado del parámetro con ese nombre.
    Param(String),
}

/// Step declarativo: un programa y sus argumentos en función de parámetros.
#[derive(Debug, Clone)]
pub struct CommandStep {
    id: String,
    program: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    args: Vec<Arg>,
}

impl CommandStep {
    pub fn new(id: impl Into<String>, program: impl Into<String>) -> Self {
        Self { id: id.into(),
               program: program.into(),
               inputs: Vec::new(),
               outputs: Vec::new(),
               args: Vec::new() }
    }

    pub fn inputs<I>(mut self, names: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        self.inputs.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn outputs<I>(mut self, names: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        self.outputs.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn arg(mut self, literal: impl Into<String>) -> Self {
        self.args.push(Arg::Literal(literal.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.args.push(Arg::Param(name.into()));
        self
    }

    /// Atajo para `flag valor-del-parámetro`.
    pub fn opt(self, flag: impl Into<String>, name: impl Into<String>) -> Self {
        self.arg(flag).param(name)
    }
}

impl StepDefinition for CommandStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn validate(&self) -> Result<(), FlowError> {
        for a in &self.args {
            if let Arg::Param(name) = a {
                if !self.inputs.contains(name) && !self.outputs.contains(name) {
                    return Err(FlowError::IncompleteWiring { step: self.id.clone(),
                                                             param: name.clone() });
                }
            }
        }
        Ok(())
    }

    fn build_command(&self, bound: &BoundValues) -> Result<CommandDescription, FlowError> {
        // Todas las declaradas, no sólo las usadas en args.
        for name in self.inputs.iter().chain(self.outputs.iter()) {
            bound.require(name)?;
        }
        let args = self.args
                       .iter()
                       .map(|a| match a {
                           Arg::Literal(s) => Ok(s.clone()),
                           Arg::Param(name) => bound.require(name).map(|v| v.as_arg()),
                       })
                       .collect::<Result<Vec<_>, _>>()?;
        let outputs = self.outputs
                          .iter()
                          .filter_map(|o| bound.get(o).and_then(|v| v.as_path()).map(|p| p.to_path_buf()))
                          .collect();
        Ok(CommandDescription { step_id: self.id.clone(),
                                program: self.program.clone(),
                                args,
                                outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use crate::step::Step;

    fn copy_step() -> CommandStep {
        CommandStep::new("copy", "cp").inputs(["src"]).outputs(["dst"]).param("src").param("dst")
    }

    #[test]
    fn command_uses_bound_values() {
        let mut step = Step::new(Box::new(copy_step())).unwrap();
        step.bind("src", Some(ParamValue::path("/a")));
        step.bind("dst", Some(ParamValue::path("/b")));
        let cmd = step.build_command().unwrap();
        assert_eq!(cmd.to_string(), "cp /a /b");
        assert_eq!(cmd.outputs, vec![PathBuf::from("/b")]);
    }

    #[test]
    fn unset_value_fails_fast() {
        let mut step = Step::new(Box::new(copy_step())).unwrap();
        step.bind("dst", Some(ParamValue::path("/b")));
        let err = step.build_command().unwrap_err();
        assert_eq!(err, FlowError::MissingParameterValue { step: "copy".into(), param: "src".into() });
    }

    #[test]
    fn undeclared_param_reference_is_structural() {
        let def = CommandStep::new("bad", "x").inputs(["a"]).param("b");
        let err = Step::new(Box::new(def)).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn input_output_overlap_is_rejected() {
        let def = CommandStep::new("loop", "x").inputs(["a"]).outputs(["a"]);
        assert!(matches!(Step::new(Box::new(def)), Err(FlowError::OverlappingParameters { .. })));
    }
}
