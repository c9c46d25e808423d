use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::FlowError;
use crate::flow::StepFlow;
use crate::naming::OutputFile;
use crate::params::ParameterSet;

/// Definición de un tipo de análisis: nombres declarados, flow y valores por
/// defecto. Se registra una vez por tipo (no por sujeto).
pub trait AnalysisBlueprint: Send + Sync + fmt::Debug {
    /// Nombre persistido como `analysis_type`.
    fn name(&self) -> &str;

    /// Conjunto de entrada vacío con los nombres declarados.
    fn input_parameters(&self) -> ParameterSet;

    fn output_files(&self) -> &[OutputFile];

    /// Flow nuevo, sin propagar.
    fn build_flow(&self) -> Result<StepFlow, FlowError>;

    /// Parámetro de entrada que recibe la imagen cruda importada.
    fn raw_input_name(&self) -> &str;

    /// Entradas por defecto para una imagen cruda ubicada en `raw_path`.
    fn default_inputs(&self, raw_path: &Path) -> ParameterSet;

    /// Archivos compañeros de la imagen cruda: `(parámetro, extensión)`. Se
    /// buscan junto a la imagen original y se importan si existen.
    fn companion_inputs(&self) -> &[(&'static str, &'static str)] {
        &[]
    }

    fn output_parameters(&self) -> ParameterSet {
        ParameterSet::output(self.output_files().iter().map(|f| f.name))
    }
}

/// Copia prevista por `Analysis::import_plan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub param: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// La imagen cruda es obligatoria; los compañeros se copian si existen.
    pub required: bool,
}
