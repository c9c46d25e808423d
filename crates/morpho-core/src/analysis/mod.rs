//! Analysis: un StepFlow ligado a los parámetros concretos de un sujeto.
//!
//! No guarda estado de ejecución (eso es del `Runner`). Sólo se modifica con
//! `set_parameters` / `restore_parameters` e `import_data`.

mod blueprint;
mod registry;

pub use blueprint::{AnalysisBlueprint, ImportItem};
pub use registry::AnalysisRegistry;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::errors::{AnalysisError, FlowError, ParameterError};
use crate::flow::StepFlow;
use crate::naming::NamingPolicy;
use crate::params::ParameterSet;
use crate::step::CommandDescription;
use crate::subject::{split_image_name, Subject};

#[derive(Debug)]
pub struct Analysis {
    blueprint: Arc<dyn AnalysisBlueprint>,
    naming: Arc<dyn NamingPolicy>,
    flow: StepFlow,
    inputs: ParameterSet,
    outputs: ParameterSet,
}

impl Analysis {
    /// Análisis sin valores: el flow queda propagado con los nombres
    /// declarados, así un error estructural aparece aquí y no al ejecutar.
    pub fn new(blueprint: Arc<dyn AnalysisBlueprint>, naming: Arc<dyn NamingPolicy>) -> Result<Self, AnalysisError> {
        let inputs = blueprint.input_parameters();
        let outputs = blueprint.output_parameters();
        let mut flow = blueprint.build_flow()?;
        flow.propagate(&inputs, &outputs)?;
        Ok(Self { blueprint,
                  naming,
                  flow,
                  inputs,
                  outputs })
    }

    /// Liga las entradas del sujeto, deriva las salidas con la política de
    /// nombres y vuelve a cablear el flow.
    pub fn set_parameters(&mut self,
                          inputs: ParameterSet,
                          output_root: &Path,
                          subject: &Subject)
                          -> Result<(), AnalysisError> {
        let outputs = self.naming.output_parameters(output_root, subject, self.blueprint.output_files());
        self.restore_parameters(inputs, outputs)
    }

    /// Reemplaza ambos conjuntos tal cual (p. ej. al cargar un estudio) y
    /// re-deriva el cableado. Si falla, el análisis queda como estaba.
    pub fn restore_parameters(&mut self, inputs: ParameterSet, outputs: ParameterSet) -> Result<(), AnalysisError> {
        if !inputs.same_declaration(&self.blueprint.input_parameters()) {
            return Err(ParameterError::Malformed(format!("input names do not match analysis type '{}'",
                                                         self.blueprint.name())).into());
        }
        if !outputs.same_declaration(&self.blueprint.output_parameters()) {
            return Err(ParameterError::Malformed(format!("output names do not match analysis type '{}'",
                                                         self.blueprint.name())).into());
        }
        let mut flow = self.blueprint.build_flow()?;
        flow.propagate(&inputs, &outputs)?;
        self.flow = flow;
        self.inputs = inputs;
        self.outputs = outputs;
        Ok(())
    }

    pub fn analysis_type(&self) -> &str {
        self.blueprint.name()
    }

    pub fn blueprint(&self) -> &Arc<dyn AnalysisBlueprint> {
        &self.blueprint
    }

    pub fn naming(&self) -> &Arc<dyn NamingPolicy> {
        &self.naming
    }

    pub fn inputs(&self) -> &ParameterSet {
        &self.inputs
    }

    pub fn outputs(&self) -> &ParameterSet {
        &self.outputs
    }

    pub fn flow(&self) -> &StepFlow {
        &self.flow
    }

    /// Copias que haría `import_data` para `subject`.
    pub fn import_plan(&self, subject: &Subject) -> Result<Vec<ImportItem>, AnalysisError> {
        let raw_name = self.blueprint.raw_input_name();
        let destination = self.inputs
                              .get_path(raw_name)?
                              .ok_or_else(|| AnalysisError::Importation { source_path: subject.filename.clone(),
                                                                          reason: format!("'{raw_name}' has no destination") })?
                              .to_path_buf();
        let mut plan = vec![ImportItem { param: raw_name.to_string(),
                                         source: subject.filename.clone(),
                                         destination,
                                         required: true }];
        let (stem, _) = split_image_name(&subject.filename);
        for (param, ext) in self.blueprint.companion_inputs() {
            if let Some(dest) = self.inputs.get_path(param)? {
                plan.push(ImportItem { param: param.to_string(),
                                       source: subject.filename.with_file_name(format!("{stem}.{ext}")),
                                       destination: dest.to_path_buf(),
                                       required: false });
            }
        }
        Ok(plan)
    }

    /// Copia la imagen cruda (y sus compañeros existentes) al árbol gestionado
    /// y devuelve la nueva ruta canónica de la imagen.
    pub fn import_data(&self, subject: &Subject) -> Result<PathBuf, AnalysisError> {
        let plan = self.import_plan(subject)?;
        let mut raw_destination = None;
        let mut copied: Vec<PathBuf> = Vec::new();
        for item in plan {
            if !item.required && !item.source.exists() {
                debug!("no companion '{}' for {}", item.param, subject.id());
                continue;
            }
            if let Err(e) = copy_into_place(&item.source, &item.destination) {
                discard_copies(&copied);
                return Err(AnalysisError::Importation { source_path: item.source.clone(),
                                                        reason: e.to_string() });
            }
            if item.source != item.destination {
                copied.push(item.destination.clone());
            }
            if item.required {
                raw_destination = Some(item.destination);
            }
        }
        let raw = raw_destination.ok_or_else(|| AnalysisError::Importation { source_path: subject.filename.clone(),
                                                                             reason: "nothing imported".into() })?;
        info!("imported {} -> {}", subject.filename.display(), raw.display());
        Ok(raw)
    }

    /// Al menos un archivo de salida declarado existe.
    pub fn has_some_results(&self) -> bool {
        !self.outputs.list_existing_files().is_empty()
    }

    /// Todos los archivos de salida declarados existen.
    pub fn has_all_results(&self) -> bool {
        self.outputs.file_names().iter().all(|n| {
                                            matches!(self.outputs.get_path(n), Ok(Some(p)) if p.exists())
                                        })
    }

    /// Borra cada salida existente; idempotente. Devuelve cuántos archivos
    /// se borraron.
    pub fn clear_results(&self) -> Result<usize, AnalysisError> {
        let mut removed = 0;
        for path in self.outputs.list_existing_files() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(AnalysisError::Io { path, source }),
            }
        }
        if removed > 0 {
            debug!("cleared {removed} output files");
        }
        Ok(removed)
    }

    /// Entradas de archivo ausentes en disco (o sin asignar).
    pub fn missing_input_files(&self) -> Vec<PathBuf> {
        self.inputs.list_missing_files()
    }

    /// Crea las carpetas padre de cada salida.
    pub fn prepare_output_dirs(&self) -> Result<(), AnalysisError> {
        for (_, path) in self.outputs.file_paths() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| AnalysisError::Io { path: parent.to_path_buf(), source })?;
            }
        }
        Ok(())
    }

    /// Ruta de una salida terminada, sólo si el archivo existe. Es lo que
    /// consume un cargador de visualización.
    pub fn finished_output(&self, name: &str) -> Result<Option<PathBuf>, ParameterError> {
        Ok(self.outputs.get_path(name)?.filter(|p| p.exists()).map(Path::to_path_buf))
    }

    pub fn commands(&self) -> Result<Vec<CommandDescription>, FlowError> {
        self.flow.build_commands()
    }
}

/// Deshace una importación a medias; los archivos ya ausentes se ignoran.
fn discard_copies(copied: &[PathBuf]) {
    for path in copied {
        match fs::remove_file(path) {
            Ok(()) => debug!("discarded partial import {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("cannot discard partial import {}: {e}", path.display()),
        }
    }
}

fn copy_into_place(source: &Path, destination: &Path) -> std::io::Result<()> {
    if source == destination {
        return Ok(());
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, destination).map(|_| ())
}
