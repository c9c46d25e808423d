//! Study: sujetos y sus análisis, indexados por id de sujeto.
//!
//! Invariante: `subjects` y `analyses` tienen siempre exactamente las mismas
//! claves, en el mismo orden de alta.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info, warn};
use morpho_core::constants::DEFAULT_BACKUP_FILE_NAME;
use morpho_core::{Analysis, AnalysisBlueprint, AnalysisRegistry, NamingPolicy, ParameterSet, Subject};
use serde_json::{json, Map, Value};

use crate::error::{StudyError, StudySerializationError};
use crate::selection::Selection;

#[derive(Debug)]
pub struct Study {
    name: String,
    output_dir: PathBuf,
    backup_filename: PathBuf,
    blueprint: Arc<dyn AnalysisBlueprint>,
    naming: Arc<dyn NamingPolicy>,
    subjects: IndexMap<String, Subject>,
    analyses: IndexMap<String, Analysis>,
}

impl Study {
    pub fn new(name: impl Into<String>,
               output_dir: impl Into<PathBuf>,
               blueprint: Arc<dyn AnalysisBlueprint>,
               naming: Arc<dyn NamingPolicy>)
               -> Self {
        let output_dir = output_dir.into();
        Self { name: name.into(),
               backup_filename: output_dir.join(DEFAULT_BACKUP_FILE_NAME),
               output_dir,
               blueprint,
               naming,
               subjects: IndexMap::new(),
               analyses: IndexMap::new() }
    }

    /// Estudio vacío con el tipo de análisis y la política buscados por nombre.
    pub fn from_registry(name: impl Into<String>,
                         output_dir: impl Into<PathBuf>,
                         registry: &AnalysisRegistry,
                         analysis_type: &str,
                         parameter_template: &str)
                         -> Result<Self, StudyError> {
        let blueprint = registry.analysis(analysis_type)?;
        let naming = registry.naming(parameter_template)?;
        Ok(Self::new(name, output_dir, blueprint, naming))
    }

    /// Abre un directorio ya organizado por `naming`: cada sujeto encontrado
    /// se agrega sin importar (sus archivos ya están en su sitio).
    pub fn from_organized_directory(name: impl Into<String>,
                                    output_dir: impl Into<PathBuf>,
                                    blueprint: Arc<dyn AnalysisBlueprint>,
                                    naming: Arc<dyn NamingPolicy>)
                                    -> Result<Self, StudyError> {
        let mut study = Self::new(name, output_dir, blueprint, naming);
        let found = study.naming.discover_subjects(&study.output_dir)?;
        info!("found {} organized subjects in {}", found.len(), study.output_dir.display());
        for subject in found {
            study.add_subject(subject, false)?;
        }
        Ok(study)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Archivo donde se persiste el estudio.
    pub fn backup_filename(&self) -> &Path {
        &self.backup_filename
    }

    pub fn set_backup_filename(&mut self, path: impl Into<PathBuf>) {
        self.backup_filename = path.into();
    }

    pub fn analysis_type(&self) -> &str {
        self.blueprint.name()
    }

    pub fn parameter_template(&self) -> &str {
        self.naming.name()
    }

    pub fn blueprint(&self) -> &Arc<dyn AnalysisBlueprint> {
        &self.blueprint
    }

    pub fn naming(&self) -> &Arc<dyn NamingPolicy> {
        &self.naming
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn has_subjects(&self) -> bool {
        !self.subjects.is_empty()
    }

    pub fn subject_ids(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    pub fn subjects(&self) -> impl Iterator<Item = (&str, &Subject)> {
        self.subjects.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn analysis(&self, id: &str) -> Option<&Analysis> {
        self.analyses.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subjects.contains_key(id)
    }

    /// Agrega el sujeto con su análisis y, si `import_data`, copia su imagen
    /// cruda al árbol gestionado.
    ///
    /// Si la importación falla, el estudio queda exactamente como antes de la
    /// llamada y el error se devuelve al llamador.
    pub fn add_subject(&mut self, subject: Subject, import_data: bool) -> Result<String, StudyError> {
        let id = subject.id();
        if self.subjects.contains_key(&id) {
            return Err(StudyError::SubjectExists(id));
        }
        let raw_path = if import_data {
            self.naming.raw_input_path(&self.output_dir, &subject)
        } else {
            subject.filename.clone()
        };
        let mut analysis = Analysis::new(Arc::clone(&self.blueprint), Arc::clone(&self.naming))?;
        analysis.set_parameters(self.blueprint.default_inputs(&raw_path), &self.output_dir, &subject)?;

        self.subjects.insert(id.clone(), subject);
        self.analyses.insert(id.clone(), analysis);
        debug!("added subject {id}");

        if import_data {
            let imported = match (self.analyses.get(&id), self.subjects.get(&id)) {
                (Some(analysis), Some(subject)) => analysis.import_data(subject),
                _ => return Err(StudyError::UnknownSubject(id)),
            };
            match imported {
                Ok(path) => {
                    if let Some(s) = self.subjects.get_mut(&id) {
                        s.filename = path;
                    }
                }
                Err(source) => {
                    self.subjects.shift_remove(&id);
                    self.analyses.shift_remove(&id);
                    warn!("import of {id} failed, subject rolled back: {source}");
                    return Err(StudyError::Importation { subject: id, source });
                }
            }
        }
        Ok(id)
    }

    /// Quita el sujeto y su análisis; los archivos quedan en disco.
    pub fn remove_subject(&mut self, id: &str) -> Result<Subject, StudyError> {
        let subject = self.subjects
                          .shift_remove(id)
                          .ok_or_else(|| StudyError::UnknownSubject(id.to_string()))?;
        self.analyses.shift_remove(id);
        debug!("removed subject {id}");
        Ok(subject)
    }

    /// Igual que `remove_subject`, borrando además el árbol del sujeto.
    pub fn remove_subject_and_files(&mut self, id: &str) -> Result<Subject, StudyError> {
        let subject = self.subject(id)
                          .ok_or_else(|| StudyError::UnknownSubject(id.to_string()))?;
        self.naming.remove_subject_dirs(&self.output_dir, subject)?;
        self.remove_subject(id)
    }

    /// Reemplaza las entradas de un sujeto y re-deriva su cableado.
    pub fn set_subject_parameters(&mut self, id: &str, inputs: ParameterSet) -> Result<(), StudyError> {
        let subject = self.subjects
                          .get(id)
                          .ok_or_else(|| StudyError::UnknownSubject(id.to_string()))?;
        let analysis = self.analyses
                           .get_mut(id)
                           .ok_or_else(|| StudyError::UnknownSubject(id.to_string()))?;
        analysis.set_parameters(inputs, &self.output_dir, subject)?;
        Ok(())
    }

    /// Ids de la selección, validados todos antes de devolver nada.
    pub fn select(&self, selection: &Selection) -> Result<Vec<String>, StudyError> {
        match selection {
            Selection::All => Ok(self.subjects.keys().cloned().collect()),
            Selection::Only(ids) => {
                if let Some(unknown) = ids.iter().find(|id| !self.subjects.contains_key(id.as_str())) {
                    return Err(StudyError::UnknownSubject(unknown.clone()));
                }
                Ok(ids.clone())
            }
        }
    }

    fn selected_analyses(&self, selection: &Selection) -> Result<Vec<&Analysis>, StudyError> {
        self.select(selection)?
            .iter()
            .map(|id| {
                self.analyses
                    .get(id)
                    .ok_or_else(|| StudyError::UnknownSubject(id.clone()))
            })
            .collect()
    }

    /// `true` en cuanto un análisis seleccionado tiene alguna salida.
    pub fn has_some_results(&self, selection: &Selection) -> Result<bool, StudyError> {
        Ok(self.selected_analyses(selection)?.iter().any(|a| a.has_some_results()))
    }

    /// `false` en cuanto a un análisis seleccionado le falta alguna salida.
    pub fn has_all_results(&self, selection: &Selection) -> Result<bool, StudyError> {
        Ok(self.selected_analyses(selection)?.iter().all(|a| a.has_all_results()))
    }

    /// Borra las salidas de la selección; devuelve cuántos archivos borró.
    pub fn clear_results(&self, selection: &Selection) -> Result<usize, StudyError> {
        let mut removed = 0;
        for analysis in self.selected_analyses(selection)? {
            removed += analysis.clear_results()?;
        }
        Ok(removed)
    }

    /// Árbol persistible. Sólo valores de parámetros: el cableado se vuelve a
    /// derivar del tipo de análisis al cargar.
    pub fn serialize(&self) -> Value {
        let mut subjects = Map::new();
        let mut inputs = Map::new();
        let mut outputs = Map::new();
        for (id, subject) in &self.subjects {
            subjects.insert(id.clone(),
                            json!({
                                "subjectname": subject.name,
                                "groupname": subject.groupname,
                                "filename": subject.filename.to_string_lossy(),
                            }));
            if let Some(analysis) = self.analyses.get(id) {
                inputs.insert(id.clone(), analysis.inputs().serialize());
                outputs.insert(id.clone(), analysis.outputs().serialize());
            }
        }
        json!({
            "name": self.name,
            "outputdir": self.output_dir.to_string_lossy(),
            "backup_filename": self.backup_filename.to_string_lossy(),
            "analysis_type": self.analysis_type(),
            "parameter_template": self.parameter_template(),
            "subjects": subjects,
            "inputs": inputs,
            "outputs": outputs,
        })
    }

    /// Reconstruye un estudio desde `serialize`. Cualquier registro parcial o
    /// inconsistente hace fallar la carga entera.
    pub fn from_serialized(tree: &Value, registry: &AnalysisRegistry) -> Result<Study, StudySerializationError> {
        let root = tree.as_object().ok_or(StudySerializationError::NotAnObject)?;
        let name = str_field(root, "name")?;
        let output_dir = PathBuf::from(str_field(root, "outputdir")?);
        let blueprint = registry.analysis(str_field(root, "analysis_type")?)?;
        let naming = registry.naming(str_field(root, "parameter_template")?)?;
        let subjects = object_field(root, "subjects")?;
        let inputs = object_field(root, "inputs")?;
        let outputs = object_field(root, "outputs")?;

        for (section, records) in [("inputs", inputs), ("outputs", outputs)] {
            if let Some(orphan) = records.keys().find(|k| !subjects.contains_key(k.as_str())) {
                return Err(StudySerializationError::OrphanRecord { id: orphan.clone(), section });
            }
        }

        let mut study = Study::new(name, output_dir, blueprint, naming);
        if let Some(backup) = root.get("backup_filename").and_then(Value::as_str) {
            study.backup_filename = PathBuf::from(backup);
        }
        let declared_inputs = study.blueprint.input_parameters();
        let declared_outputs = study.blueprint.output_parameters();

        for (key, record) in subjects {
            let subject: Subject =
                serde_json::from_value(record.clone()).map_err(|e| StudySerializationError::Subject { key: key.clone(),
                                                                                                     reason: e.to_string() })?;
            let id = subject.id();
            if &id != key {
                return Err(StudySerializationError::KeyMismatch { key: key.clone(), id });
            }
            let input_tree = inputs.get(key)
                                   .ok_or_else(|| StudySerializationError::MissingRecord { id: id.clone(),
                                                                                           section: "inputs" })?;
            let output_tree = outputs.get(key)
                                     .ok_or_else(|| StudySerializationError::MissingRecord { id: id.clone(),
                                                                                             section: "outputs" })?;
            let params = |source| StudySerializationError::Parameters { id: id.clone(), source };
            let input_set = ParameterSet::from_serialized(&declared_inputs, input_tree).map_err(params)?;
            let output_set = ParameterSet::from_serialized(&declared_outputs, output_tree).map_err(params)?;

            let analysis_err = |source| StudySerializationError::Analysis { id: id.clone(), source };
            let mut analysis = Analysis::new(Arc::clone(&study.blueprint), Arc::clone(&study.naming)).map_err(analysis_err)?;
            analysis.restore_parameters(input_set, output_set).map_err(analysis_err)?;

            study.subjects.insert(id.clone(), subject);
            study.analyses.insert(id, analysis);
        }
        debug!("restored study '{}' with {} subjects", study.name, study.len());
        Ok(study)
    }
}

fn str_field<'a>(root: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, StudySerializationError> {
    root.get(key).and_then(Value::as_str).ok_or(StudySerializationError::Field(key))
}

fn object_field<'a>(root: &'a Map<String, Value>,
                    key: &'static str)
                    -> Result<&'a Map<String, Value>, StudySerializationError> {
    root.get(key).and_then(Value::as_object).ok_or(StudySerializationError::Field(key))
}
