//! Workspace: configuración, registro de tipos y store reunidos para abrir,
//! crear y guardar estudios por nombre o por ruta.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use morpho_adapters::naming::is_image;
use morpho_adapters::{default_registry, LocalProcessEngine, SimulatedEngine};
use morpho_core::{AnalysisRegistry, ExecutionEngine, Subject};
use morpho_persistence::JsonStudyFile;
use morpho_study::{Study, StudyError};

use crate::config::{AppConfig, EngineKind, CONFIG};
use crate::errors::AppError;

#[derive(Debug)]
pub struct Workspace {
    config: AppConfig,
    store: JsonStudyFile,
    registry: AnalysisRegistry,
}

impl Workspace {
    /// Falla si algún tipo de análisis incluido está mal definido.
    pub fn new(config: AppConfig, store: JsonStudyFile) -> Result<Self, AppError> {
        Ok(Self { config,
                  store,
                  registry: default_registry()? })
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::new(CONFIG.clone(), JsonStudyFile::from_env())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &AnalysisRegistry {
        &self.registry
    }

    /// `locator` puede ser un archivo de estudio, la carpeta de un estudio o el
    /// nombre de un estudio bajo `studies_dir`.
    pub fn study_file(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        if path.is_file() {
            path.to_path_buf()
        } else if path.is_dir() {
            self.store.default_path(path)
        } else {
            self.store.default_path(&self.config.studies_dir.join(locator))
        }
    }

    pub fn create_study(&self,
                        name: &str,
                        output_dir: Option<PathBuf>,
                        analysis_type: Option<&str>,
                        parameter_template: Option<&str>,
                        from_directory: bool)
                        -> Result<Study, AppError> {
        let output_dir = output_dir.unwrap_or_else(|| self.config.studies_dir.join(name));
        let file = self.store.default_path(&output_dir);
        if file.exists() {
            return Err(AppError::StudyExists(file));
        }
        let blueprint = self.registry.analysis(analysis_type.unwrap_or(self.config.analysis_type.as_str()))?;
        let naming = self.registry
                         .naming(parameter_template.unwrap_or(self.config.parameter_template.as_str()))?;
        let mut study = if from_directory {
            Study::from_organized_directory(name, output_dir, blueprint, naming)?
        } else {
            Study::new(name, output_dir, blueprint, naming)
        };
        study.set_backup_filename(file);
        self.save(&study)?;
        Ok(study)
    }

    pub fn open(&self, locator: &str) -> Result<Study, AppError> {
        let path = self.study_file(locator);
        if !path.exists() {
            return Err(AppError::StudyNotFound(path));
        }
        Ok(self.store.load(&path, &self.registry)?)
    }

    pub fn save(&self, study: &Study) -> Result<PathBuf, AppError> {
        Ok(self.store.save(study)?)
    }

    pub fn engine(&self, simulate: bool) -> Arc<dyn ExecutionEngine> {
        match (simulate, self.config.engine) {
            (true, _) | (false, EngineKind::Simulated) => Arc::new(SimulatedEngine::new()),
            (false, EngineKind::Local) => Arc::new(LocalProcessEngine::new()),
        }
    }

    /// Agrega cada imagen como un sujeto. Un fallo no detiene al resto; cada
    /// imagen recibe su propio resultado.
    pub fn add_images(&self,
                      study: &mut Study,
                      images: &[PathBuf],
                      group: Option<&str>,
                      import_data: bool)
                      -> Vec<(PathBuf, Result<String, StudyError>)> {
        images.iter()
              .map(|img| {
                  let result = study.add_subject(Subject::from_filename(img, group), import_data);
                  match &result {
                      Ok(id) => info!("added {id} from {}", img.display()),
                      Err(e) => warn!("cannot add {}: {e}", img.display()),
                  }
                  (img.clone(), result)
              })
              .collect()
    }
}

/// Imágenes directamente dentro de `dir`, ordenadas.
pub fn images_in(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let io = |source| AppError::Io { path: dir.to_path_buf(), source };
    let mut images = Vec::new();
    for entry in fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        if path.is_file() && is_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}
