//! Archivo JSON de un estudio.
//!
//! Escritura atómica: se serializa a un temporal en el mismo directorio y se
//! renombra sobre el destino, así un corte a mitad de escritura deja intacto
//! el archivo anterior. Las claves salen ordenadas (diff estable).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use morpho_core::AnalysisRegistry;
use morpho_study::Study;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::StoreConfig;
use crate::error::PersistenceError;

#[derive(Debug, Clone, Default)]
pub struct JsonStudyFile {
    config: StoreConfig,
}

impl JsonStudyFile {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Ruta del archivo de estudio para un `outputdir`.
    pub fn default_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.config.file_name)
    }

    /// Guarda en `study.backup_filename()`.
    pub fn save(&self, study: &Study) -> Result<PathBuf, PersistenceError> {
        let path = study.backup_filename().to_path_buf();
        self.save_to(study, &path)?;
        Ok(path)
    }

    pub fn save_to(&self, study: &Study, path: &Path) -> Result<(), PersistenceError> {
        let bytes = self.render(&study.serialize(), path)?;
        let io = |source| PersistenceError::Io { path: path.to_path_buf(), source };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io)?;
        tmp.write_all(&bytes).map_err(io)?;
        tmp.as_file().sync_all().map_err(io)?;

        if self.config.keep_backup && path.exists() {
            let backup = backup_path(path);
            fs::copy(path, &backup).map_err(io)?;
            debug!("previous study kept as {}", backup.display());
        }
        tmp.persist(path).map_err(|e| io(e.error))?;
        info!("saved study '{}' to {}", study.name(), path.display());
        Ok(())
    }

    /// Carga y valida un estudio completo; nada parcial.
    pub fn load(&self, path: &Path, registry: &AnalysisRegistry) -> Result<Study, PersistenceError> {
        let text = fs::read_to_string(path).map_err(|source| PersistenceError::Io { path: path.to_path_buf(),
                                                                                    source })?;
        let tree: Value = serde_json::from_str(&text).map_err(|source| PersistenceError::Json { path: path.to_path_buf(),
                                                                                               source })?;
        let mut study =
            Study::from_serialized(&tree, registry).map_err(|source| PersistenceError::Malformed { path: path.to_path_buf(),
                                                                                                   source })?;
        study.set_backup_filename(path);
        info!("loaded study '{}' ({} subjects) from {}", study.name(), study.len(), path.display());
        Ok(study)
    }

    fn render(&self, tree: &Value, path: &Path) -> Result<Vec<u8>, PersistenceError> {
        let indent = vec![b' '; self.config.json_indent];
        let mut out = Vec::new();
        let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
        tree.serialize(&mut ser)
            .map_err(|source| PersistenceError::Json { path: path.to_path_buf(), source })?;
        out.push(b'\n');
        Ok(out)
    }
}

/// `study.json` -> `study.json.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}
