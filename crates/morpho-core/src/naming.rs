//! Política de nombres: `(raíz de salida, sujeto) -> rutas`.
//!
//! El core sólo depende de que, para una raíz y un sujeto, la política
//! produzca una ruta estable por cada parámetro de salida declarado. El
//! anidamiento concreto de carpetas lo decide cada implementación.

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::params::{ParamValue, ParameterSet};
use crate::subject::Subject;

/// Archivo de salida declarado por un tipo de análisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFile {
    /// Nombre del parámetro de salida.
    pub name: &'static str,
    /// Prefijo del archivo (`nobias` -> `nobias_<sujeto>.<ext>`).
    pub prefix: &'static str,
    pub extension: &'static str,
    /// Subcarpeta lógica (p. ej. `segmentation`); la política decide si la usa.
    pub group: Option<&'static str>,
}

impl OutputFile {
    pub fn file_name(&self, subject: &Subject) -> String {
        format!("{}_{}.{}", self.prefix, subject.name, self.extension)
    }
}

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{0}' is not an organized directory")]
    NotOrganized(PathBuf),
}

pub trait NamingPolicy: Send + Sync + fmt::Debug {
    /// Nombre con el que se registra y se persiste la política.
    fn name(&self) -> &str;

    /// Carpeta propia del sujeto bajo `root`.
    fn subject_dir(&self, root: &Path, subject: &Subject) -> PathBuf;

    /// Destino de la imagen cruda importada.
    fn raw_input_path(&self, root: &Path, subject: &Subject) -> PathBuf;

    fn output_path(&self, root: &Path, subject: &Subject, file: &OutputFile) -> PathBuf;

    /// Sujetos ya organizados bajo `root` (para abrir un directorio existente).
    fn discover_subjects(&self, root: &Path) -> Result<Vec<Subject>, NamingError>;

    /// Borra el árbol del sujeto; tolera que ya no exista.
    fn remove_subject_dirs(&self, root: &Path, subject: &Subject) -> Result<(), NamingError> {
        let dir = self.subject_dir(root, subject);
        debug!("removing subject tree {}", dir.display());
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(NamingError::Io { path: dir, source }),
        }
    }

    /// Conjunto de salida con una ruta por archivo declarado.
    fn output_parameters(&self, root: &Path, subject: &Subject, files: &[OutputFile]) -> ParameterSet {
        let mut out = ParameterSet::output(files.iter().map(|f| f.name));
        for f in files {
            // Los nombres vienen de `files`: no puede fallar.
            let _ = out.set(f.name, ParamValue::Path(self.output_path(root, subject, f)));
        }
        out
    }
}
