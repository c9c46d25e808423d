//! Identidad de un sujeto dentro de un estudio.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GROUP;

/// Extensiones compuestas que no deben partirse en el último punto.
const COMPOUND_EXTENSIONS: &[&str] = &["nii.gz", "ima.gz"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "subjectname")]
    pub name: String,
    pub groupname: String,
    /// Imagen cruda; tras la importación apunta a la copia gestionada.
    pub filename: PathBuf,
}

impl Subject {
    pub fn new(name: impl Into<String>, groupname: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        Self { name: name.into(),
               groupname: groupname.into(),
               filename: filename.into() }
    }

    /// Sujeto cuyo nombre es el nombre de archivo sin extensión.
    pub fn from_filename(filename: impl Into<PathBuf>, groupname: Option<&str>) -> Self {
        let filename = filename.into();
        let (stem, _) = split_image_name(&filename);
        Self::new(stem, groupname.unwrap_or(DEFAULT_GROUP), filename)
    }

    /// Identificador estable y único dentro de un estudio.
    pub fn id(&self) -> String {
        format!("{}-{}", self.groupname, self.name)
    }

    /// Extensión de la imagen cruda (`nii.gz`, `nii`, `ima`...), vacía si no hay.
    pub fn image_extension(&self) -> String {
        split_image_name(&self.filename).1
    }
}

/// Separa `dir/s1.nii.gz` en `("s1", "nii.gz")`.
pub fn split_image_name(path: &Path) -> (String, String) {
    let file_name = path.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
    for ext in COMPOUND_EXTENSIONS {
        if let Some(stem) = file_name.strip_suffix(&format!(".{ext}")) {
            return (stem.to_string(), ext.to_string());
        }
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), ext.to_string()),
        _ => (file_name, String::new()),
    }
}
