//! Políticas de nombres para los árboles de salida.

mod brainvisa;
mod flat;

pub use brainvisa::BrainvisaNaming;
pub use flat::FlatNaming;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use morpho_core::subject::split_image_name;
use morpho_core::{NamingError, Subject};

/// Extensiones reconocidas como imagen cruda al descubrir sujetos.
pub const IMAGE_EXTENSIONS: &[&str] = &["nii", "nii.gz", "ima", "ima.gz", "img", "mnc"];

pub fn is_image(path: &Path) -> bool {
    let (_, ext) = split_image_name(path);
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Nombre de archivo `<sujeto>.<ext>` de la imagen importada.
pub(crate) fn raw_file_name(subject: &Subject) -> String {
    match subject.image_extension() {
        ext if ext.is_empty() => subject.name.clone(),
        ext => format!("{}.{ext}", subject.name),
    }
}

/// Subcarpetas de `dir`, ordenadas por nombre.
pub(crate) fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, NamingError> {
    let entries = fs::read_dir(dir).map_err(|source| NamingError::Io { path: dir.to_path_buf(), source })?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| NamingError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Primera imagen de `dir` cuyo nombre sin extensión es `stem`.
pub(crate) fn find_image(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir).ok()?
                                                  .filter_map(Result::ok)
                                                  .map(|e| e.path())
                                                  .filter(|p| p.is_file() && is_image(p) && split_image_name(p).0 == stem)
                                                  .collect();
    found.sort();
    found.into_iter().next()
}

/// Recorre `<root>/<grupo>/<sujeto>/` y pide a `locate` la imagen de cada
/// sujeto; los directorios sin imagen se ignoran.
pub(crate) fn discover<F>(root: &Path, locate: F) -> Result<Vec<Subject>, NamingError>
    where F: Fn(&Path, &str) -> Option<PathBuf>
{
    if !root.is_dir() {
        return Err(NamingError::NotOrganized(root.to_path_buf()));
    }
    let mut subjects = Vec::new();
    for group_dir in sorted_subdirs(root)? {
        let group = dir_name(&group_dir);
        for subject_dir in sorted_subdirs(&group_dir)? {
            let name = dir_name(&subject_dir);
            match locate(&subject_dir, &name) {
                Some(image) => subjects.push(Subject::new(name, group.clone(), image)),
                None => debug!("skipping {}: no image", subject_dir.display()),
            }
        }
    }
    Ok(subjects)
}

fn dir_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}
