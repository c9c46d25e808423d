//! Contrato del colaborador de visualización: a partir de la ruta de una
//! salida terminada devuelve un objeto tipado en memoria. El core nunca crea
//! ni guarda esos objetos.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{path}' line {line}: {reason}")]
    Parse { path: PathBuf, line: usize, reason: String },
    #[error("output '{0}' has not been produced yet")]
    NotFinished(String),
}

pub trait ResultLoader {
    type Object;

    fn load(&self, path: &Path) -> Result<Self::Object, LoadError>;
}
