//! Conjuntos de parámetros con nombres fijos.
//!
//! Un `ParameterSet` reemplaza el acceso dinámico por atributos: los nombres
//! se fijan en la construcción y cualquier nombre desconocido es un error
//! comprobado (`ParameterError::Unknown`), nunca una clave nueva silenciosa.

mod set;
mod value;

pub use set::{ParameterSet, ParameterSide};
pub use value::ParamValue;
