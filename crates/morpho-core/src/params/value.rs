use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Valor ligado a un parámetro: ruta de archivo o escalar (número / texto).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Path(PathBuf),
    Scalar(Value),
}

impl ParamValue {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        ParamValue::Path(p.into())
    }

    pub fn scalar(v: impl Into<Value>) -> Self {
        ParamValue::Scalar(v.into())
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ParamValue::Path(p) => Some(p.as_path()),
            ParamValue::Scalar(_) => None,
        }
    }

    /// Un valor vacío cuenta como no asignado al construir comandos.
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Path(p) => p.as_os_str().is_empty(),
            ParamValue::Scalar(Value::Null) => true,
            ParamValue::Scalar(Value::String(s)) => s.is_empty(),
            ParamValue::Scalar(_) => false,
        }
    }

    /// Forma textual usada como argumento de línea de comandos.
    pub fn as_arg(&self) -> String {
        match self {
            ParamValue::Path(p) => p.display().to_string(),
            ParamValue::Scalar(Value::String(s)) => s.clone(),
            ParamValue::Scalar(v) => v.to_string(),
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            ParamValue::Path(p) => Value::String(p.to_string_lossy().into_owned()),
            ParamValue::Scalar(v) => v.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_arg())
    }
}

impl From<PathBuf> for ParamValue {
    fn from(p: PathBuf) -> Self {
        ParamValue::Path(p)
    }
}

impl From<&Path> for ParamValue {
    fn from(p: &Path) -> Self {
        ParamValue::Path(p.to_path_buf())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Scalar(Value::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_args_keep_their_natural_form() {
        assert_eq!(ParamValue::from(1.8).as_arg(), "1.8");
        assert_eq!(ParamValue::scalar("Watershed").as_arg(), "Watershed");
        assert_eq!(ParamValue::scalar(json!(3)).as_arg(), "3");
    }

    #[test]
    fn empty_values() {
        assert!(ParamValue::path("").is_empty());
        assert!(ParamValue::scalar(Value::Null).is_empty());
        assert!(!ParamValue::path("/tmp/a.nii").is_empty());
    }
}
