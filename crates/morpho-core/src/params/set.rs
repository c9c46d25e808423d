use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::ParamValue;
use crate::errors::ParameterError;

/// Lado del análisis al que pertenece un conjunto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSide {
    /// Entradas externas: archivos y escalares (umbrales, factores...).
    Input,
    /// Salidas: cada valor es una ruta que el pipeline debe producir.
    Output,
}

/// Mapping ordenado `nombre -> valor` con nombres fijos.
///
/// Invariante: las claves de `values` son exactamente `file_names` seguidas de
/// `other_names`, en orden de declaración, durante toda la vida del conjunto.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    side: ParameterSide,
    file_names: Vec<String>,
    other_names: Vec<String>,
    values: IndexMap<String, Option<ParamValue>>,
}

impl ParameterSet {
    /// Conjunto de entrada vacío con nombres de archivo y de escalares.
    pub fn input<F, O>(file_names: F, other_names: O) -> Self
        where F: IntoIterator,
              F::Item: Into<String>,
              O: IntoIterator,
              O::Item: Into<String>
    {
        Self::with_names(ParameterSide::Input,
                         file_names.into_iter().map(Into::into).collect(),
                         other_names.into_iter().map(Into::into).collect())
    }

    /// Conjunto de salida vacío: sólo nombres de archivo.
    pub fn output<F>(file_names: F) -> Self
        where F: IntoIterator,
              F::Item: Into<String>
    {
        Self::with_names(ParameterSide::Output, file_names.into_iter().map(Into::into).collect(), Vec::new())
    }

    fn with_names(side: ParameterSide, file_names: Vec<String>, other_names: Vec<String>) -> Self {
        let values = file_names.iter()
                               .chain(other_names.iter())
                               .map(|n| (n.clone(), None))
                               .collect();
        Self { side,
               file_names,
               other_names,
               values }
    }

    pub fn side(&self) -> ParameterSide {
        self.side
    }

    /// Todos los nombres declarados, en orden.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn other_names(&self) -> &[String] {
        &self.other_names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_file_param(&self, name: &str) -> bool {
        self.file_names.iter().any(|n| n == name)
    }

    /// `true` si ambos conjuntos declaran los mismos nombres en el mismo lado.
    pub fn same_declaration(&self, other: &ParameterSet) -> bool {
        self.side == other.side && self.file_names == other.file_names && self.other_names == other.other_names
    }

    pub fn get(&self, name: &str) -> Result<Option<&ParamValue>, ParameterError> {
        self.values
            .get(name)
            .map(Option::as_ref)
            .ok_or_else(|| ParameterError::Unknown { name: name.to_string() })
    }

    pub fn get_path(&self, name: &str) -> Result<Option<&Path>, ParameterError> {
        Ok(self.get(name)?.and_then(ParamValue::as_path))
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), ParameterError> {
        let value = value.into();
        if self.is_file_param(name) && value.as_path().is_none() {
            return Err(ParameterError::NotAFile { name: name.to_string() });
        }
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(ParameterError::Unknown { name: name.to_string() }),
        }
    }

    pub fn unset(&mut self, name: &str) -> Result<(), ParameterError> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = None;
                Ok(())
            }
            None => Err(ParameterError::Unknown { name: name.to_string() }),
        }
    }

    /// Pares `(nombre, valor)` en orden de declaración.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ParamValue>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Rutas de los parámetros de archivo asignados, en orden.
    pub fn file_paths(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.file_names
            .iter()
            .filter_map(|n| {
                self.values
                    .get(n)
                    .and_then(Option::as_ref)
                    .and_then(ParamValue::as_path)
                    .map(|p| (n.as_str(), p))
            })
    }

    /// Archivos asignados que existen en disco. Sin caché: cada llamada vuelve
    /// a consultar el sistema de archivos.
    pub fn list_existing_files(&self) -> Vec<PathBuf> {
        self.file_paths()
            .filter(|(_, p)| p.exists())
            .map(|(_, p)| p.to_path_buf())
            .collect()
    }

    /// Archivos asignados que todavía no existen en disco.
    pub fn list_missing_files(&self) -> Vec<PathBuf> {
        self.file_paths()
            .filter(|(_, p)| !p.exists())
            .map(|(_, p)| p.to_path_buf())
            .collect()
    }

    /// Árbol plano `nombre -> valor` (`null` para valores sin asignar).
    pub fn serialize(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.values {
            map.insert(name.clone(), value.as_ref().map(ParamValue::to_json).unwrap_or(Value::Null));
        }
        Value::Object(map)
    }

    /// Reconstruye un conjunto con los nombres de `declared` a partir de un
    /// árbol serializado. Exige exactamente los nombres declarados.
    pub fn from_serialized(declared: &ParameterSet, tree: &Value) -> Result<ParameterSet, ParameterError> {
        let map = tree.as_object()
                      .ok_or_else(|| ParameterError::Malformed("parameters must be an object".into()))?;
        if let Some(extra) = map.keys().find(|k| !declared.contains(k)) {
            return Err(ParameterError::Malformed(format!("undeclared parameter '{extra}'")));
        }
        let mut out = ParameterSet::with_names(declared.side, declared.file_names.clone(), declared.other_names.clone());
        for name in declared.names() {
            let raw = map.get(name)
                         .ok_or_else(|| ParameterError::Malformed(format!("missing parameter '{name}'")))?;
            let value = match raw {
                Value::Null => None,
                Value::String(s) if declared.is_file_param(name) => Some(ParamValue::path(s)),
                _ if declared.is_file_param(name) => {
                    return Err(ParameterError::Malformed(format!("file parameter '{name}' must be a string path")))
                }
                other => Some(ParamValue::Scalar(other.clone())),
            };
            out.values.insert(name.to_string(), value);
        }
        Ok(out)
    }

    /// Copia vacía (mismos nombres, sin valores).
    pub fn cleared(&self) -> ParameterSet {
        ParameterSet::with_names(self.side, self.file_names.clone(), self.other_names.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs() -> ParameterSet {
        ParameterSet::input(["mri", "commissure_coordinates"], ["erosion_size"])
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut p = inputs();
        assert_eq!(p.set("nope", ParamValue::path("/x")),
                   Err(ParameterError::Unknown { name: "nope".into() }));
        assert!(p.get("nope").is_err());
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn file_params_only_take_paths() {
        let mut p = inputs();
        assert_eq!(p.set("mri", 1.5), Err(ParameterError::NotAFile { name: "mri".into() }));
        p.set("erosion_size", 1.8).unwrap();
        assert_eq!(p.get("erosion_size").unwrap(), Some(&ParamValue::from(1.8)));
    }

    #[test]
    fn serialized_tree_has_every_declared_name() {
        let mut p = inputs();
        p.set("mri", ParamValue::path("/data/s1.nii")).unwrap();
        let tree = p.serialize();
        assert_eq!(tree, json!({"mri": "/data/s1.nii", "commissure_coordinates": null, "erosion_size": null}));
        let back = ParameterSet::from_serialized(&inputs(), &tree).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn from_serialized_rejects_missing_and_extra_names() {
        let missing = json!({"mri": "/a", "erosion_size": 1.0});
        assert!(matches!(ParameterSet::from_serialized(&inputs(), &missing), Err(ParameterError::Malformed(_))));
        let extra = json!({"mri": "/a", "commissure_coordinates": null, "erosion_size": 1.0, "x": 2});
        assert!(matches!(ParameterSet::from_serialized(&inputs(), &extra), Err(ParameterError::Malformed(_))));
    }

    #[test]
    fn existing_and_missing_files_are_restated_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.nii");
        let b = dir.path().join("b.nii");
        let mut out = ParameterSet::output(["a", "b"]);
        out.set("a", ParamValue::path(&a)).unwrap();
        out.set("b", ParamValue::path(&b)).unwrap();
        assert!(out.list_existing_files().is_empty());
        std::fs::write(&a, b"x").unwrap();
        assert_eq!(out.list_existing_files(), vec![a.clone()]);
        assert_eq!(out.list_missing_files(), vec![b]);
    }
}
