use std::fs;
use std::sync::Arc;

use morpho_adapters::{default_registry, BrainvisaNaming, IntraAnalysis};
use morpho_core::Subject;
use morpho_persistence::json::backup_path;
use morpho_persistence::{JsonStudyFile, PersistenceError, StoreConfig};
use morpho_study::Study;
use pretty_assertions::assert_eq;

fn study_with_subject(dir: &std::path::Path) -> Study {
    let mut study = Study::new("persisted", dir.join("out"), Arc::new(IntraAnalysis), Arc::new(BrainvisaNaming));
    let img = dir.join("s1.nii");
    fs::write(&img, b"img").unwrap();
    study.add_subject(Subject::from_filename(&img, None), true).unwrap();
    study
}

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let study = study_with_subject(dir.path());
    let store = JsonStudyFile::default();

    let path = store.save(&study).unwrap();
    assert_eq!(path, dir.path().join("out/study.json"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("{\n    \"analysis_type\": \"IntraAnalysis\""));

    let back = store.load(&path, &default_registry().unwrap()).unwrap();
    assert_eq!(back.serialize(), study.serialize());
    assert_eq!(back.backup_filename(), path.as_path());
}

#[test]
fn previous_version_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = study_with_subject(dir.path());
    let store = JsonStudyFile::default();
    let path = store.save(&study).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    study.remove_subject("default-s1").unwrap();
    store.save(&study).unwrap();
    assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), first);
    assert!(!fs::read_to_string(&path).unwrap().contains("default-s1"));
}

#[test]
fn no_backup_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let study = study_with_subject(dir.path());
    let store = JsonStudyFile::new(StoreConfig { keep_backup: false,
                                                 ..StoreConfig::default() });
    let path = store.save(&study).unwrap();
    store.save(&study).unwrap();
    assert!(!backup_path(&path).exists());
}

#[test]
fn broken_files_fail_closed() {
    let dir = tempfile::tempdir().unwrap();
    let registry = default_registry().unwrap();
    let store = JsonStudyFile::default();

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "{ not json").unwrap();
    assert!(matches!(store.load(&garbage, &registry), Err(PersistenceError::Json { .. })));

    let partial = dir.path().join("partial.json");
    fs::write(&partial, r#"{"name": "x", "outputdir": "/o"}"#).unwrap();
    assert!(matches!(store.load(&partial, &registry), Err(PersistenceError::Malformed { .. })));

    assert!(matches!(store.load(&dir.path().join("missing.json"), &registry), Err(PersistenceError::Io { .. })));
}
