use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use morpho_adapters::{default_registry, BrainvisaNaming, IntraAnalysis};
use morpho_core::{RegistryError, Subject};
use morpho_study::{Selection, Study, StudyError, StudySerializationError};
use pretty_assertions::assert_eq;
use serde_json::Value;

fn raw_image(dir: &Path, name: &str, with_apc: bool) -> PathBuf {
    let raw_dir = dir.join("raw");
    fs::create_dir_all(&raw_dir).unwrap();
    let img = raw_dir.join(format!("{name}.nii"));
    fs::write(&img, b"img").unwrap();
    if with_apc {
        fs::write(raw_dir.join(format!("{name}.APC")), b"AC: 1 2 3").unwrap();
    }
    img
}

fn study(dir: &Path) -> Study {
    Study::new("test", dir.join("out"), Arc::new(IntraAnalysis), Arc::new(BrainvisaNaming))
}

#[test]
fn import_copies_image_and_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = study(dir.path());
    let img = raw_image(dir.path(), "s1", true);

    let id = study.add_subject(Subject::from_filename(&img, Some("ctrl")), true).unwrap();
    assert_eq!(id, "ctrl-s1");

    let acq = dir.path().join("out/ctrl/s1/t1mri/default_acquisition");
    assert_eq!(study.subject(&id).unwrap().filename, acq.join("s1.nii"));
    assert!(acq.join("s1.nii").exists());
    assert!(acq.join("s1.APC").exists());
    let inputs = study.analysis(&id).unwrap().inputs();
    assert_eq!(inputs.get_path("mri").unwrap(), Some(acq.join("s1.nii").as_path()));
}

#[test]
fn failed_import_leaves_the_study_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = study(dir.path());
    let img = raw_image(dir.path(), "s1", false);
    study.add_subject(Subject::from_filename(&img, None), true).unwrap();
    let before = study.serialize();

    let ghost = dir.path().join("raw/ghost.nii");
    let err = study.add_subject(Subject::from_filename(&ghost, None), true).unwrap_err();
    assert!(matches!(err, StudyError::Importation { .. }));
    assert_eq!(study.len(), 1);
    assert!(study.subject("default-ghost").is_none());
    assert!(study.analysis("default-ghost").is_none());
    assert_eq!(study.serialize(), before);
}

#[test]
fn serialize_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = study(dir.path());
    for name in ["s1", "s2"] {
        let img = raw_image(dir.path(), name, true);
        study.add_subject(Subject::from_filename(&img, Some("g")), true).unwrap();
    }
    let tree = study.serialize();
    let back = Study::from_serialized(&tree, &default_registry().unwrap()).unwrap();

    assert_eq!(back.subject_ids().collect::<Vec<_>>(), vec!["g-s1", "g-s2"]);
    for id in study.subject_ids() {
        assert_eq!(back.subject(id), study.subject(id));
        assert_eq!(back.analysis(id).unwrap().inputs(), study.analysis(id).unwrap().inputs());
        assert_eq!(back.analysis(id).unwrap().outputs(), study.analysis(id).unwrap().outputs());
    }
    assert_eq!(back.serialize(), tree);
}

#[test]
fn partial_records_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = study(dir.path());
    let img = raw_image(dir.path(), "s1", true);
    study.add_subject(Subject::from_filename(&img, None), false).unwrap();
    let registry = default_registry().unwrap();
    let tree = study.serialize();

    let mut no_outputs = tree.clone();
    no_outputs["outputs"] = Value::Object(Default::default());
    assert!(matches!(Study::from_serialized(&no_outputs, &registry),
                     Err(StudySerializationError::MissingRecord { section: "outputs", .. })));

    let mut renamed = tree.clone();
    let record = renamed["subjects"]["default-s1"].clone();
    renamed["subjects"] = serde_json::json!({ "other": record });
    assert!(matches!(Study::from_serialized(&renamed, &registry),
                     Err(StudySerializationError::OrphanRecord { .. })));

    let mut wrong_type = tree.clone();
    wrong_type["analysis_type"] = "Nope".into();
    assert!(matches!(Study::from_serialized(&wrong_type, &registry),
                     Err(StudySerializationError::Registry(RegistryError::UnknownAnalysisType(_)))));

    let mut extra_param = tree;
    extra_param["inputs"]["default-s1"]["threshold"] = 3.into();
    assert!(matches!(Study::from_serialized(&extra_param, &registry),
                     Err(StudySerializationError::Parameters { .. })));
}

#[test]
fn record_key_must_match_subject_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = study(dir.path());
    let img = raw_image(dir.path(), "s1", true);
    study.add_subject(Subject::from_filename(&img, None), false).unwrap();
    let mut tree = study.serialize();
    tree["subjects"]["default-s1"]["groupname"] = "other".into();
    assert!(matches!(Study::from_serialized(&tree, &default_registry().unwrap()),
                     Err(StudySerializationError::KeyMismatch { .. })));
}

#[test]
fn removed_subject_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = study(dir.path());
    let img = raw_image(dir.path(), "s1", true);
    let id = study.add_subject(Subject::from_filename(&img, None), true).unwrap();

    study.remove_subject_and_files(&id).unwrap();
    assert!(!dir.path().join("out/default/s1").exists());
    assert!(!study.has_subjects());
    assert!(matches!(study.has_some_results(&Selection::one(&id)), Err(StudyError::UnknownSubject(_))));
    assert!(matches!(study.remove_subject(&id), Err(StudyError::UnknownSubject(_))));
    // Sin selección explícita, un estudio vacío no tiene resultados.
    assert!(!study.has_some_results(&Selection::All).unwrap());
}

#[test]
fn organized_directory_is_reopened_without_import() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = study(dir.path());
    for name in ["a", "b"] {
        let img = raw_image(dir.path(), name, true);
        first.add_subject(Subject::from_filename(&img, Some("g")), true).unwrap();
    }
    let reopened =
        Study::from_organized_directory("again", dir.path().join("out"), Arc::new(IntraAnalysis), Arc::new(BrainvisaNaming))
            .unwrap();
    assert_eq!(reopened.subject_ids().collect::<Vec<_>>(), vec!["g-a", "g-b"]);
    for id in first.subject_ids() {
        assert_eq!(reopened.analysis(id).unwrap().inputs(), first.analysis(id).unwrap().inputs());
    }
}
