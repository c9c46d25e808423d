use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use morpho_adapters::{FlatNaming, IntraAnalysis, SimulatedEngine};
use morpho_core::{ExecutionEngine, RunState, RunnerError, Subject, SubjectStatus};
use morpho_study::{Selection, StatusBoard, StatusChange, Study, StudyError, StudyRunner};

fn populated(dir: &Path, names: &[&str]) -> Study {
    let mut study = Study::new("runs", dir.join("out"), Arc::new(IntraAnalysis), Arc::new(FlatNaming));
    fs::create_dir_all(dir.join("raw")).unwrap();
    for name in names {
        let img = dir.join("raw").join(format!("{name}.nii"));
        fs::write(&img, b"img").unwrap();
        fs::write(dir.join("raw").join(format!("{name}.APC")), b"apc").unwrap();
        study.add_subject(Subject::from_filename(&img, None), true).unwrap();
    }
    study
}

fn runner(engine: SimulatedEngine) -> StudyRunner {
    let engine: Arc<dyn ExecutionEngine> = Arc::new(engine);
    StudyRunner::new(engine)
}

#[test]
fn every_subject_runs_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let study = populated(dir.path(), &["s1", "s2"]);
    let runner = runner(SimulatedEngine::new());

    let report = runner.run(&study, &Selection::All).unwrap();
    assert!(report.all_started());
    assert_eq!(report.started.len(), 2);
    let states = runner.wait_all();
    assert!(states.iter().all(|(_, s)| *s == RunState::Succeeded));

    assert!(study.has_all_results(&Selection::All).unwrap());
    assert_eq!(runner.status(&study, "default-s1").unwrap(), SubjectStatus::AllOutputFilesExist);
}

#[test]
fn one_rejection_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let study = populated(dir.path(), &["s1", "s2"]);
    let runner = runner(SimulatedEngine::new());

    runner.run(&study, &Selection::one("default-s1")).unwrap();
    runner.wait_all();
    let report = runner.run(&study, &Selection::All).unwrap();
    assert_eq!(report.started.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(), vec!["default-s2"]);
    assert!(matches!(report.rejected.as_slice(), [(id, RunnerError::OutputFileExist { .. })] if id == "default-s1"));
    runner.wait_all();

    assert_eq!(study.clear_results(&Selection::one("default-s1")).unwrap(), 8);
    assert_eq!(runner.status(&study, "default-s1").unwrap(), SubjectStatus::NoOutputFiles);
}

#[test]
fn failed_subject_reports_its_step() {
    let dir = tempfile::tempdir().unwrap();
    let study = populated(dir.path(), &["s1"]);
    let runner = runner(SimulatedEngine::new().failing_step("brain_segmentation"));

    runner.run(&study, &Selection::All).unwrap();
    runner.wait_all();
    assert_eq!(runner.status(&study, "default-s1").unwrap(), SubjectStatus::LastRunFailed);
    assert_eq!(runner.last_failure("default-s1").unwrap().step_id, "brain_segmentation");
    assert!(study.has_some_results(&Selection::All).unwrap());
    assert!(!study.has_all_results(&Selection::All).unwrap());
}

#[test]
fn running_subject_is_guarded() {
    let dir = tempfile::tempdir().unwrap();
    let mut study = populated(dir.path(), &["s1"]);
    let runner = runner(SimulatedEngine::new().with_delay(Duration::from_secs(30)));
    runner.run(&study, &Selection::All).unwrap();

    let inputs = study.analysis("default-s1").unwrap().inputs().clone();
    assert!(matches!(runner.update_parameters(&mut study, "default-s1", inputs.clone()),
                     Err(StudyError::SubjectRunning(_))));
    assert!(matches!(runner.remove_subject(&mut study, "default-s1", false),
                     Err(StudyError::SubjectRunning(_))));

    assert_eq!(runner.stop_all(), 1);
    assert_eq!(runner.wait_all(), vec![("default-s1".to_string(), RunState::Stopped)]);
    runner.update_parameters(&mut study, "default-s1", inputs).unwrap();
    runner.remove_subject(&mut study, "default-s1", false).unwrap();
    assert_eq!(runner.state("default-s1"), RunState::Idle);
}

#[test]
fn board_reports_only_changes() {
    let dir = tempfile::tempdir().unwrap();
    let study = populated(dir.path(), &["s1", "s2"]);
    let runner = runner(SimulatedEngine::new());
    let seen: Arc<Mutex<Vec<StatusChange>>> = Arc::default();
    let mut board = StatusBoard::new();
    let sink = Arc::clone(&seen);
    board.subscribe(Box::new(move |c: &StatusChange| sink.lock().unwrap().push(c.clone())));

    let first = board.tick(&study, &runner).unwrap();
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|c| c.previous.is_none() && c.current == SubjectStatus::NoOutputFiles));
    assert!(board.tick(&study, &runner).unwrap().is_empty());

    runner.run(&study, &Selection::one("default-s2")).unwrap();
    runner.wait_all();
    let changes = board.tick(&study, &runner).unwrap();
    assert_eq!(changes,
               vec![StatusChange { subject_id: "default-s2".into(),
                                   previous: Some(SubjectStatus::NoOutputFiles),
                                   current: SubjectStatus::AllOutputFilesExist }]);
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn clearing_a_selection_without_results_removes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let study = populated(dir.path(), &["s1", "s2"]);

    assert_eq!(study.clear_results(&Selection::All).unwrap(), 0);
    assert_eq!(study.clear_results(&Selection::one("default-s2")).unwrap(), 0);
    assert!(!study.has_some_results(&Selection::All).unwrap());
    assert!(dir.path().join("out").exists());
}
