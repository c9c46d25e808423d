use std::path::Path;
use std::sync::Arc;

use morpho_adapters::{default_registry, HistoAnalysisLoader, SimulatedEngine};
use morpho_core::{Analysis, AnalysisError, LoadError, ResultLoader, RunState, Runner, Subject};
use pretty_assertions::assert_eq;

fn brainvisa_analysis(root: &Path) -> (Subject, Analysis) {
    let raw = root.join("in").join("s1.nii");
    std::fs::create_dir_all(raw.parent().unwrap()).unwrap();
    std::fs::write(&raw, b"raw").unwrap();
    std::fs::write(root.join("in").join("s1.APC"), b"AC: 1 2 3\n").unwrap();

    let registry = default_registry().unwrap();
    let blueprint = registry.analysis("IntraAnalysis").unwrap();
    let naming = registry.naming("brainvisa").unwrap();
    let subject = Subject::from_filename(&raw, Some("ctrl"));
    let mut analysis = Analysis::new(blueprint.clone(), naming).unwrap();
    analysis.set_parameters(blueprint.default_inputs(&raw), &root.join("out"), &subject)
            .unwrap();
    (subject, analysis)
}

#[test]
fn commands_follow_the_brainvisa_tree() {
    let dir = tempfile::tempdir().unwrap();
    let (_, analysis) = brainvisa_analysis(dir.path());

    let commands = analysis.commands().unwrap();
    let programs: Vec<_> = commands.iter().map(|c| c.program.as_str()).collect();
    assert_eq!(programs,
               vec!["VipT1BiasCorrection", "VipHistoAnalysis", "VipGetBrain", "VipSplitBrain"]);

    let brain = dir.path()
                   .join("out/ctrl/s1/t1mri/default_acquisition/default_analysis/segmentation/brain_s1.ima");
    assert_eq!(commands[2].outputs, vec![brain.clone()]);
    let split_args = &commands[3].args;
    let at = split_args.iter().position(|a| a == "-brain").unwrap();
    assert_eq!(Path::new(&split_args[at + 1]), brain.as_path());
}

#[test]
fn simulated_run_fills_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let (_, analysis) = brainvisa_analysis(dir.path());
    assert!(!analysis.has_some_results());

    let runner = Runner::new(Arc::new(SimulatedEngine::new()));
    runner.run(&analysis).unwrap();
    assert_eq!(runner.wait().unwrap(), RunState::Succeeded);
    assert!(analysis.has_all_results());

    // La salida simulada no es un histograma válido.
    let han = analysis.finished_output("histo_analysis").unwrap().unwrap();
    let err = HistoAnalysisLoader.load(&han).unwrap_err();
    assert!(matches!(err, LoadError::Parse { line: 0, .. }));

    assert_eq!(analysis.clear_results().unwrap(), 8);
    assert!(analysis.finished_output("histo_analysis").unwrap().is_none());
}

#[test]
fn segmentation_failure_keeps_earlier_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (_, analysis) = brainvisa_analysis(dir.path());

    let runner = Runner::new(Arc::new(SimulatedEngine::new().failing_step("brain_segmentation")));
    runner.run(&analysis).unwrap();
    assert_eq!(runner.wait().unwrap(), RunState::Failed);

    let failure = runner.last_failure().unwrap();
    assert_eq!(failure.step_id, "brain_segmentation");
    assert_eq!(analysis.outputs().list_existing_files().len(), 6);
    assert_eq!(analysis.outputs().list_missing_files().len(), 2);
}

#[test]
fn failed_companion_copy_discards_the_imported_image() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in").join("s1.nii");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    std::fs::write(&source, b"raw").unwrap();
    // Un directorio con el nombre del compañero: existe pero no se puede copiar.
    std::fs::create_dir_all(dir.path().join("in").join("s1.APC")).unwrap();

    let registry = default_registry().unwrap();
    let blueprint = registry.analysis("IntraAnalysis").unwrap();
    let naming = registry.naming("brainvisa").unwrap();
    let root = dir.path().join("out");
    let subject = Subject::from_filename(&source, Some("ctrl"));
    let destination = naming.raw_input_path(&root, &subject);
    let mut analysis = Analysis::new(blueprint.clone(), naming).unwrap();
    analysis.set_parameters(blueprint.default_inputs(&destination), &root, &subject)
            .unwrap();

    let err = analysis.import_data(&subject).unwrap_err();
    assert!(matches!(err, AnalysisError::Importation { .. }));
    assert!(!destination.exists());
    assert!(source.exists());
}
