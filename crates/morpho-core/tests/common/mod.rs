//! Tipo de análisis mínimo de dos steps para los tests: `a` produce `x`,
//! `b` consume `x` y produce `y`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use morpho_adapters::FlatNaming;
use morpho_core::naming::OutputFile;
use morpho_core::{Analysis, AnalysisBlueprint, CommandStep, FlowError, ParamValue, ParameterSet, StepDefinition,
                  StepFlow, Subject};

const OUTPUTS: [OutputFile; 2] = [OutputFile { name: "x", prefix: "x", extension: "ima", group: None },
                                  OutputFile { name: "y", prefix: "y", extension: "ima", group: None }];

#[derive(Debug)]
pub struct TwoSteps;

impl AnalysisBlueprint for TwoSteps {
    fn name(&self) -> &str {
        "TwoSteps"
    }

    fn input_parameters(&self) -> ParameterSet {
        ParameterSet::input(["raw"], ["level"])
    }

    fn output_files(&self) -> &[OutputFile] {
        &OUTPUTS
    }

    fn build_flow(&self) -> Result<StepFlow, FlowError> {
        let steps: Vec<Box<dyn StepDefinition>> =
            vec![Box::new(CommandStep::new("a", "make-x").inputs(["raw", "level"])
                                                         .outputs(["x"])
                                                         .param("raw")
                                                         .opt("--level", "level")
                                                         .param("x")),
                 Box::new(CommandStep::new("b", "make-y").inputs(["x"]).outputs(["y"]).param("x").param("y"))];
        StepFlow::new(steps)
    }

    fn raw_input_name(&self) -> &str {
        "raw"
    }

    fn default_inputs(&self, raw_path: &Path) -> ParameterSet {
        let mut p = self.input_parameters();
        p.set("raw", ParamValue::path(raw_path)).unwrap();
        p.set("level", 2.0).unwrap();
        p
    }
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub subject: Subject,
    pub analysis: Analysis,
}

impl Fixture {
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.analysis.outputs().get_path(name).unwrap().unwrap().to_path_buf()
    }
}

/// Análisis con la imagen cruda ya presente en disco.
pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("s1.nii");
    std::fs::write(&raw, b"raw").unwrap();
    let subject = Subject::from_filename(&raw, None);
    let blueprint: Arc<dyn AnalysisBlueprint> = Arc::new(TwoSteps);
    let mut analysis = Analysis::new(blueprint.clone(), Arc::new(FlatNaming)).unwrap();
    analysis.set_parameters(blueprint.default_inputs(&raw), &dir.path().join("out"), &subject)
            .unwrap();
    Fixture { dir, subject, analysis }
}
