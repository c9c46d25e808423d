//! IntraAnalysis: pipeline T1 de un sujeto.
//!
//! ```text
//! bias_correction -> histo_analysis -> brain_segmentation -> split_brain
//! ```
//!
//! Cada step consume salidas de los anteriores; `commissure_coordinates` y
//! los factores escalares vienen de las entradas externas.

use std::path::Path;

use morpho_core::naming::OutputFile;
use morpho_core::params::{ParamValue, ParameterSet};
use morpho_core::subject::split_image_name;
use morpho_core::{AnalysisBlueprint, CommandStep, FlowError, StepDefinition, StepFlow};

pub const ANALYSIS_TYPE: &str = "IntraAnalysis";

pub const DEFAULT_EROSION_SIZE: f64 = 1.8;
pub const DEFAULT_BARY_FACTOR: f64 = 0.6;

const INPUT_FILES: [&str; 2] = ["mri", "commissure_coordinates"];
const INPUT_SCALARS: [&str; 2] = ["erosion_size", "bary_factor"];

const OUTPUT_FILES: [OutputFile; 8] =
    [OutputFile { name: "hfiltered", prefix: "hfiltered", extension: "ima", group: None },
     OutputFile { name: "white_ridges", prefix: "whiteridge", extension: "ima", group: None },
     OutputFile { name: "edges", prefix: "edges", extension: "ima", group: None },
     OutputFile { name: "variance", prefix: "variance", extension: "ima", group: None },
     OutputFile { name: "mri_corrected", prefix: "nobias", extension: "ima", group: None },
     OutputFile { name: "histo_analysis", prefix: "nobias", extension: "han", group: None },
     OutputFile { name: "brain_mask", prefix: "brain", extension: "ima", group: Some("segmentation") },
     OutputFile { name: "split_mask", prefix: "voronoi", extension: "ima", group: Some("segmentation") }];

#[derive(Debug, Default, Clone, Copy)]
pub struct IntraAnalysis;

impl IntraAnalysis {
    pub fn new() -> Self {
        Self
    }
}

fn bias_correction() -> CommandStep {
    CommandStep::new("bias_correction", "VipT1BiasCorrection").inputs(["mri", "commissure_coordinates"])
                                                              .outputs(["hfiltered",
                                                                        "white_ridges",
                                                                        "edges",
                                                                        "variance",
                                                                        "mri_corrected"])
                                                              .opt("-i", "mri")
                                                              .opt("-o", "mri_corrected")
                                                              .opt("-Points", "commissure_coordinates")
                                                              .arg("-Wwrite")
                                                              .arg("yes")
                                                              .opt("-wridge", "white_ridges")
                                                              .arg("-eWrite")
                                                              .arg("yes")
                                                              .opt("-ename", "edges")
                                                              .arg("-vWrite")
                                                              .arg("yes")
                                                              .opt("-vname", "variance")
                                                              .arg("-hWrite")
                                                              .arg("yes")
                                                              .opt("-hname", "hfiltered")
                                                              .arg("-Last")
                                                              .arg("auto")
}

fn histogram_analysis() -> CommandStep {
    CommandStep::new("histo_analysis", "VipHistoAnalysis").inputs(["mri_corrected", "hfiltered", "white_ridges"])
                                                          .outputs(["histo_analysis"])
                                                          .opt("-i", "mri_corrected")
                                                          .opt("-o", "histo_analysis")
                                                          .arg("-Save")
                                                          .arg("y")
                                                          .opt("-Mask", "hfiltered")
                                                          .opt("-Ridge", "white_ridges")
                                                          .arg("-mode")
                                                          .arg("i")
}

fn brain_segmentation() -> CommandStep {
    CommandStep::new("brain_segmentation", "VipGetBrain").inputs(["mri_corrected",
                                                                  "commissure_coordinates",
                                                                  "white_ridges",
                                                                  "edges",
                                                                  "variance",
                                                                  "histo_analysis",
                                                                  "erosion_size"])
                                                         .outputs(["brain_mask"])
                                                         .opt("-berosion", "erosion_size")
                                                         .opt("-i", "mri_corrected")
                                                         .arg("-analyse")
                                                         .arg("r")
                                                         .opt("-hname", "histo_analysis")
                                                         .opt("-bname", "brain_mask")
                                                         .opt("-Points", "commissure_coordinates")
                                                         .arg("-m")
                                                         .arg("V")
                                                         .opt("-Variancename", "variance")
                                                         .opt("-Edgesname", "edges")
                                                         .opt("-Ridge", "white_ridges")
}

fn split_brain() -> CommandStep {
    CommandStep::new("split_brain", "VipSplitBrain").inputs(["mri_corrected",
                                                             "brain_mask",
                                                             "white_ridges",
                                                             "histo_analysis",
                                                             "commissure_coordinates",
                                                             "bary_factor"])
                                                    .outputs(["split_mask"])
                                                    .opt("-input", "mri_corrected")
                                                    .opt("-brain", "brain_mask")
                                                    .arg("-analyse")
                                                    .arg("r")
                                                    .opt("-hname", "histo_analysis")
                                                    .opt("-output", "split_mask")
                                                    .arg("-mode")
                                                    .arg("Watershed")
                                                    .opt("-Ridge", "white_ridges")
                                                    .opt("-Bary", "bary_factor")
                                                    .opt("-Points", "commissure_coordinates")
}

impl AnalysisBlueprint for IntraAnalysis {
    fn name(&self) -> &str {
        ANALYSIS_TYPE
    }

    fn input_parameters(&self) -> ParameterSet {
        ParameterSet::input(INPUT_FILES, INPUT_SCALARS)
    }

    fn output_files(&self) -> &[OutputFile] {
        &OUTPUT_FILES
    }

    fn build_flow(&self) -> Result<StepFlow, FlowError> {
        let steps: Vec<Box<dyn StepDefinition>> = vec![Box::new(bias_correction()),
                                                       Box::new(histogram_analysis()),
                                                       Box::new(brain_segmentation()),
                                                       Box::new(split_brain())];
        StepFlow::new(steps)
    }

    fn raw_input_name(&self) -> &str {
        "mri"
    }

    /// La imagen en `raw_path`, sus coordenadas `<sujeto>.APC` en la misma
    /// carpeta y los factores por defecto.
    fn default_inputs(&self, raw_path: &Path) -> ParameterSet {
        let mut inputs = self.input_parameters();
        let (stem, _) = split_image_name(raw_path);
        let apc = raw_path.with_file_name(format!("{stem}.APC"));
        // Nombres declarados arriba: las asignaciones no fallan.
        let _ = inputs.set("mri", ParamValue::path(raw_path));
        let _ = inputs.set("commissure_coordinates", ParamValue::path(apc));
        let _ = inputs.set("erosion_size", DEFAULT_EROSION_SIZE);
        let _ = inputs.set("bary_factor", DEFAULT_BARY_FACTOR);
        inputs
    }

    fn companion_inputs(&self) -> &[(&'static str, &'static str)] {
        &[("commissure_coordinates", "APC")]
    }
}
