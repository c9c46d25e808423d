mod common;

use morpho_adapters::IntraAnalysis;
use morpho_core::{AnalysisBlueprint, BindingSource};
use pretty_assertions::assert_eq;

use common::fixture;

#[test]
fn propagate_is_deterministic() {
    let bp = IntraAnalysis;
    let mut first = bp.build_flow().unwrap();
    first.propagate(&bp.input_parameters(), &bp.output_parameters()).unwrap();
    let mut second = bp.build_flow().unwrap();
    second.propagate(&bp.input_parameters(), &bp.output_parameters()).unwrap();
    assert_eq!(first.bindings(), second.bindings());

    // Propagar de nuevo sobre el mismo flow no duplica nada.
    let before = first.bindings().to_vec();
    first.propagate(&bp.input_parameters(), &bp.output_parameters()).unwrap();
    assert_eq!(first.bindings(), before.as_slice());
}

#[test]
fn every_step_input_is_bound_exactly_once() {
    let bp = IntraAnalysis;
    let mut flow = bp.build_flow().unwrap();
    flow.propagate(&bp.input_parameters(), &bp.output_parameters()).unwrap();
    for step in flow.steps() {
        for input in step.inputs() {
            let n = flow.bindings()
                        .iter()
                        .filter(|b| b.step == step.id() && &b.param == input)
                        .count();
            assert_eq!(n, 1, "{}.{}", step.id(), input);
        }
    }
}

#[test]
fn subject_values_reach_downstream_commands() {
    let fx = fixture();
    let commands = fx.analysis.commands().unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].args[0], fx.subject.filename.display().to_string());
    assert_eq!(commands[0].args[1..3], ["--level".to_string(), "2.0".to_string()]);
    assert_eq!(commands[1].args[0], fx.output("x").display().to_string());
    let b = fx.analysis.flow().bindings().iter().find(|b| b.step == "b" && b.param == "x").unwrap();
    assert_eq!(b.source, BindingSource::Upstream { step: "a".into() });
}
