//! Compilation passes: ordering, cycle detection, validity propagation and
//! edge completeness.
mod common;

use common::*;
use kairo::compiler::{EdgeRef, ResolvedInput, ResolvedOutput};
use kairo::prelude::*;
use kairo::ty::{StructTy, Ty};

fn pipeline(
    registry: &SchemaRegistry,
) -> (GraphStore, NodeId, NodeId, NodeId) {
    let mut store = GraphStore::new();
    let load = place_load(&mut store, registry, Point { x: 0.0, y: 0.0 });
    let resize = store
        .create_node(registry, &SchemaId::new("test:resize"), Point { x: 600.0, y: 0.0 })
        .unwrap();
    let save = store
        .create_node(registry, &SchemaId::new("test:save"), Point { x: 1200.0, y: 0.0 })
        .unwrap();
    store
        .set_input_value(registry, &save, 1, InputValue::Text("/out".to_string()))
        .unwrap();
    store.connect(registry, &load, 0, &resize, 0).unwrap();
    store.connect(registry, &resize, 0, &save, 0).unwrap();
    (store, load, resize, save)
}

#[test]
fn compiles_a_valid_pipeline_dependency_first() {
    let registry = registry();
    let (store, load, resize, save) = pipeline(&registry);

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();

    assert_eq!(plan.nodes.len(), 3);
    let pos = |id: &NodeId| plan.order.iter().position(|o| o == id).unwrap();
    assert!(pos(&load) < pos(&resize));
    assert!(pos(&resize) < pos(&save));

    for node in &plan.nodes {
        assert!(!node.invalid(), "{}: {:?}", node.id, node.reasons);
        assert!(node.executable);
    }
    assert!(plan.edge_complete.values().all(|c| *c));

    // The sink sees a handle, not a literal.
    let compiled_save = plan.node(&save).unwrap();
    match &compiled_save.inputs[0] {
        ResolvedInput::Handle(handle) => {
            assert_eq!(handle.node, resize);
            assert_eq!(handle.index, 0);
        }
        other => panic!("expected a handle, got {:?}", other),
    }
    assert!(compiled_save.has_side_effects);
}

#[test]
fn dependent_output_types_follow_input_literals() {
    let registry = registry();
    let (mut store, _, resize, _) = pipeline(&registry);
    store
        .set_input_value(&registry, &resize, 1, InputValue::Number(640.0))
        .unwrap();
    store
        .set_input_value(&registry, &resize, 2, InputValue::Number(480.0))
        .unwrap();

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    let compiled = plan.node(&resize).unwrap();
    assert_eq!(
        compiled.outputs[0],
        ResolvedOutput::Resolved(Ty::Struct(StructTy {
            name: "Image".to_string(),
            fields: vec![
                ("width".to_string(), Ty::number_literal(640.0)),
                ("height".to_string(), Ty::number_literal(480.0)),
            ],
        }))
    );
}

#[test]
fn cycles_abort_the_whole_pass() {
    let registry = registry();
    let mut store = GraphStore::new();
    let a = store
        .create_node(&registry, &SchemaId::new("test:passthrough"), Point::default())
        .unwrap();
    let b = store
        .create_node(&registry, &SchemaId::new("test:passthrough"), Point::default())
        .unwrap();
    store.connect(&registry, &a, 0, &b, 0).unwrap();
    store.connect(&registry, &b, 0, &a, 0).unwrap();

    let result = GraphCompiler::new(&registry).compile(&store);
    match result {
        Err(CompileError::CyclicGraph { from, to }) => {
            assert!(from == a || from == b);
            assert!(to == a || to == b);
            assert_ne!(from, to);
        }
        other => panic!("expected CyclicGraph, got {:?}", other),
    }
}

#[test]
fn missing_required_handle_fed_input_is_invalid() {
    let registry = registry();
    let mut store = GraphStore::new();
    let resize = store
        .create_node(&registry, &SchemaId::new("test:resize"), Point::default())
        .unwrap();

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    let compiled = plan.node(&resize).unwrap();
    assert!(compiled.invalid());
    assert_eq!(
        compiled.reasons,
        vec![InvalidReason::MissingRequiredInput(0)]
    );
    assert_eq!(compiled.inputs[0], ResolvedInput::Unresolved);
}

#[test]
fn invalid_upstream_propagates_as_unresolved() {
    let registry = registry();
    let (mut store, load, resize, save) = pipeline(&registry);
    // Break the source: no path literal.
    store.clear_input_value(&registry, &load, 0).unwrap();

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    assert!(plan.node(&load).unwrap().invalid());
    let compiled_resize = plan.node(&resize).unwrap();
    assert!(compiled_resize.invalid());
    assert_eq!(compiled_resize.inputs[0], ResolvedInput::Unresolved);
    assert!(plan.node(&save).unwrap().invalid());

    // Both edges are broken for this pass but stay in the graph.
    let key = EdgeRef {
        source: load.clone(),
        source_output: 0,
        target: resize.clone(),
        target_input: 0,
    };
    assert_eq!(plan.edge_complete.get(&key), Some(&false));
    assert_eq!(store.edges().len(), 2);
}

#[test]
fn literal_contradicting_declared_type_is_invalid() {
    let registry = registry();
    let mut store = GraphStore::new();
    let clamped = store
        .create_node(&registry, &SchemaId::new("test:clamped"), Point::default())
        .unwrap();
    store
        .set_input_value(&registry, &clamped, 0, InputValue::Number(50.0))
        .unwrap();

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    let compiled = plan.node(&clamped).unwrap();
    assert_eq!(compiled.reasons, vec![InvalidReason::InputContradiction(0)]);

    // An in-range literal resolves, and the output mirrors it.
    store
        .set_input_value(&registry, &clamped, 0, InputValue::Number(5.0))
        .unwrap();
    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    let compiled = plan.node(&clamped).unwrap();
    assert!(!compiled.invalid());
    assert_eq!(
        compiled.outputs[0],
        ResolvedOutput::Resolved(Ty::number_literal(5.0))
    );
}

#[test]
fn disabling_keeps_validity_but_clears_executability() {
    let registry = registry();
    let (mut store, load, _, _) = pipeline(&registry);

    let before = GraphCompiler::new(&registry).compile(&store).unwrap();
    assert!(!before.node(&load).unwrap().invalid());

    store.set_disabled(&load, true).unwrap();
    let after = GraphCompiler::new(&registry).compile(&store).unwrap();
    let compiled = after.node(&load).unwrap();
    assert_eq!(compiled.invalid(), before.node(&load).unwrap().invalid());
    assert!(!compiled.executable);
}

#[test]
fn progress_is_propagated_into_the_plan() {
    let registry = registry();
    let (mut store, load, _, _) = pipeline(&registry);
    store.set_progress(&load, 0.75).unwrap();

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    assert_eq!(plan.node(&load).unwrap().percent, 0.75);
}

#[test]
fn plans_record_the_store_revision() {
    let registry = registry();
    let (mut store, load, _, _) = pipeline(&registry);

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    assert_eq!(plan.revision, store.revision());

    // A later edit supersedes the plan.
    store.move_node(&load, Point { x: 1.0, y: 1.0 }).unwrap();
    assert_ne!(plan.revision, store.revision());
}

#[test]
fn apply_plan_mirrors_derived_state_onto_the_store() {
    let registry = registry();
    let (mut store, load, resize, _) = pipeline(&registry);
    store.clear_input_value(&registry, &load, 0).unwrap();

    let plan = GraphCompiler::new(&registry).compile(&store).unwrap();
    store.apply_plan(&plan);

    assert!(store.node(&load).unwrap().invalid());
    assert!(store.node(&resize).unwrap().invalid());
    assert!(store.edges().iter().all(|e| !e.complete()));
}
