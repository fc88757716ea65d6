//! Turns the current store + edge set into a validated, execution-ready
//! plan: cycle detection, dependency-first type resolution, edge
//! completeness and iterator containment.

mod plan;

pub use plan::{
    CompiledNode, CompiledPlan, EdgeHandle, EdgeRef, InvalidReason, ResolvedInput, ResolvedOutput,
};

use crate::error::{CompileError, TypeError};
use crate::graph::{Bounds, GraphStore, IteratorBox, NodeBox, NodeId, assign_parents};
use crate::schema::{InputValue, SchemaRegistry};
use crate::ty::{self, Binding, InputId, OutputId, Ty};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::BTreeSet;

/// The singleton type of a bound literal.
fn literal_ty(value: &InputValue) -> Ty {
    match value {
        InputValue::Number(n) => Ty::number_literal(*n),
        InputValue::Text(s) => Ty::text_literal(s.clone()),
    }
}

/// Compiles graphs against a frozen schema registry.
///
/// The compiler reads the store and never mutates it; derived state flows
/// back through [`GraphStore::apply_plan`] on the returned plan. A pass
/// either fails whole with [`CompileError::CyclicGraph`] or emits one
/// [`CompiledNode`] per instance; type failures are folded into per-node
/// invalid state, never thrown.
pub struct GraphCompiler<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> GraphCompiler<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn compile(&self, store: &GraphStore) -> Result<CompiledPlan, CompileError> {
        let order = self.execution_order(store)?;
        let parents = self.containment(store);

        let mut children: AHashMap<NodeId, Vec<NodeId>> = AHashMap::new();
        for (id, parent) in &parents {
            if let Some(parent) = parent {
                children.entry(parent.clone()).or_default().push(id.clone());
            }
        }
        for list in children.values_mut() {
            list.sort();
        }

        // One feeding edge per target input, enforced by the store.
        let mut incoming: AHashMap<(NodeId, InputId), &crate::graph::Edge> = AHashMap::new();
        for edge in store.edges() {
            incoming.insert((edge.target.clone(), edge.target_input), edge);
        }

        let mut outputs_resolved: AHashMap<NodeId, AHashMap<OutputId, Ty>> = AHashMap::new();
        let mut invalid_nodes: AHashSet<NodeId> = AHashSet::new();
        let mut edge_complete: AHashMap<EdgeRef, bool> = AHashMap::new();
        let mut compiled: Vec<CompiledNode> = Vec::with_capacity(order.len());

        for id in &order {
            let Ok(instance) = store.node(id) else {
                continue;
            };
            let schema = match self.registry.lookup(&instance.schema_id) {
                Ok(schema) => schema,
                Err(_) => {
                    invalid_nodes.insert(id.clone());
                    compiled.push(CompiledNode {
                        id: id.clone(),
                        schema_id: instance.schema_id.clone(),
                        inputs: Vec::new(),
                        outputs: Vec::new(),
                        child: matches!(parents.get(id), Some(Some(_))),
                        children: None,
                        node_type: None,
                        percent: instance.percent_complete(),
                        has_side_effects: false,
                        executable: false,
                        locked: instance.is_locked,
                        reasons: vec![InvalidReason::UnknownSchema(instance.schema_id.clone())],
                    });
                    continue;
                }
            };

            let mut reasons: Vec<InvalidReason> = Vec::new();

            // First pass: gather the value type of every input so that
            // dependent type expressions see a complete binding.
            let mut binding = Binding::new();
            let mut gathered: Vec<(Option<Ty>, Option<InputValue>, Option<&crate::graph::Edge>)> =
                Vec::with_capacity(schema.inputs.len());
            for input in &schema.inputs {
                let edge = incoming.get(&(id.clone(), input.id)).copied();
                let (value_ty, literal) = match edge {
                    Some(edge) => {
                        // An invalid upstream makes this input unresolved,
                        // not merely absent.
                        let upstream = if invalid_nodes.contains(&edge.source) {
                            None
                        } else {
                            outputs_resolved
                                .get(&edge.source)
                                .and_then(|outputs| outputs.get(&edge.source_output))
                                .cloned()
                        };
                        (upstream, None)
                    }
                    None => match instance.input_data.get(&input.id) {
                        Some(value) => (Some(literal_ty(value)), Some(value.clone())),
                        None => (None, None),
                    },
                };
                if let Some(ty) = &value_ty {
                    binding.insert(input.id, ty.clone());
                }
                gathered.push((value_ty, literal, edge));
            }

            // Second pass: evaluate declared input types, check literals
            // and edges against them, and decide per-input resolution.
            let mut inputs: Vec<ResolvedInput> = Vec::with_capacity(schema.inputs.len());
            for (input, (value_ty, literal, edge)) in schema.inputs.iter().zip(&gathered) {
                let declared = match ty::evaluate(&input.ty, &binding) {
                    Ok(ty) => Some(ty),
                    Err(TypeError::Unresolvable(referenced)) => {
                        reasons.push(InvalidReason::Unresolvable {
                            declared_on: format!("input {}", input.id),
                            referenced,
                        });
                        None
                    }
                    Err(TypeError::Contradiction) => {
                        reasons.push(InvalidReason::Contradiction {
                            declared_on: format!("input {}", input.id),
                        });
                        None
                    }
                };

                let mut satisfied = false;
                let resolved = if let Some(edge) = edge {
                    let complete = match (value_ty.as_ref(), declared.as_ref()) {
                        (Some(value), Some(declared)) => value.is_assignable_to(declared),
                        _ => false,
                    };
                    edge_complete.insert(
                        EdgeRef {
                            source: edge.source.clone(),
                            source_output: edge.source_output,
                            target: edge.target.clone(),
                            target_input: edge.target_input,
                        },
                        complete,
                    );
                    if complete {
                        satisfied = true;
                        ResolvedInput::Handle(EdgeHandle {
                            node: edge.source.clone(),
                            index: edge.source_output,
                        })
                    } else {
                        ResolvedInput::Unresolved
                    }
                } else if let Some(value) = literal {
                    if let (Some(value_ty), Some(declared)) = (value_ty.as_ref(), declared.as_ref())
                    {
                        if value_ty.intersect(declared).is_none() {
                            reasons.push(InvalidReason::InputContradiction(input.id));
                        } else {
                            satisfied = true;
                        }
                    }
                    ResolvedInput::Literal(value.clone())
                } else {
                    ResolvedInput::Unresolved
                };

                if !input.optional && literal.is_none() && !satisfied {
                    reasons.push(InvalidReason::MissingRequiredInput(input.id));
                }
                inputs.push(resolved);
            }

            // Output types, which may depend on sibling input values.
            let mut outputs: Vec<ResolvedOutput> = Vec::with_capacity(schema.outputs.len());
            let mut out_map: AHashMap<OutputId, Ty> = AHashMap::new();
            for output in &schema.outputs {
                match ty::evaluate(&output.ty, &binding) {
                    Ok(ty) => {
                        out_map.insert(output.id, ty.clone());
                        outputs.push(ResolvedOutput::Resolved(ty));
                    }
                    Err(TypeError::Unresolvable(referenced)) => {
                        reasons.push(InvalidReason::Unresolvable {
                            declared_on: format!("output {}", output.id),
                            referenced,
                        });
                        outputs.push(ResolvedOutput::Unresolved);
                    }
                    Err(TypeError::Contradiction) => {
                        reasons.push(InvalidReason::Contradiction {
                            declared_on: format!("output {}", output.id),
                        });
                        outputs.push(ResolvedOutput::Unresolved);
                    }
                }
            }
            outputs_resolved.insert(id.clone(), out_map);

            if !reasons.is_empty() {
                invalid_nodes.insert(id.clone());
            }
            compiled.push(CompiledNode {
                id: id.clone(),
                schema_id: instance.schema_id.clone(),
                inputs,
                outputs,
                child: matches!(parents.get(id), Some(Some(_))),
                children: instance
                    .is_iterator()
                    .then(|| children.get(id).cloned().unwrap_or_default()),
                node_type: schema.node_type.clone(),
                percent: instance.percent_complete(),
                has_side_effects: schema.has_side_effects,
                executable: !instance.is_disabled,
                locked: instance.is_locked,
                reasons,
            });
        }

        log::debug!(
            "compiled {} node(s), {} invalid, revision {}",
            compiled.len(),
            invalid_nodes.len(),
            store.revision()
        );
        Ok(CompiledPlan {
            nodes: compiled,
            order,
            edge_complete,
            parents,
            revision: store.revision(),
        })
    }

    /// Kahn's algorithm over the dependency graph (edge target depends on
    /// edge source), with ties broken by node id so the order is
    /// deterministic. Any cycle fails the whole pass, naming one offending
    /// edge.
    fn execution_order(&self, store: &GraphStore) -> Result<Vec<NodeId>, CompileError> {
        let mut indegree: AHashMap<&NodeId, usize> =
            store.nodes().map(|n| (&n.id, 0)).collect();
        let mut dependents: AHashMap<&NodeId, Vec<&crate::graph::Edge>> = AHashMap::new();
        for edge in store.edges() {
            if let Some(count) = indegree.get_mut(&edge.target) {
                *count += 1;
            }
            dependents.entry(&edge.source).or_default().push(edge);
        }

        let mut ready: BTreeSet<&NodeId> = indegree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited: AHashSet<&NodeId> = AHashSet::with_capacity(indegree.len());
        let mut order: Vec<NodeId> = Vec::with_capacity(indegree.len());

        while let Some(id) = ready.pop_first() {
            visited.insert(id);
            order.push(id.clone());
            if let Some(edges) = dependents.get(id) {
                for edge in edges {
                    if let Some(count) = indegree.get_mut(&edge.target) {
                        *count -= 1;
                        if *count == 0 {
                            ready.insert(&edge.target);
                        }
                    }
                }
            }
        }

        if order.len() == store.node_count() {
            return Ok(order);
        }

        // Every node left unvisited sits on or behind a cycle; report the
        // smallest edge that is entirely within the unvisited region.
        let offending = store
            .edges()
            .iter()
            .filter(|e| !visited.contains(&e.source) && !visited.contains(&e.target))
            .min_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        match offending {
            Some(edge) => Err(CompileError::CyclicGraph {
                from: edge.source.clone(),
                to: edge.target.clone(),
            }),
            None => {
                // Unreachable with a consistent store; pick a stable stand-in.
                let node = store
                    .nodes()
                    .filter(|n| !visited.contains(&n.id))
                    .map(|n| n.id.clone())
                    .sorted()
                    .next()
                    .unwrap_or_default();
                Err(CompileError::CyclicGraph {
                    from: node.clone(),
                    to: node,
                })
            }
        }
    }

    /// Geometric containment: rebuilds the full parent assignment from the
    /// current node bounds. Running it twice with unchanged geometry yields
    /// the same result, so a full rebuild per pass is safe.
    fn containment(&self, store: &GraphStore) -> AHashMap<NodeId, Option<NodeId>> {
        let mut iterators: Vec<IteratorBox> = Vec::new();
        let mut boxes: Vec<NodeBox> = Vec::new();
        for instance in store.nodes().sorted_by(|a, b| a.id.cmp(&b.id)) {
            match &instance.iterator_size {
                Some(it) => iterators.push(IteratorBox {
                    id: instance.id.clone(),
                    bounds: Bounds {
                        left: instance.position.x + it.offset_left,
                        top: instance.position.y + it.offset_top,
                        width: it.width,
                        height: it.height,
                    },
                    max_width: instance.max_width,
                    max_height: instance.max_height,
                    touch: instance.touch,
                }),
                None => boxes.push(NodeBox {
                    id: instance.id.clone(),
                    bounds: Bounds {
                        left: instance.position.x,
                        top: instance.position.y,
                        width: instance.size.width,
                        height: instance.size.height,
                    },
                }),
            }
        }

        let mut parents = assign_parents(&iterators, &boxes);
        // Iterator containers are not nestable inside one another.
        for it in &iterators {
            parents.insert(it.id.clone(), None);
        }
        parents
    }
}
