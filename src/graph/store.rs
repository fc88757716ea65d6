use super::{Edge, IteratorSize, NodeId, NodeInstance, Point, Size};
use crate::error::{ArtifactError, StoreError};
use crate::schema::{InputValue, SchemaId, SchemaRegistry};
use crate::ty::{InputId, OutputId};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;

/// The persisted form of a graph: node instances with their literal values,
/// positions and parent relations, plus the edge set. Derived fields
/// (`invalid`, `percent_complete`, `animated`, edge `complete`) are always
/// recomputed and never written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGraph {
    pub nodes: Vec<NodeInstance>,
    pub edges: Vec<Edge>,
}

impl SavedGraph {
    pub fn to_json(&self) -> Result<String, ArtifactError> {
        serde_json::to_string_pretty(self).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        serde_json::from_str(json).map_err(|e| ArtifactError::Decode(e.to_string()))
    }

    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let json = fs::read_to_string(path).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }
}

/// Holds the mutable per-instance state of every node placed in a graph,
/// plus the edge set.
///
/// All mutations are serialized through this type (single-writer model).
/// The store never resolves types itself: every mutation records which
/// nodes must be re-resolved in a dirty log that the compiler drains. A
/// failed mutation rejects only the offending operation and leaves all
/// prior state untouched.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: AHashMap<NodeId, NodeInstance>,
    edges: Vec<Edge>,
    dirty: AHashSet<NodeId>,
    geometry_dirty: AHashSet<NodeId>,
    revision: u64,
    next_touch: u64,
    next_node: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic edit counter. A compiled plan records the revision it was
    /// built from, so callers can discard plans superseded by later edits.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node(&self, id: &NodeId) -> Result<&NodeInstance, StoreError> {
        self.nodes
            .get(id)
            .ok_or_else(|| StoreError::UnknownNode(id.clone()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Places a new node, seeding its input data with the schema's declared
    /// defaults.
    pub fn create_node(
        &mut self,
        registry: &SchemaRegistry,
        schema_id: &SchemaId,
        position: Point,
    ) -> Result<NodeId, StoreError> {
        let id = format!("node-{}", self.next_node);
        self.next_node += 1;
        self.create_node_with_id(registry, id.clone(), schema_id, position)?;
        Ok(id)
    }

    /// Places a new node under a caller-chosen id (used by graph loading).
    pub fn create_node_with_id(
        &mut self,
        registry: &SchemaRegistry,
        id: NodeId,
        schema_id: &SchemaId,
        position: Point,
    ) -> Result<(), StoreError> {
        let schema = registry
            .lookup(schema_id)
            .map_err(|_| StoreError::UnknownSchema(schema_id.clone()))?;

        let mut input_data = AHashMap::new();
        for input in &schema.inputs {
            if let Some(default) = &input.default {
                input_data.insert(input.id, default.clone());
            }
        }

        let iterator_size = schema.is_iterator().then_some(IteratorSize {
            width: 480.0,
            height: 360.0,
            offset_top: 80.0,
            offset_left: 16.0,
        });

        log::debug!("placing node '{}' of schema '{}'", id, schema_id);
        self.nodes.insert(
            id.clone(),
            NodeInstance {
                id: id.clone(),
                schema_id: schema_id.clone(),
                parent: None,
                input_data,
                is_disabled: false,
                is_locked: false,
                position,
                size: Size::default(),
                iterator_size,
                max_width: None,
                max_height: None,
                invalid: false,
                percent_complete: 0.0,
                animated: false,
                touch: 0,
            },
        );
        self.touch_geometry(&id);
        self.mark_dirty(&id);
        self.revision += 1;
        Ok(())
    }

    /// Removes a node, cascading to children whose parent points at it and
    /// dropping every incident edge.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<(), StoreError> {
        if !self.nodes.contains_key(id) {
            return Err(StoreError::UnknownNode(id.clone()));
        }
        let mut doomed: Vec<NodeId> = vec![id.clone()];
        doomed.extend(
            self.nodes
                .values()
                .filter(|n| n.parent.as_ref() == Some(id))
                .map(|n| n.id.clone()),
        );

        // Downstream of anything removed must re-resolve.
        for node in &doomed {
            self.mark_dirty(node);
        }
        for node in &doomed {
            self.dirty.remove(node);
            self.geometry_dirty.remove(node);
            self.nodes.remove(node);
        }
        self.edges
            .retain(|e| !doomed.contains(&e.source) && !doomed.contains(&e.target));
        self.revision += 1;
        Ok(())
    }

    /// Binds a literal to an input, validating the value against the
    /// input's declared kind domain.
    pub fn set_input_value(
        &mut self,
        registry: &SchemaRegistry,
        node: &NodeId,
        input: InputId,
        value: InputValue,
    ) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        let schema = registry
            .lookup(&instance.schema_id)
            .map_err(|_| StoreError::UnknownSchema(instance.schema_id.clone()))?;
        let declared = schema.input(input).ok_or(StoreError::UnknownInput {
            node: node.clone(),
            input,
        })?;
        if !declared.accepts(&value) {
            return Err(StoreError::InvalidInputKind {
                node: node.clone(),
                input,
                kind: declared.kind,
                value,
            });
        }

        if let Some(instance) = self.nodes.get_mut(node) {
            instance.input_data.insert(input, value);
        }
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    /// Removes the literal bound to an input, if any.
    pub fn clear_input_value(
        &mut self,
        registry: &SchemaRegistry,
        node: &NodeId,
        input: InputId,
    ) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        let schema = registry
            .lookup(&instance.schema_id)
            .map_err(|_| StoreError::UnknownSchema(instance.schema_id.clone()))?;
        if schema.input(input).is_none() {
            return Err(StoreError::UnknownInput {
                node: node.clone(),
                input,
            });
        }
        if let Some(instance) = self.nodes.get_mut(node) {
            instance.input_data.remove(&input);
        }
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    pub fn move_node(&mut self, node: &NodeId, position: Point) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.position = position;
        self.touch_geometry(node);
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    pub fn resize_node(&mut self, node: &NodeId, size: Size) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.size = size;
        self.touch_geometry(node);
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    /// Resizes an iterator's content box.
    pub fn resize_iterator(
        &mut self,
        node: &NodeId,
        size: IteratorSize,
    ) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.iterator_size = Some(size);
        self.touch_geometry(node);
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    pub fn set_max_size(
        &mut self,
        node: &NodeId,
        max_width: Option<f64>,
        max_height: Option<f64>,
    ) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.max_width = max_width;
        instance.max_height = max_height;
        self.touch_geometry(node);
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    pub fn set_disabled(&mut self, node: &NodeId, disabled: bool) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.is_disabled = disabled;
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    pub fn set_locked(&mut self, node: &NodeId, locked: bool) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.is_locked = locked;
        self.mark_dirty(node);
        self.revision += 1;
        Ok(())
    }

    /// Progress surface for the external executor. Does not dirty the node:
    /// progress is pass-through metadata, not type-affecting state.
    pub fn set_progress(&mut self, node: &NodeId, percent: f64) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.percent_complete = percent.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_animated(&mut self, node: &NodeId, animated: bool) -> Result<(), StoreError> {
        let instance = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| StoreError::UnknownNode(node.clone()))?;
        instance.animated = animated;
        Ok(())
    }

    /// Connects an output to an input. An existing edge into the same input
    /// is replaced (one feeding edge per input); an identical edge is
    /// rejected.
    pub fn connect(
        &mut self,
        registry: &SchemaRegistry,
        source: &NodeId,
        source_output: OutputId,
        target: &NodeId,
        target_input: InputId,
    ) -> Result<(), StoreError> {
        if source == target {
            return Err(StoreError::SelfConnection(source.clone()));
        }
        let source_node = self.node(source)?;
        let target_node = self.node(target)?;

        let source_schema = registry
            .lookup(&source_node.schema_id)
            .map_err(|_| StoreError::UnknownSchema(source_node.schema_id.clone()))?;
        if source_schema.output(source_output).is_none() {
            return Err(StoreError::UnknownOutput {
                node: source.clone(),
                output: source_output,
            });
        }
        let target_schema = registry
            .lookup(&target_node.schema_id)
            .map_err(|_| StoreError::UnknownSchema(target_node.schema_id.clone()))?;
        let input = target_schema
            .input(target_input)
            .ok_or(StoreError::UnknownInput {
                node: target.clone(),
                input: target_input,
            })?;
        if !input.has_handle {
            return Err(StoreError::InputNotConnectable {
                node: target.clone(),
                input: target_input,
            });
        }

        let edge = Edge::new(source.clone(), source_output, target.clone(), target_input);
        if self.edges.iter().any(|e| e.connects_same(&edge)) {
            return Err(StoreError::DuplicateEdge);
        }
        self.edges
            .retain(|e| !(e.target == *target && e.target_input == target_input));

        log::debug!(
            "connecting {}:{} -> {}:{}",
            source,
            source_output,
            target,
            target_input
        );
        self.edges.push(edge);
        self.mark_dirty(target);
        self.revision += 1;
        Ok(())
    }

    /// Removes the edge with the given endpoint pair. Returns whether an
    /// edge was removed.
    pub fn disconnect(
        &mut self,
        source: &NodeId,
        source_output: OutputId,
        target: &NodeId,
        target_input: InputId,
    ) -> bool {
        let probe = Edge::new(source.clone(), source_output, target.clone(), target_input);
        let before = self.edges.len();
        self.edges.retain(|e| !e.connects_same(&probe));
        if self.edges.len() != before {
            self.mark_dirty(target);
            self.revision += 1;
            true
        } else {
            false
        }
    }

    /// Marks a node and everything transitively downstream of it as due for
    /// re-resolution. The store only logs; the compiler resolves.
    fn mark_dirty(&mut self, id: &NodeId) {
        let mut queue = vec![id.clone()];
        while let Some(current) = queue.pop() {
            if !self.dirty.insert(current.clone()) {
                continue;
            }
            for edge in self.edges.iter().filter(|e| e.source == current) {
                queue.push(edge.target.clone());
            }
        }
    }

    fn touch_geometry(&mut self, id: &NodeId) {
        self.next_touch += 1;
        if let Some(instance) = self.nodes.get_mut(id) {
            instance.touch = self.next_touch;
        }
        self.geometry_dirty.insert(id.clone());
    }

    /// Drains the dirty log.
    pub fn take_dirty(&mut self) -> AHashSet<NodeId> {
        std::mem::take(&mut self.dirty)
    }

    /// Drains the set of nodes whose geometry changed since the last pass.
    pub fn take_geometry_dirty(&mut self) -> AHashSet<NodeId> {
        std::mem::take(&mut self.geometry_dirty)
    }

    /// Writes the derived fields of a finished compilation pass back onto
    /// the instances: per-node validity, edge completeness and parent
    /// assignments. This is the only path that sets those fields.
    pub fn apply_plan(&mut self, plan: &crate::compiler::CompiledPlan) {
        for compiled in &plan.nodes {
            if let Some(instance) = self.nodes.get_mut(&compiled.id) {
                instance.invalid = compiled.invalid();
            }
        }
        for (id, parent) in &plan.parents {
            if let Some(instance) = self.nodes.get_mut(id) {
                instance.parent = parent.clone();
            }
        }
        for edge in &mut self.edges {
            let key = crate::compiler::EdgeRef {
                source: edge.source.clone(),
                source_output: edge.source_output,
                target: edge.target.clone(),
                target_input: edge.target_input,
            };
            edge.complete = plan.edge_complete.get(&key).copied().unwrap_or(false);
        }
    }

    /// Snapshots the persistable state, ordered by node id for stable
    /// output.
    pub fn save_graph(&self) -> SavedGraph {
        SavedGraph {
            nodes: self
                .nodes
                .values()
                .cloned()
                .sorted_by(|a, b| a.id.cmp(&b.id))
                .collect(),
            edges: self.edges.clone(),
        }
    }

    /// Rebuilds a store from a saved graph. Derived fields are reset;
    /// every node's schema must be registered.
    pub fn load_graph(
        saved: SavedGraph,
        registry: &SchemaRegistry,
    ) -> Result<Self, StoreError> {
        let mut store = GraphStore::new();
        for mut node in saved.nodes {
            if !registry.contains(&node.schema_id) {
                return Err(StoreError::UnknownSchema(node.schema_id.clone()));
            }
            node.invalid = false;
            node.percent_complete = 0.0;
            node.animated = false;
            node.touch = 0;
            // Keep generated ids from colliding with loaded ones.
            if let Some(n) = node
                .id
                .strip_prefix("node-")
                .and_then(|s| s.parse::<u64>().ok())
            {
                store.next_node = store.next_node.max(n + 1);
            }
            store.dirty.insert(node.id.clone());
            store.nodes.insert(node.id.clone(), node);
        }
        for edge in saved.edges {
            if !store.nodes.contains_key(&edge.source) {
                return Err(StoreError::UnknownNode(edge.source));
            }
            if !store.nodes.contains_key(&edge.target) {
                return Err(StoreError::UnknownNode(edge.target));
            }
            store.edges.push(Edge { complete: false, ..edge });
        }
        Ok(store)
    }
}
