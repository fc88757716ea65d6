use crate::error::ArtifactError;
use crate::graph::NodeId;
use crate::schema::{InputValue, SchemaId};
use crate::ty::{InputId, OutputId, Ty};
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

/// Identifies an edge by its endpoint pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    pub source: NodeId,
    pub source_output: OutputId,
    pub target: NodeId,
    pub target_input: InputId,
}

/// A reference to an upstream output whose value is supplied at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeHandle {
    pub node: NodeId,
    pub index: OutputId,
}

/// One positional input of a compiled node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolvedInput {
    /// A literal chosen in the editor.
    Literal(InputValue),
    /// Fed at run time by the connected upstream output.
    Handle(EdgeHandle),
    /// No usable value: disconnected, broken edge, or invalid upstream.
    Unresolved,
}

/// One positional output of a compiled node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolvedOutput {
    Resolved(Ty),
    Unresolved,
}

/// Why a node is invalid, as a displayable reason code for the UI.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvalidReason {
    #[error("Required input {0} has no literal and no complete edge")]
    MissingRequiredInput(InputId),

    #[error("The literal bound to input {0} contradicts the input's declared type")]
    InputContradiction(InputId),

    #[error("The type expression on {declared_on} references input {referenced}, which is unresolved")]
    Unresolvable {
        declared_on: String,
        referenced: InputId,
    },

    #[error("The type expression on {declared_on} reduced to the empty type")]
    Contradiction { declared_on: String },

    #[error("Schema '{0}' is not registered")]
    UnknownSchema(SchemaId),
}

/// The execution-ready projection of a node instance.
///
/// Strictly derived data: it owns no state and is rebuilt whole on every
/// compilation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledNode {
    pub id: NodeId,
    pub schema_id: SchemaId,
    /// Positional, in the schema's input order.
    pub inputs: Vec<ResolvedInput>,
    /// Positional, in the schema's output order.
    pub outputs: Vec<ResolvedOutput>,
    /// Whether the node is nested under an iterator.
    pub child: bool,
    /// Nested node ids in stable order; present only for iterator nodes.
    pub children: Option<Vec<NodeId>>,
    pub node_type: Option<String>,
    /// Execution progress propagated from the store.
    pub percent: f64,
    pub has_side_effects: bool,
    /// False for disabled nodes. They still participate in type resolution
    /// so downstream nodes can see the break, but must not be executed.
    pub executable: bool,
    pub locked: bool,
    /// Empty for valid nodes.
    pub reasons: Vec<InvalidReason>,
}

impl CompiledNode {
    pub fn invalid(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// The complete output of one compilation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledPlan {
    /// One entry per node instance, in execution order.
    pub nodes: Vec<CompiledNode>,
    /// Topological execution order, dependency-first.
    pub order: Vec<NodeId>,
    /// Completeness per edge: both endpoint types resolved and mutually
    /// assignable.
    pub edge_complete: AHashMap<EdgeRef, bool>,
    /// Containment assignment: node id to enclosing iterator (or none).
    pub parents: AHashMap<NodeId, Option<NodeId>>,
    /// The store revision this plan was built from. Callers discard plans
    /// whose revision no longer matches the store.
    pub revision: u64,
}

impl CompiledPlan {
    pub fn node(&self, id: &NodeId) -> Option<&CompiledNode> {
        self.nodes.iter().find(|n| n.id == *id)
    }

    /// Serializes the plan with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    /// Deserializes a plan from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(plan, _)| plan)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }

    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }
}
