use crate::graph::NodeId;
use crate::schema::{InputKind, InputValue, SchemaId};
use crate::ty::{InputId, OutputId};
use thiserror::Error;

/// Errors raised by the schema registry for single-schema operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Schema '{0}' is already registered")]
    DuplicateSchemaId(SchemaId),

    #[error("Schema '{0}' is not registered")]
    UnknownSchema(SchemaId),
}

/// A single reason a schema was rejected during batch registration.
///
/// Batch ingestion never fails as a whole: each offending schema is reported
/// with its own list of reasons while valid siblings are registered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaRejectReason {
    #[error("Schema id is already registered")]
    DuplicateSchemaId,

    #[error("Input id {0} is declared more than once")]
    DuplicateInputId(InputId),

    #[error("Output id {0} is declared more than once")]
    DuplicateOutputId(OutputId),

    #[error("Type expression on {declared_on} references undeclared input {referenced}")]
    UnknownInputRef {
        declared_on: String,
        referenced: InputId,
    },
}

/// Errors raised by mutations against the node instance store.
///
/// Every variant rejects exactly the offending operation; the store is never
/// left partially updated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Schema '{0}' is not registered")]
    UnknownSchema(SchemaId),

    #[error("Node '{0}' does not exist")]
    UnknownNode(NodeId),

    #[error("Node '{node}' has no input {input}")]
    UnknownInput { node: NodeId, input: InputId },

    #[error("Node '{node}' has no output {output}")]
    UnknownOutput { node: NodeId, output: OutputId },

    #[error("Value '{value}' does not fit the {kind} domain of input {input} on node '{node}'")]
    InvalidInputKind {
        node: NodeId,
        input: InputId,
        kind: InputKind,
        value: InputValue,
    },

    #[error("Input {input} on node '{node}' does not accept an edge")]
    InputNotConnectable { node: NodeId, input: InputId },

    #[error("An identical edge already exists")]
    DuplicateEdge,

    #[error("Node '{0}' cannot be connected to itself")]
    SelfConnection(NodeId),
}

/// Failures of type expression evaluation.
///
/// These are expected editing states, not fatal errors: the compiler folds
/// them into the owning node's `invalid` flag and keeps compiling the rest
/// of the graph.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    #[error("Type expression references input {0}, which has no resolved value")]
    Unresolvable(InputId),

    #[error("Type expression reduced to the empty type")]
    Contradiction,
}

/// Errors that abort a whole compilation pass. Cycles are the only such
/// condition; everything else degrades to per-node invalid state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    // The field cannot be named `source`: thiserror would infer it as the
    // error's cause and require `std::error::Error` on `NodeId`.
    #[error("The graph contains a cycle through the edge from '{from}' to '{to}'")]
    CyclicGraph { from: NodeId, to: NodeId },
}

/// Errors raised when saving or loading serialized artifacts (saved graphs
/// and compiled plans).
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Could not access '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Serialization failed: {0}")]
    Encode(String),

    #[error("Deserialization failed: {0}")]
    Decode(String),
}
