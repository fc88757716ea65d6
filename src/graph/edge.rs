use super::NodeId;
use crate::ty::{InputId, OutputId};
use serde::{Deserialize, Serialize};

/// A connection from one node's output port to another node's input port.
///
/// Edges have no identity beyond their endpoint pair. The `complete` flag
/// is derived (both endpoint types reconciled without contradiction) and is
/// recomputed by every compilation pass rather than hand-maintained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub source_output: OutputId,
    pub target: NodeId,
    pub target_input: InputId,
    #[serde(skip)]
    pub(crate) complete: bool,
}

impl Edge {
    pub fn new(
        source: NodeId,
        source_output: OutputId,
        target: NodeId,
        target_input: InputId,
    ) -> Self {
        Self {
            source,
            source_output,
            target,
            target_input,
            complete: false,
        }
    }

    /// Derived completeness from the last compilation pass.
    pub fn complete(&self) -> bool {
        self.complete
    }

    /// Endpoint-pair identity, ignoring derived state.
    pub fn connects_same(&self, other: &Edge) -> bool {
        self.source == other.source
            && self.source_output == other.source_output
            && self.target == other.target
            && self.target_input == other.target_input
    }
}
