use crate::schema::{InputValue, SchemaId};
use crate::ty::InputId;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Node instance identifier. Assigned by the store on placement.
pub type NodeId = String;

/// An absolute position on the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        // Footprint of a freshly placed node before the editor resizes it.
        Size {
            width: 240.0,
            height: 120.0,
        }
    }
}

/// The content box of an iteration container, offset from the owning
/// node's origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IteratorSize {
    pub width: f64,
    pub height: f64,
    pub offset_top: f64,
    pub offset_left: f64,
}

/// A placed, editable occurrence of a schema within a graph.
///
/// The `invalid`, `percent_complete` and `animated` fields are derived:
/// they are recomputed by the compiler (or written by the external
/// executor) and excluded from persistence, so a saved graph round-trips
/// to an identical store regardless of execution state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInstance {
    pub id: NodeId,
    pub schema_id: SchemaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<NodeId>,
    pub input_data: AHashMap<InputId, InputValue>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub is_locked: bool,
    pub position: Point,
    #[serde(default)]
    pub size: Size,
    /// Present only for nodes acting as iteration containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterator_size: Option<IteratorSize>,
    /// Layout ceiling for nested content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(skip)]
    pub(crate) invalid: bool,
    #[serde(skip)]
    pub(crate) percent_complete: f64,
    #[serde(skip)]
    pub(crate) animated: bool,
    /// Monotonic stamp of the last geometry edit; drives the containment
    /// tie-break. Not persisted.
    #[serde(skip)]
    pub(crate) touch: u64,
}

impl NodeInstance {
    /// The enclosing iterator, if any. Assigned by the containment pass,
    /// never by editors.
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    /// Derived validity from the last compilation pass.
    pub fn invalid(&self) -> bool {
        self.invalid
    }

    /// Execution progress in `0.0..=1.0`, written by the external executor.
    pub fn percent_complete(&self) -> f64 {
        self.percent_complete
    }

    /// Whether the node is currently executing.
    pub fn animated(&self) -> bool {
        self.animated
    }

    pub fn is_iterator(&self) -> bool {
        self.iterator_size.is_some()
    }
}
