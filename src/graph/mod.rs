//! Mutable graph state: node instances, edges, the store that serializes
//! edits, and the geometric containment rule for iterator nesting.

pub mod containment;
mod edge;
mod node;
mod store;

pub use containment::{Bounds, IteratorBox, NodeBox, assign_parents};
pub use edge::Edge;
pub use node::{IteratorSize, NodeId, NodeInstance, Point, Size};
pub use store::{GraphStore, SavedGraph};
