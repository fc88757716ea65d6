//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types of the kairo crate. Import this
//! module to get access to the core functionality without having to import
//! each type individually.

// Compilation
pub use crate::compiler::{CompiledNode, CompiledPlan, GraphCompiler, InvalidReason};

// Graph editing
pub use crate::graph::{Edge, GraphStore, IteratorSize, NodeId, Point, SavedGraph, Size};

// Schemas and values
pub use crate::schema::{InputValue, Schema, SchemaId, SchemaRegistry};

// Type language
pub use crate::ty::{Binding, Ty, TypeExpr, evaluate};

// Error types
pub use crate::error::{CompileError, RegistryError, StoreError, TypeError};

// Standard library re-exports commonly used with this crate
pub use std::collections::HashMap;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
