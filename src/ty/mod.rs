//! The structural type language and its evaluator.

mod eval;
mod expr;
mod value;

pub use eval::{Binding, evaluate};
pub use expr::{StructField, TypeExpr};
pub use value::{StructTy, Ty};

/// Identifies an input within a single schema. Stable for the schema's lifetime.
pub type InputId = u32;
/// Identifies an output within a single schema.
pub type OutputId = u32;
