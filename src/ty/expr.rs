use super::InputId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The wire form of a structural type expression, as attached to schema
/// inputs and outputs.
///
/// An expression is data describing a type, not a value. It may reference
/// the *values* chosen for sibling inputs of the same node through
/// [`TypeExpr::InputRef`], which is what makes output types value-dependent.
/// Expressions are pure: given a binding for every referenced input they
/// always reduce to the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TypeExpr {
    /// The top type; every type is assignable to it.
    Any,
    /// The empty type. Evaluating it is always a contradiction.
    Never,
    /// The full numeric domain.
    Number,
    /// A closed numeric interval. `min <= max`; infinities are allowed.
    Interval { min: f64, max: f64 },
    /// A finite set of numeric literals.
    NumberLiterals { values: Vec<f64> },
    /// The full string domain.
    Text,
    /// A finite set of string literals.
    TextLiterals { values: Vec<String> },
    /// A labeled structural form, e.g. an image type with `width`,
    /// `height` and `channels` fields.
    Struct {
        name: String,
        #[serde(default)]
        fields: Vec<StructField>,
    },
    Union {
        items: Vec<TypeExpr>,
    },
    Intersection {
        items: Vec<TypeExpr>,
    },
    /// The type of the literal value currently bound to a sibling input.
    InputRef { input: InputId },
}

/// A single named field of a [`TypeExpr::Struct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

impl TypeExpr {
    /// Collects every input id this expression references, recursively.
    ///
    /// The schema registry uses this to reject expressions that point at
    /// inputs the schema does not declare.
    pub fn referenced_inputs(&self, inputs: &mut HashSet<InputId>) {
        match self {
            TypeExpr::InputRef { input } => {
                inputs.insert(*input);
            }
            TypeExpr::Union { items } | TypeExpr::Intersection { items } => {
                for item in items {
                    item.referenced_inputs(inputs);
                }
            }
            TypeExpr::Struct { fields, .. } => {
                for field in fields {
                    field.ty.referenced_inputs(inputs);
                }
            }
            TypeExpr::Any
            | TypeExpr::Never
            | TypeExpr::Number
            | TypeExpr::Interval { .. }
            | TypeExpr::NumberLiterals { .. }
            | TypeExpr::Text
            | TypeExpr::TextLiterals { .. } => {}
        }
    }
}
