//! Immutable node-type definitions and the registry that indexes them.

mod registry;

pub use registry::{SchemaRegistry, SchemaRejection};

use crate::error::SchemaRejectReason;
use crate::ty::{InputId, OutputId, TypeExpr};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifies a schema. Stable across sessions; schemas are only ever
/// replaced wholesale under the same id, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(String);

impl SchemaId {
    pub fn new(id: impl Into<String>) -> Self {
        SchemaId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SchemaId {
    fn from(id: &str) -> Self {
        SchemaId(id.to_string())
    }
}

/// A literal value bound to an input: the original data model allows
/// strings and numbers only. Externally tagged so that it also survives
/// non-self-describing formats (the compiled-plan artifact).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            InputValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The domain of literal values an input accepts in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    Number,
    Slider,
    Dropdown,
    Text,
    TextLine,
    Directory,
    File,
    Generic,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputKind::Number => "number",
            InputKind::Slider => "slider",
            InputKind::Dropdown => "dropdown",
            InputKind::Text => "text",
            InputKind::TextLine => "text-line",
            InputKind::Directory => "directory",
            InputKind::File => "file",
            InputKind::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

/// Distinguishes opaque file-handle inputs by content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pth,
    Pt,
    Video,
    Bin,
    Param,
    Onnx,
}

/// One selectable entry of a dropdown input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputOption {
    pub option: String,
    pub value: InputValue,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeExpr>,
}

/// An input port declaration. Immutable once the schema is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: InputId,
    pub label: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub kind: InputKind,
    #[serde(default)]
    pub optional: bool,
    /// Whether the input may be fed by an edge. When false, a literal value
    /// must be present at evaluation time.
    #[serde(default)]
    pub has_handle: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<InputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_kind: Option<FileKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filetypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<InputOption>,
}

impl Input {
    /// Checks a literal value against this input's kind domain.
    pub fn accepts(&self, value: &InputValue) -> bool {
        match self.kind {
            InputKind::Number | InputKind::Slider => {
                matches!(value, InputValue::Number(_))
            }
            InputKind::Dropdown => {
                if self.options.is_empty() {
                    true
                } else {
                    self.options.iter().any(|o| o.value == *value)
                }
            }
            InputKind::Text
            | InputKind::TextLine
            | InputKind::Directory
            | InputKind::File => matches!(value, InputValue::Text(_)),
            InputKind::Generic => true,
        }
    }
}

/// An output port declaration.
///
/// Output type expressions may reference the values of sibling inputs of
/// the same node, never other nodes; cross-node type flow happens only
/// through edges at the graph level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: OutputId,
    pub label: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

/// An immutable node-type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub schema_id: SchemaId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub has_side_effects: bool,
}

impl Schema {
    /// Marks this schema as an iteration container.
    pub fn is_iterator(&self) -> bool {
        self.node_type.as_deref() == Some("iterator")
    }

    pub fn input(&self, id: InputId) -> Option<&Input> {
        self.inputs.iter().find(|i| i.id == id)
    }

    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// Validates internal consistency: unique port ids, and every type
    /// expression referencing only declared inputs. Returns all problems
    /// found, not just the first.
    pub fn validate(&self) -> Vec<SchemaRejectReason> {
        let mut reasons = Vec::new();

        let mut seen_inputs = HashSet::new();
        for input in &self.inputs {
            if !seen_inputs.insert(input.id) {
                reasons.push(SchemaRejectReason::DuplicateInputId(input.id));
            }
        }
        let mut seen_outputs = HashSet::new();
        for output in &self.outputs {
            if !seen_outputs.insert(output.id) {
                reasons.push(SchemaRejectReason::DuplicateOutputId(output.id));
            }
        }

        let declared: HashSet<InputId> = self.inputs.iter().map(|i| i.id).collect();
        for input in &self.inputs {
            let mut referenced = HashSet::new();
            input.ty.referenced_inputs(&mut referenced);
            for id in referenced {
                if !declared.contains(&id) {
                    reasons.push(SchemaRejectReason::UnknownInputRef {
                        declared_on: format!("input {}", input.id),
                        referenced: id,
                    });
                }
            }
        }
        for output in &self.outputs {
            let mut referenced = HashSet::new();
            output.ty.referenced_inputs(&mut referenced);
            for id in referenced {
                if !declared.contains(&id) {
                    reasons.push(SchemaRejectReason::UnknownInputRef {
                        declared_on: format!("output {}", output.id),
                        referenced: id,
                    });
                }
            }
        }

        reasons
    }
}
