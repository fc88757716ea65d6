//! # Kairo - Dataflow Graph Type Resolution and Compilation Engine
//!
//! **Kairo** is the core engine behind a node-based visual authoring tool:
//! it evaluates the structural type language attached to node inputs and
//! outputs, including types that depend on the concrete values chosen for
//! sibling inputs, and compiles an editable, possibly-invalid graph of
//! node instances and edges into a validated, execution-ready plan.
//!
//! ## Core Workflow
//!
//! 1.  **Register schemas**: feed immutable node-type definitions into the
//!     [`schema::SchemaRegistry`], one per node type. Batch ingestion reports
//!     a listed reason per malformed schema instead of failing wholesale.
//! 2.  **Edit the graph**: place nodes, bind literals, connect edges and
//!     move things around through the [`graph::GraphStore`]. Every mutation
//!     is validated, serialized, and logged in a dirty set.
//! 3.  **Compile**: run the [`compiler::GraphCompiler`] to get a
//!     [`compiler::CompiledPlan`]: one execution-ready projection per node,
//!     a topological execution order, edge completeness, and per-node
//!     invalid reasons. Only a cyclic graph aborts the pass.
//! 4.  **Apply and hand off**: write the derived flags back with
//!     [`graph::GraphStore::apply_plan`] and pass the plan to the external
//!     executor. Execution progress flows back through the store's progress
//!     surface and is propagated by the next pass.
//!
//! ## Quick Start
//!
//! ```rust
//! use kairo::prelude::*;
//! use kairo::schema::{Input, InputKind, Output, Schema};
//! use kairo::ty::TypeExpr;
//!
//! fn main() -> Result<()> {
//!     let mut registry = SchemaRegistry::new();
//!     registry.register(Schema {
//!         schema_id: SchemaId::new("demo:constant"),
//!         name: "Constant".to_string(),
//!         category: String::new(),
//!         subcategory: String::new(),
//!         description: String::new(),
//!         icon: String::new(),
//!         node_type: None,
//!         inputs: vec![Input {
//!             id: 0,
//!             label: "Value".to_string(),
//!             ty: TypeExpr::Number,
//!             kind: InputKind::Number,
//!             optional: false,
//!             has_handle: false,
//!             default: Some(InputValue::Number(0.0)),
//!             file_kind: None,
//!             filetypes: vec![],
//!             options: vec![],
//!         }],
//!         // The output type mirrors the value chosen for input 0.
//!         outputs: vec![Output {
//!             id: 0,
//!             label: "Out".to_string(),
//!             ty: TypeExpr::InputRef { input: 0 },
//!         }],
//!         has_side_effects: false,
//!     })?;
//!
//!     let mut store = GraphStore::new();
//!     let node = store.create_node(&registry, &SchemaId::new("demo:constant"), Point::default())?;
//!     store.set_input_value(&registry, &node, 0, InputValue::Number(42.0))?;
//!
//!     let plan = GraphCompiler::new(&registry).compile(&store)?;
//!     store.apply_plan(&plan);
//!
//!     assert_eq!(plan.order, vec![node.clone()]);
//!     assert!(!plan.node(&node).unwrap().invalid());
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod schema;
pub mod ty;
