//! Common test utilities: a small image-pipeline schema pack and graph
//! builders.
use kairo::prelude::*;
use kairo::schema::{FileKind, Input, InputKind, Output, Schema};
use kairo::ty::{StructField, TypeExpr};

/// A bare `Image` struct type with no field constraints.
#[allow(dead_code)]
pub fn any_image() -> TypeExpr {
    TypeExpr::Struct {
        name: "Image".to_string(),
        fields: vec![],
    }
}

fn image_with_dims(width: TypeExpr, height: TypeExpr) -> TypeExpr {
    TypeExpr::Struct {
        name: "Image".to_string(),
        fields: vec![
            StructField {
                name: "width".to_string(),
                ty: width,
            },
            StructField {
                name: "height".to_string(),
                ty: height,
            },
        ],
    }
}

fn plain_input(id: u32, label: &str, ty: TypeExpr, kind: InputKind) -> Input {
    Input {
        id,
        label: label.to_string(),
        ty,
        kind,
        optional: false,
        has_handle: false,
        default: None,
        file_kind: None,
        filetypes: vec![],
        options: vec![],
    }
}

/// `test:load`: reads an image from a path literal. Output dimensions are
/// unconstrained.
#[allow(dead_code)]
pub fn schema_load() -> Schema {
    let mut path = plain_input(0, "Path", TypeExpr::Text, InputKind::File);
    path.file_kind = Some(FileKind::Image);
    path.filetypes = vec![".png".to_string(), ".jpg".to_string()];
    Schema {
        schema_id: SchemaId::new("test:load"),
        name: "Load Image".to_string(),
        category: "io".to_string(),
        subcategory: String::new(),
        description: String::new(),
        icon: String::new(),
        node_type: None,
        inputs: vec![path],
        outputs: vec![Output {
            id: 0,
            label: "Image".to_string(),
            ty: image_with_dims(TypeExpr::Number, TypeExpr::Number),
        }],
        has_side_effects: false,
    }
}

/// `test:resize`: the dependent-typing workhorse. Its output image's
/// dimensions are exactly the literals chosen for the width/height inputs.
#[allow(dead_code)]
pub fn schema_resize() -> Schema {
    let mut image = plain_input(0, "Image", any_image(), InputKind::Generic);
    image.has_handle = true;
    let mut width = plain_input(
        1,
        "Width",
        TypeExpr::Interval {
            min: 1.0,
            max: 8192.0,
        },
        InputKind::Number,
    );
    width.default = Some(InputValue::Number(256.0));
    let mut height = plain_input(
        2,
        "Height",
        TypeExpr::Interval {
            min: 1.0,
            max: 8192.0,
        },
        InputKind::Number,
    );
    height.default = Some(InputValue::Number(256.0));
    Schema {
        schema_id: SchemaId::new("test:resize"),
        name: "Resize".to_string(),
        category: "transform".to_string(),
        subcategory: String::new(),
        description: String::new(),
        icon: String::new(),
        node_type: None,
        inputs: vec![image, width, height],
        outputs: vec![Output {
            id: 0,
            label: "Image".to_string(),
            ty: image_with_dims(
                TypeExpr::InputRef { input: 1 },
                TypeExpr::InputRef { input: 2 },
            ),
        }],
        has_side_effects: false,
    }
}

/// `test:save`: side-effecting sink.
#[allow(dead_code)]
pub fn schema_save() -> Schema {
    let mut image = plain_input(0, "Image", any_image(), InputKind::Generic);
    image.has_handle = true;
    let path = plain_input(1, "Path", TypeExpr::Text, InputKind::Directory);
    Schema {
        schema_id: SchemaId::new("test:save"),
        name: "Save Image".to_string(),
        category: "io".to_string(),
        subcategory: String::new(),
        description: String::new(),
        icon: String::new(),
        node_type: None,
        inputs: vec![image, path],
        outputs: vec![],
        has_side_effects: true,
    }
}

/// `test:frames`: an iteration container producing one image per file.
#[allow(dead_code)]
pub fn schema_frames() -> Schema {
    let directory = plain_input(0, "Directory", TypeExpr::Text, InputKind::Directory);
    Schema {
        schema_id: SchemaId::new("test:frames"),
        name: "Iterate Frames".to_string(),
        category: "io".to_string(),
        subcategory: String::new(),
        description: String::new(),
        icon: String::new(),
        node_type: Some("iterator".to_string()),
        inputs: vec![directory],
        outputs: vec![Output {
            id: 0,
            label: "Frame".to_string(),
            ty: image_with_dims(TypeExpr::Number, TypeExpr::Number),
        }],
        has_side_effects: false,
    }
}

/// `test:passthrough`: generic in, generic out; handy for cycle tests.
#[allow(dead_code)]
pub fn schema_passthrough() -> Schema {
    let mut value = plain_input(0, "Value", TypeExpr::Any, InputKind::Generic);
    value.has_handle = true;
    value.optional = true;
    Schema {
        schema_id: SchemaId::new("test:passthrough"),
        name: "Passthrough".to_string(),
        category: "util".to_string(),
        subcategory: String::new(),
        description: String::new(),
        icon: String::new(),
        node_type: None,
        inputs: vec![value],
        outputs: vec![Output {
            id: 0,
            label: "Value".to_string(),
            ty: TypeExpr::Any,
        }],
        has_side_effects: false,
    }
}

/// `test:clamped`: a number input with a narrow declared interval, for
/// literal-contradiction tests.
#[allow(dead_code)]
pub fn schema_clamped() -> Schema {
    let value = plain_input(
        0,
        "Value",
        TypeExpr::Interval { min: 1.0, max: 10.0 },
        InputKind::Number,
    );
    Schema {
        schema_id: SchemaId::new("test:clamped"),
        name: "Clamped".to_string(),
        category: "util".to_string(),
        subcategory: String::new(),
        description: String::new(),
        icon: String::new(),
        node_type: None,
        inputs: vec![value],
        outputs: vec![Output {
            id: 0,
            label: "Value".to_string(),
            ty: TypeExpr::InputRef { input: 0 },
        }],
        has_side_effects: false,
    }
}

/// Registers the whole test pack.
#[allow(dead_code)]
pub fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    let rejections = registry.register_batch([
        schema_load(),
        schema_resize(),
        schema_save(),
        schema_frames(),
        schema_passthrough(),
        schema_clamped(),
    ]);
    assert!(rejections.is_empty(), "test pack must be valid");
    registry
}

/// Places a `test:load` node with its path literal already bound.
#[allow(dead_code)]
pub fn place_load(store: &mut GraphStore, registry: &SchemaRegistry, position: Point) -> NodeId {
    let id = store
        .create_node(registry, &SchemaId::new("test:load"), position)
        .unwrap();
    store
        .set_input_value(registry, &id, 0, InputValue::Text("in.png".to_string()))
        .unwrap();
    id
}
