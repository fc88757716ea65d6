use super::{Schema, SchemaId};
use crate::error::{RegistryError, SchemaRejectReason};
use ahash::AHashMap;

/// A schema rejected during batch registration, with every reason found.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRejection {
    pub schema_id: SchemaId,
    pub reasons: Vec<SchemaRejectReason>,
}

/// Indexes immutable schemas by id.
///
/// The registry is append/replace-only during a session's configuration
/// phase and read-only during graph editing, so lookups need no locking
/// once configuration is frozen.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: AHashMap<SchemaId, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new schema. Fails if the id is taken; use
    /// [`SchemaRegistry::replace`] for wholesale replacement.
    pub fn register(&mut self, schema: Schema) -> Result<(), RegistryError> {
        if self.schemas.contains_key(&schema.schema_id) {
            return Err(RegistryError::DuplicateSchemaId(schema.schema_id));
        }
        self.schemas.insert(schema.schema_id.clone(), schema);
        Ok(())
    }

    /// Replaces a schema under an existing id, or registers it fresh.
    pub fn replace(&mut self, schema: Schema) {
        self.schemas.insert(schema.schema_id.clone(), schema);
    }

    pub fn lookup(&self, id: &SchemaId) -> Result<&Schema, RegistryError> {
        self.schemas
            .get(id)
            .ok_or_else(|| RegistryError::UnknownSchema(id.clone()))
    }

    pub fn contains(&self, id: &SchemaId) -> bool {
        self.schemas.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Ingests a batch of schema definitions.
    ///
    /// Malformed entries are reported individually with every reason found
    /// (duplicate id, duplicate port ids, dangling input references) while
    /// the valid remainder is registered. There is no aggregate failure.
    pub fn register_batch(
        &mut self,
        schemas: impl IntoIterator<Item = Schema>,
    ) -> Vec<SchemaRejection> {
        let mut rejections = Vec::new();
        for schema in schemas {
            let mut reasons = schema.validate();
            if self.schemas.contains_key(&schema.schema_id) {
                reasons.push(SchemaRejectReason::DuplicateSchemaId);
            }
            if reasons.is_empty() {
                self.schemas.insert(schema.schema_id.clone(), schema);
            } else {
                log::warn!(
                    "rejecting schema '{}': {} problem(s)",
                    schema.schema_id,
                    reasons.len()
                );
                rejections.push(SchemaRejection {
                    schema_id: schema.schema_id,
                    reasons,
                });
            }
        }
        rejections
    }
}
