use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::ColumnDescriptor;

/// Runtime identity of an entity type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityTarget {
    type_id: TypeId,
    type_name: &'static str,
}

impl EntityTarget {
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Debug for EntityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityTarget").field(&self.type_name).finish()
    }
}

/// Storage metadata of one entity: where it lives and what its columns are.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    pub target: EntityTarget,
    pub table_name: String,
    /// Table path including schema/database prefix; equals `table_name` when unprefixed.
    pub table_path: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl EntityMetadata {
    #[must_use]
    pub fn new<T: 'static>(table_name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        let table_name = table_name.into();
        Self {
            target: EntityTarget::of::<T>(),
            table_path: table_name.clone(),
            table_name,
            columns,
        }
    }

    #[must_use]
    pub fn find_column(&self, property_name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|col| col.property_name == property_name)
    }

    #[must_use]
    pub fn primary_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns.iter().filter(|col| col.primary).collect()
    }
}

/// Source of entity metadata consulted when aliases are resolved.
pub trait MetadataProvider {
    fn metadata_for_target(&self, target: &EntityTarget) -> Option<Arc<EntityMetadata>>;

    fn metadata_for_table(&self, table_path: &str) -> Option<Arc<EntityMetadata>>;
}

/// In-memory [`MetadataProvider`] keyed by entity type and table path.
#[derive(Debug, Default, Clone)]
pub struct MetadataRegistry {
    by_target: HashMap<EntityTarget, Arc<EntityMetadata>>,
    by_table: HashMap<String, Arc<EntityMetadata>>,
}

impl MetadataRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata, replacing any earlier entry for the same entity or table.
    pub fn register(&mut self, metadata: EntityMetadata) -> Arc<EntityMetadata> {
        let metadata = Arc::new(metadata);
        self.by_target.insert(metadata.target, Arc::clone(&metadata));
        self.by_table
            .insert(metadata.table_path.clone(), Arc::clone(&metadata));
        metadata
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

impl MetadataProvider for MetadataRegistry {
    fn metadata_for_target(&self, target: &EntityTarget) -> Option<Arc<EntityMetadata>> {
        self.by_target.get(target).cloned()
    }

    fn metadata_for_table(&self, table_path: &str) -> Option<Arc<EntityMetadata>> {
        self.by_table.get(table_path).cloned()
    }
}
