use std::sync::Arc;

use crate::error::OrmDriverError;
use crate::metadata::{EntityMetadata, EntityTarget};

/// Where in a query an alias was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasKind {
    From,
    Select,
    Join,
    Other,
}

/// An alias name, either still waiting for metadata or bound to an entity.
///
/// Reading metadata-derived attributes from an [`AliasBinding::Unbound`] alias fails with
/// [`OrmDriverError::UnresolvedAlias`]; SQL generation must never proceed with a missing table.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasBinding {
    Unbound {
        name: String,
    },
    Bound {
        name: String,
        metadata: Arc<EntityMetadata>,
    },
}

impl AliasBinding {
    #[must_use]
    pub fn new(name: impl Into<String>, metadata: Option<Arc<EntityMetadata>>) -> Self {
        let name = name.into();
        match metadata {
            Some(metadata) => AliasBinding::Bound { name, metadata },
            None => AliasBinding::Unbound { name },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            AliasBinding::Unbound { name } | AliasBinding::Bound { name, .. } => name,
        }
    }

    #[must_use]
    pub fn has_metadata(&self) -> bool {
        matches!(self, AliasBinding::Bound { .. })
    }

    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] when no metadata is bound yet.
    pub fn metadata(&self) -> Result<&Arc<EntityMetadata>, OrmDriverError> {
        match self {
            AliasBinding::Bound { metadata, .. } => Ok(metadata),
            AliasBinding::Unbound { name } => Err(OrmDriverError::UnresolvedAlias {
                name: name.clone(),
            }),
        }
    }

    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] when no metadata is bound yet.
    pub fn target(&self) -> Result<EntityTarget, OrmDriverError> {
        self.metadata().map(|metadata| metadata.target)
    }

    /// Bind metadata, replacing whatever was bound before.
    pub fn set_metadata(&mut self, metadata: Arc<EntityMetadata>) {
        let name = match self {
            AliasBinding::Unbound { name } | AliasBinding::Bound { name, .. } => {
                std::mem::take(name)
            }
        };
        *self = AliasBinding::Bound { name, metadata };
    }
}

/// Registry entry: the binding plus what the alias stands for in the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub kind: AliasKind,
    /// Table the alias selects from, when known before metadata is bound.
    pub table_path: Option<String>,
    /// Raw subquery text for aliases over a derived table.
    pub sub_query: Option<String>,
    binding: AliasBinding,
}

impl Alias {
    #[must_use]
    pub fn new(kind: AliasKind, name: impl Into<String>, metadata: Option<Arc<EntityMetadata>>) -> Self {
        let table_path = metadata.as_ref().map(|m| m.table_path.clone());
        Self {
            kind,
            table_path,
            sub_query: None,
            binding: AliasBinding::new(name, metadata),
        }
    }

    #[must_use]
    pub fn with_table_path(mut self, table_path: impl Into<String>) -> Self {
        self.table_path = Some(table_path.into());
        self
    }

    #[must_use]
    pub fn with_sub_query(mut self, sub_query: impl Into<String>) -> Self {
        self.sub_query = Some(sub_query.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.binding.name()
    }

    #[must_use]
    pub fn binding(&self) -> &AliasBinding {
        &self.binding
    }

    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.binding.has_metadata()
    }

    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] when no metadata is bound yet.
    pub fn metadata(&self) -> Result<&Arc<EntityMetadata>, OrmDriverError> {
        self.binding.metadata()
    }

    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] when no metadata is bound yet.
    pub fn target(&self) -> Result<EntityTarget, OrmDriverError> {
        self.binding.target()
    }

    pub fn set_metadata(&mut self, metadata: Arc<EntityMetadata>) {
        self.table_path = Some(metadata.table_path.clone());
        self.binding.set_metadata(metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDescriptor, ColumnType};

    struct Photo;
    struct Album;

    fn photo_metadata() -> Arc<EntityMetadata> {
        Arc::new(EntityMetadata::new::<Photo>(
            "photo",
            vec![ColumnDescriptor::new("id", ColumnType::Integer).primary(true)],
        ))
    }

    #[test]
    fn unbound_alias_fails_loudly() {
        let binding = AliasBinding::new("photo", None);
        assert!(!binding.has_metadata());
        match binding.target() {
            Err(OrmDriverError::UnresolvedAlias { name }) => assert_eq!(name, "photo"),
            other => panic!("expected UnresolvedAlias, got {other:?}"),
        }
        let err = binding.metadata().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot get entity metadata for the given alias \"photo\""
        );
    }

    #[test]
    fn binding_later_makes_reads_succeed() {
        let mut binding = AliasBinding::new("p", None);
        let metadata = photo_metadata();
        binding.set_metadata(Arc::clone(&metadata));

        assert!(binding.has_metadata());
        assert_eq!(binding.name(), "p");
        assert!(binding.target().unwrap().is::<Photo>());
        assert!(Arc::ptr_eq(binding.metadata().unwrap(), &metadata));
    }

    #[test]
    fn set_metadata_replaces_unconditionally() {
        let mut alias = Alias::new(AliasKind::Join, "rel", Some(photo_metadata()));
        let album = Arc::new(EntityMetadata::new::<Album>("album", Vec::new()));
        alias.set_metadata(album);

        assert!(alias.target().unwrap().is::<Album>());
        assert_eq!(alias.table_path.as_deref(), Some("album"));
    }

    #[test]
    fn sub_query_alias_stays_unbound() {
        let alias = Alias::new(AliasKind::From, "counts", None)
            .with_sub_query("SELECT COUNT(*) AS cnt FROM photo");
        assert!(!alias.has_metadata());
        assert!(alias.sub_query.is_some());
        assert!(alias.metadata().is_err());
    }
}
