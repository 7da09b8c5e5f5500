use std::sync::Arc;

use tracing::debug;

use crate::error::OrmDriverError;
use crate::metadata::{EntityMetadata, MetadataProvider};

use super::binding::{Alias, AliasKind};

/// Aliases of one query-construction session, in declaration order.
///
/// Names are unique within a registry. Query generation should go through
/// [`AliasRegistry::require_bound`], which refuses aliases that are still unresolved.
#[derive(Debug, Default, Clone)]
pub struct AliasRegistry {
    aliases: Vec<Alias>,
    main_alias: Option<String>,
}

impl AliasRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new alias.
    ///
    /// # Errors
    /// Returns [`OrmDriverError::DuplicateAlias`] if the name is already taken.
    pub fn create(
        &mut self,
        kind: AliasKind,
        name: impl Into<String>,
        metadata: Option<Arc<EntityMetadata>>,
    ) -> Result<&mut Alias, OrmDriverError> {
        self.insert(Alias::new(kind, name, metadata))
    }

    /// Register a pre-built alias (e.g. one carrying a subquery or table path).
    ///
    /// # Errors
    /// Returns [`OrmDriverError::DuplicateAlias`] if the name is already taken.
    pub fn insert(&mut self, alias: Alias) -> Result<&mut Alias, OrmDriverError> {
        if self.find(alias.name()).is_some() {
            return Err(OrmDriverError::DuplicateAlias {
                name: alias.name().to_string(),
            });
        }
        if alias.kind == AliasKind::From && self.main_alias.is_none() {
            self.main_alias = Some(alias.name().to_string());
        }
        self.aliases.push(alias);
        let idx = self.aliases.len() - 1;
        Ok(&mut self.aliases[idx])
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|alias| alias.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Alias> {
        self.aliases.iter_mut().find(|alias| alias.name() == name)
    }

    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] if no alias has this name.
    pub fn get(&self, name: &str) -> Result<&Alias, OrmDriverError> {
        self.find(name).ok_or_else(|| OrmDriverError::UnresolvedAlias {
            name: name.to_string(),
        })
    }

    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] if no alias has this name.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Alias, OrmDriverError> {
        self.find_mut(name)
            .ok_or_else(|| OrmDriverError::UnresolvedAlias {
                name: name.to_string(),
            })
    }

    /// Alias with metadata bound, ready for SQL generation or hydration.
    ///
    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] if the alias is unknown or has no metadata.
    pub fn require_bound(&self, name: &str) -> Result<&Alias, OrmDriverError> {
        let alias = self.get(name)?;
        alias.metadata()?;
        Ok(alias)
    }

    /// First `From` alias registered, unless overridden.
    ///
    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] if no main alias was set.
    pub fn main_alias(&self) -> Result<&Alias, OrmDriverError> {
        match &self.main_alias {
            Some(name) => self.get(name),
            None => Err(OrmDriverError::UnresolvedAlias {
                name: "<main>".into(),
            }),
        }
    }

    /// # Errors
    /// Returns [`OrmDriverError::UnresolvedAlias`] if no alias has this name.
    pub fn set_main_alias(&mut self, name: &str) -> Result<(), OrmDriverError> {
        self.get(name)?;
        self.main_alias = Some(name.to_string());
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.aliases.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Alias> {
        self.aliases.iter_mut()
    }

    /// Names of aliases still waiting for metadata.
    #[must_use]
    pub fn unresolved(&self) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|alias| !alias.has_metadata())
            .map(Alias::name)
            .collect()
    }

    /// Deferred-resolution pass: bind every unbound alias whose table path the provider knows.
    ///
    /// Subquery aliases are left alone. Returns how many aliases were bound.
    pub fn resolve_deferred(&mut self, provider: &dyn MetadataProvider) -> usize {
        let mut resolved = 0;
        for alias in self
            .aliases
            .iter_mut()
            .filter(|alias| !alias.has_metadata() && alias.sub_query.is_none())
        {
            let Some(table_path) = alias.table_path.as_deref() else {
                continue;
            };
            if let Some(metadata) = provider.metadata_for_table(table_path) {
                debug!(alias = alias.name(), table = table_path, "resolved deferred alias");
                alias.set_metadata(metadata);
                resolved += 1;
            }
        }
        resolved
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
