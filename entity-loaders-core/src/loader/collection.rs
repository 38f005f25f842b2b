//! Loader for a set of entities of one type.

use std::fmt;

use tracing::warn;

use super::{EntityLoader, Loader, RelationLoadQuery};
use crate::config::{FailurePolicy, LoaderConfig};
use crate::context::PersistenceContext;
use crate::entity::Entity;
use crate::query::LoadQuery;
use crate::relation::Relation;

/// Loader bound to one context and a set of entities.
///
/// Each operation is applied member by member through an [`EntityLoader`],
/// so every member is guarded by its own tracked state. How a failing member
/// affects the rest is decided by [`LoaderConfig::failure_policy`].
pub struct EntityCollectionLoader<'a, C, E> {
    members: Vec<EntityLoader<'a, C, E>>,
    config: LoaderConfig,
}

impl<'a, C: PersistenceContext, E: Entity> EntityCollectionLoader<'a, C, E> {
    pub(crate) fn new(
        context: &'a C,
        entities: impl IntoIterator<Item = &'a mut E>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            members: entities
                .into_iter()
                .map(|entity| EntityLoader::new(context, entity, config))
                .collect(),
            config,
        }
    }

    /// Number of bound entities.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no entities are bound.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of bound entities with a stored counterpart.
    pub fn persisted_count(&self) -> usize {
        self.members
            .iter()
            .filter(|member| member.is_persisted())
            .count()
    }

    /// Iterate over the bound entities.
    pub fn entities(&self) -> impl Iterator<Item = &E> {
        self.members.iter().map(EntityLoader::entity)
    }

    /// The per-member loaders.
    pub fn members(&self) -> &[EntityLoader<'a, C, E>] {
        &self.members
    }

    /// The configuration this loader was built with.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run `op` for every member under the configured failure policy.
    fn for_each_member<F>(&mut self, operation: &'static str, mut op: F) -> Result<(), C::Error>
    where
        F: FnMut(&mut EntityLoader<'a, C, E>) -> Result<(), C::Error>,
    {
        let mut first_error = None;

        for (index, member) in self.members.iter_mut().enumerate() {
            let Err(error) = op(member) else {
                continue;
            };

            match self.config.failure_policy {
                FailurePolicy::FailFast => return Err(error),
                FailurePolicy::BestEffort => {
                    warn!(
                        entity = E::ENTITY_NAME,
                        index,
                        operation,
                        error = %error,
                        "member failed, continuing with the rest"
                    );
                    first_error.get_or_insert(error);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl<C: PersistenceContext, E: Entity> Loader<C, E> for EntityCollectionLoader<'_, C, E> {
    fn reload(&mut self) -> Result<(), C::Error> {
        self.for_each_member("reload", |member| member.reload())
    }

    fn load<Rel: Relation<E>>(&mut self, relation: Rel) -> Result<(), C::Error> {
        self.for_each_member("load", |member| member.load(relation))
    }

    /// Concatenate the per-member queries of persisted members.
    ///
    /// Members that are not persisted contribute nothing, so a set without
    /// persisted members yields an empty query.
    fn load_query<Rel: Relation<E>>(
        &self,
        relation: Rel,
    ) -> Result<RelationLoadQuery<C, Rel::Target>, C::Error> {
        let mut query = LoadQuery::empty();
        let mut first_error = None;

        for (index, member) in self.members.iter().enumerate() {
            match member.load_query(relation) {
                Ok(member_query) => {
                    for source in member_query.into_sources() {
                        query.push(source);
                    }
                }
                Err(error) => match self.config.failure_policy {
                    FailurePolicy::FailFast => return Err(error),
                    FailurePolicy::BestEffort => {
                        warn!(
                            entity = E::ENTITY_NAME,
                            index,
                            operation = "load_query",
                            error = %error,
                            "member failed, continuing with the rest"
                        );
                        first_error.get_or_insert(error);
                    }
                },
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(query),
        }
    }
}

impl<C, E: fmt::Debug> fmt::Debug for EntityCollectionLoader<'_, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollectionLoader")
            .field("members", &self.members)
            .field("config", &self.config)
            .finish()
    }
}
