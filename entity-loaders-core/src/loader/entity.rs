//! Loader for a single entity.

use std::fmt;

use tracing::{debug, trace};

use super::{Loader, RelationLoadQuery};
use crate::config::LoaderConfig;
use crate::context::PersistenceContext;
use crate::entity::{Entity, EntityState};
use crate::query::LoadQuery;
use crate::relation::Relation;

/// Loader bound to one context and one entity.
///
/// Built by [`get_loader`](super::get_loader) or
/// [`LoaderExt::loader`](super::LoaderExt::loader), which check that the
/// entity type is mapped.
pub struct EntityLoader<'a, C, E> {
    context: &'a C,
    entity: &'a mut E,
    config: LoaderConfig,
}

impl<'a, C: PersistenceContext, E: Entity> EntityLoader<'a, C, E> {
    pub(crate) fn new(context: &'a C, entity: &'a mut E, config: LoaderConfig) -> Self {
        Self {
            context,
            entity,
            config,
        }
    }

    /// The bound entity.
    pub fn entity(&self) -> &E {
        &*self.entity
    }

    /// The bound entity, mutably.
    pub fn entity_mut(&mut self) -> &mut E {
        &mut *self.entity
    }

    /// The context this loader delegates to.
    pub fn context(&self) -> &'a C {
        self.context
    }

    /// The configuration this loader was built with.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Current tracked state of the bound entity.
    pub fn state(&self) -> EntityState {
        self.context.state(&*self.entity)
    }

    /// Whether the bound entity has a stored counterpart.
    pub fn is_persisted(&self) -> bool {
        self.state().is_persisted()
    }

    /// Read the state once and report whether `operation` may proceed.
    fn guard(&self, operation: &'static str, relation: Option<&'static str>) -> bool {
        let state = self.state();
        if state.is_persisted() {
            return true;
        }

        if self.config.log_skipped {
            debug!(
                entity = E::ENTITY_NAME,
                state = %state,
                operation,
                relation,
                "entity is not persisted, skipping"
            );
        }
        false
    }
}

impl<C: PersistenceContext, E: Entity> Loader<C, E> for EntityLoader<'_, C, E> {
    fn reload(&mut self) -> Result<(), C::Error> {
        if !self.guard("reload", None) {
            return Ok(());
        }

        trace!(entity = E::ENTITY_NAME, "reloading entity");
        self.context.reload(&mut *self.entity)
    }

    fn load<Rel: Relation<E>>(&mut self, relation: Rel) -> Result<(), C::Error> {
        let descriptor = relation.descriptor();
        if !self.guard("load", Some(descriptor.name)) {
            return Ok(());
        }

        if relation.is_loaded_in(self.context, &*self.entity) {
            trace!(
                entity = E::ENTITY_NAME,
                relation = descriptor.name,
                "relation already loaded"
            );
            return Ok(());
        }

        trace!(
            entity = E::ENTITY_NAME,
            relation = descriptor.name,
            cardinality = %descriptor.cardinality,
            "loading relation"
        );
        relation.load_in(self.context, &mut *self.entity)
    }

    fn load_query<Rel: Relation<E>>(
        &self,
        relation: Rel,
    ) -> Result<RelationLoadQuery<C, Rel::Target>, C::Error> {
        let descriptor = relation.descriptor();
        if !self.guard("load_query", Some(descriptor.name)) {
            return Ok(LoadQuery::empty());
        }

        trace!(
            entity = E::ENTITY_NAME,
            relation = descriptor.name,
            "building relation query"
        );
        relation
            .query_in(self.context, &*self.entity)
            .map(LoadQuery::from_source)
    }
}

impl<C, E: fmt::Debug> fmt::Debug for EntityLoader<'_, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityLoader")
            .field("entity", &self.entity)
            .field("config", &self.config)
            .finish()
    }
}
