//! Factory functions and the context extension trait.

use tracing::debug;

use super::{EntityCollectionLoader, EntityLoader};
use crate::config::LoaderConfig;
use crate::context::PersistenceContext;
use crate::entity::Entity;
use crate::error::{LoaderError, LoaderResult};

/// Build a loader for a single entity with the default configuration.
///
/// Fails with `NullArgument` when `context` or `entity` is `None`, and with
/// `ModelMismatch` when `E` is not part of the context's model.
pub fn get_loader<'a, C, E>(
    context: impl Into<Option<&'a C>>,
    entity: impl Into<Option<&'a mut E>>,
) -> LoaderResult<EntityLoader<'a, C, E>>
where
    C: PersistenceContext,
    E: Entity,
{
    get_loader_with(context, entity, LoaderConfig::default())
}

/// Build a loader for a single entity.
pub fn get_loader_with<'a, C, E>(
    context: impl Into<Option<&'a C>>,
    entity: impl Into<Option<&'a mut E>>,
    config: LoaderConfig,
) -> LoaderResult<EntityLoader<'a, C, E>>
where
    C: PersistenceContext,
    E: Entity,
{
    let context = context
        .into()
        .ok_or_else(|| LoaderError::null_argument("context"))?;
    let entity = entity
        .into()
        .ok_or_else(|| LoaderError::null_argument("entity"))?;

    build_loader(context, entity, config)
}

/// Build a loader for a set of entities with the default configuration.
///
/// `entities` is anything that yields `&mut E`: a `&mut [E; N]`, a
/// `&mut [E]`, a `&mut Vec<E>`, or an iterator. An empty set is accepted.
pub fn get_collection_loader<'a, C, E, I>(
    context: impl Into<Option<&'a C>>,
    entities: impl Into<Option<I>>,
) -> LoaderResult<EntityCollectionLoader<'a, C, E>>
where
    C: PersistenceContext,
    E: Entity,
    I: IntoIterator<Item = &'a mut E>,
{
    get_collection_loader_with(context, entities, LoaderConfig::default())
}

/// Build a loader for a set of entities.
pub fn get_collection_loader_with<'a, C, E, I>(
    context: impl Into<Option<&'a C>>,
    entities: impl Into<Option<I>>,
    config: LoaderConfig,
) -> LoaderResult<EntityCollectionLoader<'a, C, E>>
where
    C: PersistenceContext,
    E: Entity,
    I: IntoIterator<Item = &'a mut E>,
{
    let context = context
        .into()
        .ok_or_else(|| LoaderError::null_argument("context"))?;
    let entities = entities
        .into()
        .ok_or_else(|| LoaderError::null_argument("entities"))?;

    build_collection_loader(context, entities, config)
}

fn build_loader<'a, C, E>(
    context: &'a C,
    entity: &'a mut E,
    config: LoaderConfig,
) -> LoaderResult<EntityLoader<'a, C, E>>
where
    C: PersistenceContext,
    E: Entity,
{
    ensure_mapped::<C, E>(context)?;
    Ok(EntityLoader::new(context, entity, config))
}

fn build_collection_loader<'a, C, E, I>(
    context: &'a C,
    entities: I,
    config: LoaderConfig,
) -> LoaderResult<EntityCollectionLoader<'a, C, E>>
where
    C: PersistenceContext,
    E: Entity,
    I: IntoIterator<Item = &'a mut E>,
{
    ensure_mapped::<C, E>(context)?;
    Ok(EntityCollectionLoader::new(context, entities, config))
}

fn ensure_mapped<C: PersistenceContext, E: Entity>(context: &C) -> LoaderResult<()> {
    if context.metadata().contains::<E>() {
        return Ok(());
    }

    debug!(
        entity = E::ENTITY_NAME,
        full_name = E::full_name(),
        "entity type is not part of the model"
    );
    Err(LoaderError::model_mismatch::<E>())
}

/// Loader factories on every persistence context.
///
/// ```rust,ignore
/// let mut loader = ctx.loader(&mut order)?;
/// loader.load(Order::LINES)?;
///
/// ctx.collection_loader(&mut orders)?.reload()?;
/// ```
pub trait LoaderExt: PersistenceContext + Sized {
    /// Build a loader for one entity.
    fn loader<'a, E: Entity>(&'a self, entity: &'a mut E) -> LoaderResult<EntityLoader<'a, Self, E>> {
        build_loader(self, entity, LoaderConfig::default())
    }

    /// Build a loader for one entity with explicit configuration.
    fn loader_with<'a, E: Entity>(
        &'a self,
        entity: &'a mut E,
        config: LoaderConfig,
    ) -> LoaderResult<EntityLoader<'a, Self, E>> {
        build_loader(self, entity, config)
    }

    /// Build a loader for a set of entities.
    fn collection_loader<'a, E, I>(
        &'a self,
        entities: I,
    ) -> LoaderResult<EntityCollectionLoader<'a, Self, E>>
    where
        E: Entity,
        I: IntoIterator<Item = &'a mut E>,
    {
        build_collection_loader(self, entities, LoaderConfig::default())
    }

    /// Build a loader for a set of entities with explicit configuration.
    fn collection_loader_with<'a, E, I>(
        &'a self,
        entities: I,
        config: LoaderConfig,
    ) -> LoaderResult<EntityCollectionLoader<'a, Self, E>>
    where
        E: Entity,
        I: IntoIterator<Item = &'a mut E>,
    {
        build_collection_loader(self, entities, config)
    }
}

impl<C: PersistenceContext> LoaderExt for C {}
