//! Recording context used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{PersistenceContext, RelationQuery};
use crate::entity::{Entity, EntityState};
use crate::metadata::{EntityType, ForeignKey, MetadataWorkspace};
use crate::relation::{Collection, Reference, RelationDescriptor};
use crate::{collection, reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u32,
    pub name: String,
}

impl Entity for Customer {
    const ENTITY_NAME: &'static str = "Customer";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: u32,
    pub order_id: u32,
    pub sku: String,
}

impl Entity for Line {
    const ENTITY_NAME: &'static str = "Line";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u32,
    pub note: String,
    #[serde(skip)]
    pub customer: Option<Customer>,
    #[serde(skip)]
    pub lines: Vec<Line>,
}

impl Order {
    pub const CUSTOMER: Reference<Order, Customer> = reference!(Order, customer: Customer);
    pub const LINES: Collection<Order, Line> = collection!(Order, lines: Line);

    pub fn new(id: u32) -> Self {
        Self {
            id,
            note: String::new(),
            customer: None,
            lines: Vec::new(),
        }
    }
}

impl Entity for Order {
    const ENTITY_NAME: &'static str = "Order";
}

/// Registered nowhere.
#[derive(Debug, Serialize, Deserialize)]
pub struct Money {
    pub cents: i64,
}

impl Entity for Money {
    const ENTITY_NAME: &'static str = "Money";
}

#[derive(Debug, Error, PartialEq)]
#[error("store unavailable for order {0}")]
pub struct MockError(pub u32);

/// Counts every primitive call and lets tests fail chosen orders.
#[derive(Default)]
pub struct MockContext {
    metadata: MetadataWorkspace,
    states: RefCell<HashMap<u32, EntityState>>,
    loaded: RefCell<HashSet<(u32, &'static str)>>,
    failing: RefCell<HashSet<u32>>,
    pub state_lookups: Cell<usize>,
    pub reloads: Cell<usize>,
    pub loads: Cell<usize>,
    pub queries: Cell<usize>,
    pub fetches: Rc<Cell<usize>>,
}

impl MockContext {
    pub fn new() -> Self {
        let mut metadata = MetadataWorkspace::new();
        metadata.register(
            EntityType::of::<Order>()
                .reference::<Customer>("customer", ForeignKey::source("customer_id"))
                .collection::<Line>("lines", ForeignKey::target("order_id")),
        );
        metadata.register(EntityType::of::<Customer>());
        metadata.register(EntityType::of::<Line>());

        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn set_state(&self, id: u32, state: EntityState) {
        self.states.borrow_mut().insert(id, state);
    }

    pub fn fail(&self, id: u32) {
        self.failing.borrow_mut().insert(id);
    }

    pub fn store_calls(&self) -> usize {
        self.reloads.get() + self.loads.get() + self.fetches.get()
    }

    fn id_of<E: Entity>(entity: &E) -> u32 {
        serde_json::to_value(entity)
            .ok()
            .and_then(|value| value.get(E::PRIMARY_KEY).and_then(|id| id.as_u64()))
            .map_or(0, |id| id as u32)
    }

    fn check(&self, id: u32) -> Result<(), MockError> {
        if self.failing.borrow().contains(&id) {
            Err(MockError(id))
        } else {
            Ok(())
        }
    }

    fn mark_loaded<E: Entity>(&self, entity: &E, relation: RelationDescriptor) {
        self.loaded
            .borrow_mut()
            .insert((Self::id_of(entity), relation.name));
    }

    fn is_loaded<E: Entity>(&self, entity: &E, relation: RelationDescriptor) -> bool {
        self.loaded
            .borrow()
            .contains(&(Self::id_of(entity), relation.name))
    }

    fn rows(id: u32) -> Vec<serde_json::Value> {
        (1..=2)
            .map(|n| {
                serde_json::json!({
                    "id": id * 10 + n,
                    "order_id": id,
                    "sku": format!("SKU-{}", n),
                    "name": format!("customer-{}", id),
                })
            })
            .collect()
    }

    fn decode<R: Entity>(rows: &[serde_json::Value]) -> Vec<R> {
        rows.iter()
            .filter_map(|row| serde_json::from_value::<R>(row.clone()).ok())
            .collect()
    }

    fn query<E: Entity, R: Entity>(&self, entity: &E) -> Result<MockQuery<R>, MockError> {
        let id = Self::id_of(entity);
        self.check(id)?;
        self.queries.set(self.queries.get() + 1);
        Ok(MockQuery {
            rows: Self::rows(id),
            filters: Vec::new(),
            fetches: Rc::clone(&self.fetches),
        })
    }
}

pub struct MockQuery<R> {
    rows: Vec<serde_json::Value>,
    filters: Vec<Rc<dyn Fn(&R) -> bool>>,
    fetches: Rc<Cell<usize>>,
}

impl<R> fmt::Debug for MockQuery<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockQuery")
            .field("rows", &self.rows.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl<R: Entity> RelationQuery<R> for MockQuery<R> {
    type Error = MockError;

    fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + 'static,
    {
        self.filters.push(Rc::new(predicate));
        self
    }

    fn skip(mut self, n: usize) -> Self {
        self.rows = self.rows.into_iter().skip(n).collect();
        self
    }

    fn take(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    fn fetch(&self) -> Result<Vec<R>, MockError> {
        self.fetches.set(self.fetches.get() + 1);
        Ok(MockContext::decode::<R>(&self.rows)
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f(row)))
            .collect())
    }
}

impl PersistenceContext for MockContext {
    type Error = MockError;
    type Query<R: Entity> = MockQuery<R>;

    fn metadata(&self) -> &MetadataWorkspace {
        &self.metadata
    }

    fn state<E: Entity>(&self, entity: &E) -> EntityState {
        self.state_lookups.set(self.state_lookups.get() + 1);
        self.states
            .borrow()
            .get(&Self::id_of(entity))
            .copied()
            .unwrap_or_default()
    }

    fn reload<E: Entity>(&self, entity: &mut E) -> Result<(), MockError> {
        self.check(Self::id_of(entity))?;
        self.reloads.set(self.reloads.get() + 1);
        Ok(())
    }

    fn is_reference_loaded<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Reference<E, R>,
    ) -> bool {
        self.is_loaded(entity, relation.descriptor())
    }

    fn load_reference<E: Entity, R: Entity>(
        &self,
        entity: &mut E,
        relation: Reference<E, R>,
    ) -> Result<(), MockError> {
        self.check(Self::id_of(entity))?;
        self.loads.set(self.loads.get() + 1);
        let related = Self::decode::<R>(&Self::rows(Self::id_of(entity)))
            .into_iter()
            .next();
        relation.set(entity, related);
        self.mark_loaded(entity, relation.descriptor());
        Ok(())
    }

    fn query_reference<E: Entity, R: Entity>(
        &self,
        entity: &E,
        _relation: Reference<E, R>,
    ) -> Result<MockQuery<R>, MockError> {
        Ok(self.query::<E, R>(entity)?.take(1))
    }

    fn is_collection_loaded<E: Entity, R: Entity>(
        &self,
        entity: &E,
        relation: Collection<E, R>,
    ) -> bool {
        self.is_loaded(entity, relation.descriptor())
    }

    fn load_collection<E: Entity, R: Entity>(
        &self,
        entity: &mut E,
        relation: Collection<E, R>,
    ) -> Result<(), MockError> {
        self.check(Self::id_of(entity))?;
        self.loads.set(self.loads.get() + 1);
        let related = Self::decode::<R>(&Self::rows(Self::id_of(entity)));
        relation.set(entity, related);
        self.mark_loaded(entity, relation.descriptor());
        Ok(())
    }

    fn query_collection<E: Entity, R: Entity>(
        &self,
        entity: &E,
        _relation: Collection<E, R>,
    ) -> Result<MockQuery<R>, MockError> {
        self.query::<E, R>(entity)
    }
}
