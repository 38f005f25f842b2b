//! Query handles returned by `load_query`.

use std::fmt;
use std::rc::Rc;

use crate::context::RelationQuery;

/// One composed operation on a deferred query.
///
/// Steps run in the order they were composed, so `take(3).filter(f)` filters
/// the first three rows while `filter(f).take(3)` takes three matching rows.
pub enum QueryStep<R> {
    /// Keep rows matching the predicate.
    Filter(Rc<dyn Fn(&R) -> bool>),
    /// Drop the first `n` rows.
    Skip(usize),
    /// Keep at most `n` rows.
    Take(usize),
}

impl<R> QueryStep<R> {
    /// Run `steps` over `rows` in order.
    pub fn apply_all(steps: &[Self], rows: Vec<R>) -> Vec<R> {
        steps.iter().fold(rows, |rows, step| match step {
            Self::Filter(predicate) => rows.into_iter().filter(|row| predicate(row)).collect(),
            Self::Skip(n) => rows.into_iter().skip(*n).collect(),
            Self::Take(n) => rows.into_iter().take(*n).collect(),
        })
    }
}

impl<R> Clone for QueryStep<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Filter(predicate) => Self::Filter(Rc::clone(predicate)),
            Self::Skip(n) => Self::Skip(*n),
            Self::Take(n) => Self::Take(*n),
        }
    }
}

impl<R> fmt::Debug for QueryStep<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(_) => f.write_str("Filter(..)"),
            Self::Skip(n) => f.debug_tuple("Skip").field(n).finish(),
            Self::Take(n) => f.debug_tuple("Take").field(n).finish(),
        }
    }
}

/// Deferred query over a relation of one or more loaded entities.
///
/// A `LoadQuery` wraps zero or more context queries. With no sources it is
/// the empty result handed out for entities that are not persisted: it
/// enumerates to zero rows and never touches a store. Filters composed before
/// any `skip`/`take` are pushed down to every source; everything else applies
/// to the concatenated rows.
pub struct LoadQuery<R, Q> {
    sources: Vec<Q>,
    steps: Vec<QueryStep<R>>,
}

impl<R, Q> LoadQuery<R, Q> {
    /// A query that yields nothing.
    pub fn empty() -> Self {
        Self::from_sources(Vec::new())
    }

    /// Wrap a single context query.
    pub fn from_source(source: Q) -> Self {
        Self::from_sources(vec![source])
    }

    /// Wrap several context queries, fetched in order.
    pub fn from_sources(sources: Vec<Q>) -> Self {
        Self {
            sources,
            steps: Vec::new(),
        }
    }

    /// Number of wrapped context queries.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Whether this query was short-circuited and has nothing to execute.
    pub fn is_short_circuited(&self) -> bool {
        self.sources.is_empty()
    }

    /// The wrapped context queries.
    pub fn sources(&self) -> &[Q] {
        &self.sources
    }

    /// Unwrap the context queries, dropping any steps kept locally.
    pub fn into_sources(self) -> Vec<Q> {
        self.sources
    }

    pub(crate) fn push(&mut self, source: Q) {
        self.sources.push(source);
    }
}

impl<R, Q> RelationQuery<R> for LoadQuery<R, Q>
where
    R: 'static,
    Q: RelationQuery<R> + 'static,
{
    type Error = Q::Error;

    fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + 'static,
    {
        let predicate: Rc<dyn Fn(&R) -> bool> = Rc::new(predicate);
        if !self.steps.is_empty() {
            self.steps.push(QueryStep::Filter(predicate));
            return self;
        }

        self.sources = self
            .sources
            .into_iter()
            .map(|source| {
                let predicate = Rc::clone(&predicate);
                source.filter(move |row: &R| predicate(row))
            })
            .collect();
        self
    }

    fn skip(mut self, n: usize) -> Self {
        self.steps.push(QueryStep::Skip(n));
        self
    }

    fn take(mut self, n: usize) -> Self {
        self.steps.push(QueryStep::Take(n));
        self
    }

    fn fetch(&self) -> Result<Vec<R>, Self::Error> {
        let mut rows = Vec::new();
        for source in &self.sources {
            rows.extend(source.fetch()?);
        }

        Ok(QueryStep::apply_all(&self.steps, rows))
    }
}

impl<R, Q> Default for LoadQuery<R, Q> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R, Q: fmt::Debug> fmt::Debug for LoadQuery<R, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadQuery")
            .field("sources", &self.sources)
            .field("steps", &self.steps)
            .finish()
    }
}
