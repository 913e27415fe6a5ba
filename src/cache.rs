//! Read cache shared by every view, with aggregate-level invalidation.
//!
//! Entries are never evicted, only marked stale. A stale entry is refetched
//! on its next read; that is how a submission made in one workspace shows
//! up in the progress summary, the problem list and the submission history.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metrics::counter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Aggregate {
    /// Problem list and problem detail, both carrying solve status.
    ProblemStatus,
    Submissions,
    Progress,
    Bookmarks,
    Contests,
    Languages,
}

impl Aggregate {
    pub fn name(self) -> &'static str {
        match self {
            Aggregate::ProblemStatus => "problem_status",
            Aggregate::Submissions => "submissions",
            Aggregate::Progress => "progress",
            Aggregate::Bookmarks => "bookmarks",
            Aggregate::Contests => "contests",
            Aggregate::Languages => "languages",
        }
    }
}

/// Aggregates a successful submission changes.
pub const SUBMISSION_DEPENDENTS: [Aggregate; 3] = [
    Aggregate::Submissions,
    Aggregate::Progress,
    Aggregate::ProblemStatus,
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub aggregate: Aggregate,
    pub scope: String,
}

impl CacheKey {
    pub fn new(aggregate: Aggregate, scope: impl Into<String>) -> Self {
        Self {
            aggregate,
            scope: scope.into(),
        }
    }

    pub fn whole(aggregate: Aggregate) -> Self {
        Self::new(aggregate, "")
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stale: bool,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    epochs: HashMap<Aggregate, u64>,
}

impl CacheState {
    fn epoch(&self, aggregate: Aggregate) -> u64 {
        self.epochs.get(&aggregate).copied().unwrap_or(0)
    }
}

#[derive(Default)]
pub struct QueryCache {
    state: Mutex<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the fresh cached value for `key`, or awaits `fetch` and
    /// caches its result. A value whose fetch overlapped an invalidation of
    /// its aggregate is stored stale. Errors are not cached.
    pub async fn get_or_fetch<V, E, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<V, E>
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let epoch = {
            let state = self.lock();
            if let Some(value) = state
                .entries
                .get(&key)
                .filter(|entry| !entry.stale)
                .and_then(|entry| entry.value.downcast_ref::<V>())
            {
                return Ok(value.clone());
            }
            state.epoch(key.aggregate)
        };

        tracing::debug!(aggregate = key.aggregate.name(), scope = %key.scope, "fetching");
        let value = fetch().await?;

        let mut state = self.lock();
        let stale = state.epoch(key.aggregate) != epoch;
        state.entries.insert(
            key,
            Entry {
                value: Arc::new(value.clone()),
                stale,
            },
        );
        Ok(value)
    }

    pub fn peek<V: Clone + 'static>(&self, key: &CacheKey) -> Option<V> {
        self.lock()
            .entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<V>())
            .cloned()
    }

    /// `None` when nothing is cached under `key`.
    pub fn is_stale(&self, key: &CacheKey) -> Option<bool> {
        self.lock().entries.get(key).map(|entry| entry.stale)
    }

    pub fn stale_aggregates(&self) -> BTreeSet<Aggregate> {
        self.lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.stale)
            .map(|(key, _)| key.aggregate)
            .collect()
    }

    pub fn invalidate(&self, aggregate: Aggregate) {
        let mut state = self.lock();
        *state.epochs.entry(aggregate).or_insert(0) += 1;
        let mut marked = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.aggregate == aggregate {
                entry.stale = true;
                marked += 1;
            }
        }

        counter!("cache_invalidations_total", "aggregate" => aggregate.name()).increment(1);
        tracing::debug!(aggregate = aggregate.name(), marked, "invalidated");
    }

    pub fn invalidate_after_submit(&self) {
        for aggregate in SUBMISSION_DEPENDENTS {
            self.invalidate(aggregate);
        }
    }
}
