use async_trait::async_trait;
use dashmap::DashMap;
use detour_core::{
    NewRedirect, ReadRedirectStore, Redirect, RedirectFilter, RedirectId, RedirectPatch,
    RedirectSort, RedirectStore, Result, StorageError,
};
use jiff::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory implementation of the redirect store using DashMap.
///
/// Ids are assigned from a monotonically increasing counter starting at 1,
/// so `RedirectSort::Id` is insertion order.
#[derive(Debug)]
pub struct InMemoryRedirectStore {
    records: DashMap<RedirectId, Redirect>,
    next_id: AtomicU64,
}

impl InMemoryRedirectStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of records, active or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a copy of every record in id order.
    pub fn snapshot(&self) -> Vec<Redirect> {
        let mut records: Vec<Redirect> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }
}

impl Default for InMemoryRedirectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRedirectStore for InMemoryRedirectStore {
    async fn get(&self, id: RedirectId) -> Result<Option<Redirect>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_many(
        &self,
        filter: &RedirectFilter,
        sort: RedirectSort,
        limit: Option<usize>,
    ) -> Result<Vec<Redirect>> {
        let mut matches: Vec<Redirect> = self
            .records
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        match sort {
            RedirectSort::Id => matches.sort_by_key(|record| record.id),
            RedirectSort::PriorityAsc => matches.sort_by_key(|record| (record.priority, record.id)),
        }

        if let Some(limit) = limit {
            matches.truncate(limit);
        }

        Ok(matches)
    }

    async fn count(&self, filter: &RedirectFilter) -> Result<u64> {
        let count = self
            .records
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl RedirectStore for InMemoryRedirectStore {
    async fn create(&self, data: NewRedirect) -> Result<Redirect> {
        let id = RedirectId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Timestamp::now();
        let record = Redirect {
            id,
            from_path: data.from_path,
            to_path: data.to_path,
            status_code: data.status_code,
            is_active: data.is_active,
            priority: data.priority,
            description: data.description,
            created_at: now,
            updated_at: now,
        };

        self.records.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: RedirectId, patch: RedirectPatch) -> Result<Redirect> {
        let Some(mut entry) = self.records.get_mut(&id) else {
            return Err(StorageError::NotFound(format!("redirect {id}")));
        };

        patch.apply_to(entry.value_mut());
        entry.value_mut().updated_at = Timestamp::now();
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: RedirectId) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }
}
