//! Record storage abstraction.
//!
//! Handlers talk to `Arc<dyn RecordStore<V>>`; the backend (in-memory or
//! Postgres) is picked once at startup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use exportdesk_core::Entity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record with the same id (or unique key) already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed (connection, query, lock poisoning).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be mapped back to a record.
    #[error("stored data could not be decoded: {0}")]
    Serialization(String),
}

/// Create/read/list/delete over one record type.
#[async_trait::async_trait]
pub trait RecordStore<V>: Send + Sync
where
    V: Entity + Send + Sync + 'static,
{
    async fn insert(&self, record: V) -> Result<V, StoreError>;

    /// Insert a batch atomically: either every record is stored or none is.
    async fn insert_many(&self, records: Vec<V>) -> Result<usize, StoreError>;

    async fn get(&self, id: &V::Id) -> Result<Option<V>, StoreError>;

    /// Newest first (by `created_at`), optionally capped.
    async fn list(&self, limit: Option<usize>) -> Result<Vec<V>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: &V::Id) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
impl<V, S> RecordStore<V> for Arc<S>
where
    V: Entity + Send + Sync + 'static,
    V::Id: Sync,
    S: RecordStore<V> + ?Sized,
{
    async fn insert(&self, record: V) -> Result<V, StoreError> {
        (**self).insert(record).await
    }

    async fn insert_many(&self, records: Vec<V>) -> Result<usize, StoreError> {
        (**self).insert_many(records).await
    }

    async fn get(&self, id: &V::Id) -> Result<Option<V>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<V>, StoreError> {
        (**self).list(limit).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        (**self).count().await
    }

    async fn delete(&self, id: &V::Id) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryStore<V: Entity> {
    inner: RwLock<Slots<V>>,
}

#[derive(Debug)]
struct Slots<V: Entity> {
    next_seq: u64,
    records: HashMap<V::Id, (u64, V)>,
}

impl<V: Entity> InMemoryStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Slots {
                next_seq: 0,
                records: HashMap::new(),
            }),
        }
    }
}

impl<V: Entity> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl<V> RecordStore<V> for InMemoryStore<V>
where
    V: Entity + Clone + Send + Sync + 'static,
    V::Id: Send + Sync,
{
    async fn insert(&self, record: V) -> Result<V, StoreError> {
        let mut slots = self.inner.write().map_err(|_| poisoned())?;
        if slots.records.contains_key(record.id()) {
            return Err(StoreError::Conflict(format!("record {:?} already exists", record.id())));
        }
        let seq = slots.next_seq;
        slots.next_seq += 1;
        slots.records.insert(record.id().clone(), (seq, record.clone()));
        Ok(record)
    }

    async fn insert_many(&self, records: Vec<V>) -> Result<usize, StoreError> {
        let mut slots = self.inner.write().map_err(|_| poisoned())?;

        let mut batch_ids = std::collections::HashSet::with_capacity(records.len());
        for record in &records {
            if slots.records.contains_key(record.id()) || !batch_ids.insert(record.id().clone()) {
                return Err(StoreError::Conflict(format!("record {:?} already exists", record.id())));
            }
        }

        let count = records.len();
        for record in records {
            let seq = slots.next_seq;
            slots.next_seq += 1;
            slots.records.insert(record.id().clone(), (seq, record));
        }
        Ok(count)
    }

    async fn get(&self, id: &V::Id) -> Result<Option<V>, StoreError> {
        let slots = self.inner.read().map_err(|_| poisoned())?;
        Ok(slots.records.get(id).map(|(_, v)| v.clone()))
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<V>, StoreError> {
        let slots = self.inner.read().map_err(|_| poisoned())?;
        let mut entries: Vec<&(u64, V)> = slots.records.values().collect();
        // Insertion order breaks ties between equal timestamps.
        entries.sort_by(|(sa, a), (sb, b)| b.created_at().cmp(&a.created_at()).then(sb.cmp(sa)));
        Ok(entries
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let slots = self.inner.read().map_err(|_| poisoned())?;
        Ok(slots.records.len() as u64)
    }

    async fn delete(&self, id: &V::Id) -> Result<bool, StoreError> {
        let mut slots = self.inner.write().map_err(|_| poisoned())?;
        Ok(slots.records.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Note {
        id: u32,
        at: DateTime<Utc>,
    }

    impl Entity for Note {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    fn note(id: u32, minutes: i64) -> Note {
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        Note { id, at: base + Duration::minutes(minutes) }
    }

    #[tokio::test]
    async fn insert_get_delete_roundtrip() {
        let store = InMemoryStore::new();
        store.insert(note(1, 0)).await.unwrap();

        assert_eq!(store.get(&1).await.unwrap(), Some(note(1, 0)));
        assert_eq!(store.get(&2).await.unwrap(), None);
        assert!(store.delete(&1).await.unwrap());
        assert!(!store.delete(&1).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = InMemoryStore::new();
        store.insert(note(1, 0)).await.unwrap();
        let err = store.insert(note(1, 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_respects_limit() {
        let store = InMemoryStore::new();
        store.insert(note(1, 10)).await.unwrap();
        store.insert(note(2, 30)).await.unwrap();
        store.insert(note(3, 20)).await.unwrap();
        store.insert(note(4, 30)).await.unwrap();

        let ids: Vec<u32> = store.list(None).await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);

        let top: Vec<u32> = store.list(Some(2)).await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(top, vec![4, 2]);
    }

    #[tokio::test]
    async fn insert_many_is_all_or_nothing() {
        let store = InMemoryStore::new();
        store.insert(note(2, 0)).await.unwrap();

        let err = store
            .insert_many(vec![note(1, 0), note(2, 0), note(3, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count().await.unwrap(), 1);

        let err = store.insert_many(vec![note(5, 0), note(5, 1)]).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert_eq!(store.insert_many(vec![note(1, 0), note(3, 0)]).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let store: Arc<dyn RecordStore<Note>> = Arc::new(InMemoryStore::new());
        store.insert(note(7, 0)).await.unwrap();
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }
}
