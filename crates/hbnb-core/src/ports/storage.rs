//! Storage trait for persistence
//!
//! Both engines (JSON file, relational) implement [`Storage`]; callers never
//! know which one they hold.

use crate::{Entity, EntityKind, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Whether `reload` found a durable store at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSource {
    /// Nothing persisted yet; the view starts empty
    Absent,
    Loaded,
}

/// A durable record that could not be rebuilt into an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub key: String,
    pub reason: String,
}

/// Outcome of [`Storage::reload`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    pub source: StoreSource,
    pub loaded: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl ReloadReport {
    pub fn absent() -> Self {
        Self {
            source: StoreSource::Absent,
            loaded: 0,
            rejected: Vec::new(),
        }
    }

    pub fn loaded(loaded: usize) -> Self {
        Self {
            source: StoreSource::Loaded,
            loaded,
            rejected: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Uniform persistence contract
#[async_trait]
pub trait Storage: Send + Sync {
    /// Every stored entity keyed `"Type.id"`, optionally of one kind only
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>>;

    /// Exact lookup; a miss is `Ok(None)`
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>>;

    /// Register an entity (insert or replace by key); durable after `save`
    async fn new(&self, entity: Entity) -> Result<()>;

    /// Make every pending change durable, all or nothing
    async fn save(&self) -> Result<()>;

    /// Remove an entity and everything it owns
    async fn delete(&self, entity: &Entity) -> Result<()>;

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        Ok(self.all(kind).await?.len())
    }

    /// (Re)initialize from durable storage
    async fn reload(&self) -> Result<ReloadReport>;

    /// End the current unit of work, dropping anything not saved
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amenity, State};
    use std::sync::Mutex;

    /// Minimal store exercising the provided `count`
    struct VecStore(Mutex<Vec<Entity>>);

    #[async_trait]
    impl Storage for VecStore {
        async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>> {
            let items = self.0.lock().unwrap();
            Ok(items
                .iter()
                .filter(|e| kind.map_or(true, |k| e.kind() == k))
                .map(|e| (e.key(), e.clone()))
                .collect())
        }

        async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
            Ok(self.all(Some(kind)).await?.remove(&kind.key(id)))
        }

        async fn new(&self, entity: Entity) -> Result<()> {
            self.0.lock().unwrap().push(entity);
            Ok(())
        }

        async fn save(&self) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, entity: &Entity) -> Result<()> {
            self.0.lock().unwrap().retain(|e| e.key() != entity.key());
            Ok(())
        }

        async fn reload(&self) -> Result<ReloadReport> {
            Ok(ReloadReport::absent())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_count_filters_by_kind() {
        let store = VecStore(Mutex::new(Vec::new()));
        tokio_test::block_on(async {
            store.new(State::new("Ohio").into()).await.unwrap();
            store.new(State::new("Iowa").into()).await.unwrap();
            store.new(Amenity::new("Wifi").into()).await.unwrap();

            assert_eq!(store.count(None).await.unwrap(), 3);
            assert_eq!(store.count(Some(EntityKind::State)).await.unwrap(), 2);
            assert_eq!(store.count(Some(EntityKind::Review)).await.unwrap(), 0);
        });
    }

    #[test]
    fn test_report_constructors() {
        assert_eq!(ReloadReport::absent().source, StoreSource::Absent);
        let report = ReloadReport::loaded(4);
        assert_eq!(report.loaded, 4);
        assert!(report.is_clean());
    }
}
