//! An in-memory store of fireproofed domains.
//!
//! Used when the configuration asks for ephemeral fireproofing, and as a
//! stand-in for the filesystem in tests.

use std::collections::BTreeMap;

use crate::{
    domain::NormalizedDomain,
    storage::{DomainStore, RecordId, StoreError, StoredDomain},
};

/// A [`DomainStore`] that keeps records in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, StoredDomain>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<StoredDomain> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = StoredDomain>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().map(|record| (record.id, record)).collect(),
        }
    }
}

impl DomainStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<StoredDomain>, StoreError> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by_key(|record| record.created);
        Ok(records)
    }

    fn add_record(&mut self, domain: &NormalizedDomain) -> Result<RecordId, StoreError> {
        let record = StoredDomain::new(domain);
        let id = record.id;
        self.records.insert(id, record);
        Ok(id)
    }

    fn remove_record(&mut self, id: RecordId) -> Result<(), StoreError> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::RecordNotFound(id))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_clear() {
        let mut store = MemoryStore::new();
        let domain = NormalizedDomain::new("example.com").unwrap();

        let id = store.add_record(&domain).unwrap();
        store.add_record(&domain).unwrap();
        assert_eq!(store.len(), 2);

        store.remove_record(id).unwrap();
        assert!(matches!(
            store.remove_record(id),
            Err(StoreError::RecordNotFound(missing)) if missing == id
        ));

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_all_orders_by_creation_time() {
        let early = StoredDomain {
            id: RecordId::new(),
            domain: "early.com".to_string(),
            created: "2024-01-01T00:00:00Z".parse().unwrap(),
        };
        let late = StoredDomain {
            id: RecordId::new(),
            domain: "late.com".to_string(),
            created: "2024-06-01T00:00:00Z".parse().unwrap(),
        };
        let store: MemoryStore = [late.clone(), early.clone()].into_iter().collect();

        assert_eq!(store.load_all().unwrap(), vec![early, late]);
    }
}
