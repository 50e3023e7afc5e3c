//! Accumulated result set
//!
//! Insertion-ordered map from NDC to [`EnrichedRecord`]. A key that is
//! present means the NDC was processed, whether or not its record is
//! complete, so it is never enriched again.

use super::EnrichedRecord;
use std::collections::HashMap;

/// Insertion-ordered NDC → record map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    records: Vec<EnrichedRecord>,
    index: HashMap<String, usize>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records in their persisted order
    ///
    /// Later duplicates of an NDC are dropped.
    pub fn from_records(records: impl IntoIterator<Item = EnrichedRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn contains(&self, ndc: &str) -> bool {
        self.index.contains_key(ndc)
    }

    pub fn get(&self, ndc: &str) -> Option<&EnrichedRecord> {
        self.index.get(ndc).map(|&i| &self.records[i])
    }

    /// Insert a record; returns `false` and keeps the existing record when the
    /// NDC is already present
    pub fn insert(&mut self, record: EnrichedRecord) -> bool {
        if self.index.contains_key(&record.ndc) {
            return false;
        }
        self.index.insert(record.ndc.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &EnrichedRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_record() {
        let mut store = ResultStore::new();
        assert!(store.insert(EnrichedRecord::unresolved("A")));

        let replacement = EnrichedRecord {
            medication_name: Some("replacement".to_string()),
            ..EnrichedRecord::unresolved("A")
        };
        assert!(!store.insert(replacement));

        assert_eq!(store.len(), 1);
        assert!(store.get("A").unwrap().medication_name.is_none());
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let store = ResultStore::from_records(
            ["C", "A", "B", "A"].into_iter().map(EnrichedRecord::unresolved),
        );

        let order: Vec<&str> = store.iter().map(|r| r.ndc.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
        assert!(store.contains("B"));
        assert!(!store.contains("D"));
    }
}
