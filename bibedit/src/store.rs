//! Record storage.
//!
//! Batch scripts only need to find record IDs, load records, and save
//! edited records back under a user name.  [`crate::db::PgStore`] does
//! this against Postgres, [`MemoryStore`] against an in-memory map.
use crate::result::EditResult;
use chrono::{DateTime, FixedOffset, Utc};
use marcdoc::Record;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Read};

/// Selects the records a batch will process.
///
/// Matching IDs are always returned in ascending order.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Process this record only.
    pub record_id: Option<i64>,
    pub min_id: Option<i64>,
    pub max_id: Option<i64>,
    /// Records last edited on or after this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
    /// Maximum number of records.
    pub limit: Option<usize>,
    /// Operator-supplied SQL returning an "id" column.  Other filters
    /// do not apply when this is set.
    pub sql: Option<String>,
}

/// A record along with the bookkeeping values of its last save.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub record: Record,
    pub user: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

pub trait RecordStore {
    /// IDs of the non-deleted records matching the query.
    fn find_ids(&mut self, query: &RecordQuery) -> EditResult<Vec<i64>>;

    /// Load one record.  None if no such record exists.
    fn retrieve(&mut self, id: i64) -> EditResult<Option<StoredRecord>>;

    /// Save a new version of an existing record on behalf of `user`.
    ///
    /// The previous version is kept as history.
    fn update(&mut self, record: &Record, user: &str) -> EditResult<()>;
}

/// Ordered in-memory record store.
///
/// Loaded from a JSON-lines file of record documents for offline dry
/// runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<i64, StoredRecord>,
    history: Vec<(i64, StoredRecord)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Load one record document per line.  Blank lines are skipped.
    ///
    /// ```
    /// use bibedit::store::{MemoryStore, RecordQuery, RecordStore};
    ///
    /// let docs = r#"{"_id": 3, "245": [{"indicators": [" ", " "], "subfields": [{"code": "a", "value": "C"}]}]}
    ///
    /// {"_id": 1, "008": ["850101s"]}"#;
    ///
    /// let mut store = MemoryStore::from_jsonl(docs.as_bytes()).unwrap();
    /// assert_eq!(store.find_ids(&RecordQuery::default()).unwrap(), [1, 3]);
    /// ```
    pub fn from_jsonl(reader: impl Read) -> EditResult<Self> {
        let mut store = MemoryStore::new();

        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record = Record::from_document_str(&line)
                .map_err(|e| format!("Line {}: {e}", idx + 1))?;

            store.insert(record);
        }

        Ok(store)
    }

    pub fn from_jsonl_file(path: &str) -> EditResult<Self> {
        let file = fs::File::open(path).map_err(|e| format!("Cannot open {path}: {e}"))?;
        MemoryStore::from_jsonl(file)
    }

    /// Add a record, assigning the next free ID when it has none.
    ///
    /// Returns the record ID.
    pub fn insert(&mut self, mut record: Record) -> i64 {
        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = self.records.keys().next_back().map(|id| id + 1).unwrap_or(1);
                record.set_id(id);
                id
            }
        };

        self.records.insert(
            id,
            StoredRecord {
                record,
                user: None,
                updated: None,
            },
        );

        id
    }

    /// Current version of a record.
    pub fn get(&self, id: i64) -> Option<&StoredRecord> {
        self.records.get(&id)
    }

    /// Previous versions of a record, oldest first.
    pub fn history(&self, id: i64) -> Vec<&StoredRecord> {
        self.history
            .iter()
            .filter(|(rec_id, _)| *rec_id == id)
            .map(|(_, stored)| stored)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn find_ids(&mut self, query: &RecordQuery) -> EditResult<Vec<i64>> {
        if query.sql.is_some() {
            return Err("SQL record queries require a database connection".into());
        }

        let ids = self
            .records
            .iter()
            .filter(|(id, _)| query.record_id.is_none_or(|rid| **id == rid))
            .filter(|(id, _)| query.min_id.is_none_or(|min| **id >= min))
            .filter(|(id, _)| query.max_id.is_none_or(|max| **id <= max))
            .filter(|(_, stored)| match query.modified_since {
                Some(since) => stored
                    .updated
                    .is_some_and(|up| up >= since.with_timezone(&Utc)),
                None => true,
            })
            .map(|(id, _)| *id)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(ids)
    }

    fn retrieve(&mut self, id: i64) -> EditResult<Option<StoredRecord>> {
        Ok(self.records.get(&id).cloned())
    }

    fn update(&mut self, record: &Record, user: &str) -> EditResult<()> {
        let Some(id) = record.id() else {
            return Err("Cannot update a record that has no ID".into());
        };

        let Some(current) = self.records.get_mut(&id) else {
            return Err(format!("No such record: {id}").into());
        };

        let previous = std::mem::replace(
            current,
            StoredRecord {
                record: record.clone(),
                user: Some(user.to_string()),
                updated: Some(Utc::now()),
            },
        );

        self.history.push((id, previous));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_of(count: usize) -> MemoryStore {
        let mut store = MemoryStore::new();
        for _ in 0..count {
            let mut record = Record::new();
            record.set("245", "a", "Title").unwrap();
            store.insert(record);
        }
        store
    }

    #[test]
    fn ids_are_assigned_in_sequence() {
        let mut store = store_of(3);
        assert_eq!(store.find_ids(&RecordQuery::default()).unwrap(), [1, 2, 3]);
        assert_eq!(store.get(2).unwrap().record.id(), Some(2));
    }

    #[test]
    fn query_filters() {
        let mut store = store_of(10);

        let query = RecordQuery {
            min_id: Some(3),
            max_id: Some(8),
            limit: Some(4),
            ..Default::default()
        };
        assert_eq!(store.find_ids(&query).unwrap(), [3, 4, 5, 6]);

        let query = RecordQuery {
            record_id: Some(9),
            ..Default::default()
        };
        assert_eq!(store.find_ids(&query).unwrap(), [9]);

        let query = RecordQuery {
            sql: Some("SELECT 1 AS id".to_string()),
            ..Default::default()
        };
        assert!(store.find_ids(&query).is_err());
    }

    #[test]
    fn modified_since_only_sees_saved_records() {
        let mut store = store_of(3);
        let mut record = store.get(2).unwrap().record.clone();
        record.set("245", "a", "New title").unwrap();
        store.update(&record, "tester").unwrap();

        let since = (Utc::now() - chrono::Duration::minutes(5)).fixed_offset();
        let query = RecordQuery {
            modified_since: Some(since),
            ..Default::default()
        };
        assert_eq!(store.find_ids(&query).unwrap(), [2]);
    }

    #[test]
    fn update_keeps_history() {
        let mut store = store_of(1);
        let mut record = store.get(1).unwrap().record.clone();
        record.set("245", "a", "Edited").unwrap();

        store.update(&record, "batch_edit").unwrap();

        let current = store.get(1).unwrap();
        assert_eq!(current.user.as_deref(), Some("batch_edit"));
        assert_eq!(current.record.get_value("245", "a"), Some("Edited"));

        let history = store.history(1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].record.get_value("245", "a"), Some("Title"));

        let mut unknown = Record::new();
        unknown.set_id(99);
        assert!(store.update(&unknown, "batch_edit").is_err());
        assert!(store.update(&Record::new(), "batch_edit").is_err());
    }

    #[test]
    fn jsonl_errors_name_the_line() {
        let docs = "{\"_id\": 1}\nnot json\n";
        let err = MemoryStore::from_jsonl(docs.as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("Line 2:"));
    }
}
