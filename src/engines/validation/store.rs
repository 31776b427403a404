use crate::error::QualifyError;
use crate::types::{CandidateId, PredictionRecord, QuantileRecord, SampleIndex};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A record that may be written at most once per key.
pub trait Keyed {
    type Key: Ord + Copy;

    fn key(&self) -> Self::Key;
    fn sample(&self) -> SampleIndex;
    fn candidate(&self) -> CandidateId;
}

impl Keyed for PredictionRecord {
    type Key = (CandidateId, SampleIndex);

    fn key(&self) -> Self::Key {
        (self.candidate_id, self.sample_index)
    }

    fn sample(&self) -> SampleIndex {
        self.sample_index
    }

    fn candidate(&self) -> CandidateId {
        self.candidate_id
    }
}

impl Keyed for QuantileRecord {
    // τ is keyed by its bit pattern; it only ever comes from the config.
    type Key = (CandidateId, u64, SampleIndex);

    fn key(&self) -> Self::Key {
        (self.candidate_id, self.tau.to_bits(), self.sample_index)
    }

    fn sample(&self) -> SampleIndex {
        self.sample_index
    }

    fn candidate(&self) -> CandidateId {
        self.candidate_id
    }
}

/// Append-only record store with a uniqueness constraint on the record key.
pub struct RecordStore<R: Keyed> {
    records: Mutex<BTreeMap<R::Key, R>>,
}

impl<R: Keyed + Clone> Default for RecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Keyed + Clone> RecordStore<R> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
        }
    }

    /// Appends a unit's batch. Nothing is written if any key already exists.
    pub fn append_all(&self, batch: Vec<R>) -> Result<(), QualifyError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut seen = std::collections::BTreeSet::new();
        for record in &batch {
            let key = record.key();
            if records.contains_key(&key) || !seen.insert(key) {
                return Err(QualifyError::DuplicateRecord {
                    sample: record.sample(),
                    candidate: record.candidate(),
                });
            }
        }
        for record in batch {
            records.insert(record.key(), record);
        }
        Ok(())
    }

    /// Records of one candidate in key order.
    pub fn for_candidate(&self, candidate: CandidateId) -> Vec<R> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|r| r.candidate() == candidate)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sample: SampleIndex, candidate: usize) -> PredictionRecord {
        PredictionRecord {
            sample_index: sample,
            fold_id: 0,
            candidate_id: CandidateId(candidate),
            y_true: 1,
            y_pred: 1,
            y_proba: None,
        }
    }

    #[test]
    fn test_second_writer_rejected_atomically() {
        let store = RecordStore::new();
        store.append_all(vec![record(0, 0), record(1, 0)]).unwrap();

        let err = store.append_all(vec![record(2, 0), record(1, 0)]).unwrap_err();
        assert!(matches!(err, QualifyError::DuplicateRecord { sample: 1, .. }));
        assert_eq!(store.len(), 2);

        // Same sample under another candidate is a different key
        store.append_all(vec![record(1, 1)]).unwrap();
        assert_eq!(store.for_candidate(CandidateId(1)).len(), 1);
    }

    #[test]
    fn test_duplicate_within_batch_rejected() {
        let store = RecordStore::new();
        assert!(store.append_all(vec![record(3, 0), record(3, 0)]).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_writers_keep_one_record_per_key() {
        let store = RecordStore::new();
        std::thread::scope(|scope| {
            for candidate in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    let batch = (0..50).map(|s| record(s, candidate)).collect();
                    store.append_all(batch).unwrap();
                    assert!(store.append_all(vec![record(0, candidate)]).is_err());
                });
            }
        });

        assert_eq!(store.len(), 200);
        assert_eq!(store.for_candidate(CandidateId(3)).len(), 50);
    }
}
