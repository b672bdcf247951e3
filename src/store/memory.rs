use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use super::{ScoreStore, ScoredMember, cmp_scored, error::StoreError, resolve_rank_range};
use crate::codec::EncodedRecord;

/// key -> entries sorted by (score, member)
type Sets = HashMap<String, Vec<ScoredMember>>;

/// In-process store. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sets: Arc<RwLock<Sets>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(sets: &mut Sets, key: &str, member: String, score: f64) {
        let set = sets.entry(key.to_string()).or_default();
        if let Some(idx) = set.iter().position(|e| e.member == member) {
            set.remove(idx);
        }
        let entry = ScoredMember { member, score };
        let idx = set.partition_point(|e| cmp_scored(e, &entry).is_lt());
        set.insert(idx, entry);
    }
}

impl ScoreStore for MemoryStore {
    async fn add(&self, key: &str, member: String, score: f64) -> Result<(), StoreError> {
        let mut sets = self.sets.write().await;
        Self::insert(&mut sets, key, member, score);
        Ok(())
    }

    async fn add_all(&self, records: Vec<(String, EncodedRecord)>) -> Result<(), StoreError> {
        let mut sets = self.sets.write().await;
        for (key, rec) in records {
            Self::insert(&mut sets, &key, rec.member, rec.score);
        }
        Ok(())
    }

    async fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>, StoreError> {
        let sets = self.sets.read().await;
        let Some(set) = sets.get(key) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_rank_range(set.len(), start, stop) {
            Some((offset, count)) => set[offset..offset + count].to_vec(),
            None => Vec::new(),
        })
    }

    async fn range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ScoredMember>, StoreError> {
        let sets = self.sets.read().await;
        let Some(set) = sets.get(key) else {
            return Ok(Vec::new());
        };
        Ok(set
            .iter()
            .filter(|e| e.score >= min && e.score <= max)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn cardinality(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.sets.read().await.get(key).map_or(0, Vec::len))
    }
}
