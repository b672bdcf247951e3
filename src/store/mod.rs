use std::future::Future;

use error::StoreError;

use crate::codec::EncodedRecord;

pub mod error;
pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

/// Per-key sorted collections of `(member, score)`, ordered by score then
/// member. A member is unique within its key; adding it again moves it to
/// the new score.
pub trait ScoreStore: Send + Sync {
    fn add(
        &self,
        key: &str,
        member: String,
        score: f64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Adds every `(key, record)` pair in one go.
    fn add_all(
        &self,
        records: Vec<(String, EncodedRecord)>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Inclusive rank range. Negative ranks count back from the highest
    /// score, so `(-1, -1)` is the most recent entry.
    fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<Vec<ScoredMember>, StoreError>> + Send;

    /// Inclusive score range, ascending, with `offset`/`limit` applied after
    /// filtering.
    fn range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ScoredMember>, StoreError>> + Send;

    fn cardinality(&self, key: &str) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Resolves an inclusive rank range against a collection of `len` entries.
/// Returns `(offset, count)` or None when the range selects nothing.
pub fn resolve_rank_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, (stop - start + 1) as usize))
}

/// Ordering used by every store: score first, member text to break ties.
pub fn cmp_scored(a: &ScoredMember, b: &ScoredMember) -> std::cmp::Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.member.cmp(&b.member))
}
