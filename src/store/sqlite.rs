use std::time::Duration;

use rusqlite::{Params, Statement, params};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use super::{ScoreStore, ScoredMember, error::StoreError, resolve_rank_range};
use crate::{codec::EncodedRecord, config::StoreConfig};

const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS points (
    key    TEXT NOT NULL,
    member TEXT NOT NULL,
    score  REAL NOT NULL,
    PRIMARY KEY (key, member)
);
CREATE INDEX IF NOT EXISTS points_by_score ON points (key, score, member);
";

const UPSERT: &str = "INSERT INTO points (key, member, score) VALUES (?1, ?2, ?3)
    ON CONFLICT (key, member) DO UPDATE SET score = excluded.score";

/// Handle to the SQLite-backed store. Created once at service start,
/// cloned into whatever needs it, and closed with [`SqliteStore::close`]
/// at shutdown.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
    timeout: Duration,
}

impl SqliteStore {
    pub async fn open(cfg: &StoreConfig) -> Result<Self, StoreError> {
        info!(path = %cfg.path, "opening store");

        let conn = match cfg.path.as_str() {
            IN_MEMORY => Connection::open_in_memory().await?,
            path => Connection::open(path).await?,
        };

        let store = Self {
            conn,
            timeout: cfg.timeout(),
        };
        let busy = store.timeout;
        store
            .call(move |conn| {
                conn.busy_timeout(busy)?;
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;

        Ok(store)
    }

    pub async fn close(self) -> Result<(), StoreError> {
        info!("closing store");
        Ok(self.conn.close().await?)
    }

    /// Runs `function` on the connection thread, giving up after the
    /// configured timeout.
    async fn call<F, R>(&self, function: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        match tokio::time::timeout(self.timeout, self.conn.call(function)).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

fn collect_rows<P: Params>(
    stmt: &mut Statement,
    params: P,
) -> rusqlite::Result<Vec<ScoredMember>> {
    stmt.query_map(params, |row| {
        Ok(ScoredMember {
            member: row.get(0)?,
            score: row.get(1)?,
        })
    })?
    .collect()
}

impl ScoreStore for SqliteStore {
    async fn add(&self, key: &str, member: String, score: f64) -> Result<(), StoreError> {
        let key = key.to_string();
        self.call(move |conn| {
            conn.execute(UPSERT, params![key, member, score])?;
            Ok(())
        })
        .await
    }

    async fn add_all(&self, records: Vec<(String, EncodedRecord)>) -> Result<(), StoreError> {
        debug!("writing {} records", records.len());
        self.call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(UPSERT)?;
                for (key, rec) in &records {
                    stmt.execute(params![key, rec.member, rec.score])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>, StoreError> {
        let key = key.to_string();
        self.call(move |conn| {
            let len: i64 = conn.query_row(
                "SELECT COUNT(*) FROM points WHERE key = ?1",
                [&key],
                |row| row.get(0),
            )?;
            let Some((offset, count)) = resolve_rank_range(len as usize, start, stop) else {
                return Ok(Vec::new());
            };

            let mut stmt = conn.prepare_cached(
                "SELECT member, score FROM points WHERE key = ?1
                 ORDER BY score, member LIMIT ?2 OFFSET ?3",
            )?;
            Ok(collect_rows(
                &mut stmt,
                params![key, count as i64, offset as i64],
            )?)
        })
        .await
    }

    async fn range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ScoredMember>, StoreError> {
        let key = key.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT member, score FROM points
                 WHERE key = ?1 AND score >= ?2 AND score <= ?3
                 ORDER BY score, member LIMIT ?4 OFFSET ?5",
            )?;
            Ok(collect_rows(
                &mut stmt,
                params![key, min, max, limit as i64, offset as i64],
            )?)
        })
        .await
    }

    async fn cardinality(&self, key: &str) -> Result<usize, StoreError> {
        let key = key.to_string();
        let count: i64 = self
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM points WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )?)
            })
            .await?;
        Ok(count as usize)
    }
}
