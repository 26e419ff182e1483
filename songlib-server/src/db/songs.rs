//! Song persistence
//!
//! Every operation runs against the pool under a single deadline covering
//! its whole unit of work. There is no application-level lock: create relies
//! on a transaction for atomicity, everything else is a single statement.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use songlib_common::{PageParams, Song, SongDetailed};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, Transaction};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use super::{SongFilter, StoreError};

/// Bound for rolling back after a failed (possibly timed out) transaction
const ROLLBACK_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_SONGS: &str = r#"SELECT s.name, g.name AS group_name, s.release_date, s.lyrics, s.link
FROM songs s
JOIN "groups" g ON s.group_id = g.id"#;

const SELECT_SONG_BY_KEY: &str = r#"SELECT s.name, g.name AS group_name, s.release_date, s.lyrics, s.link
FROM songs s
JOIN "groups" g ON s.group_id = g.id
WHERE s.name = ? AND g.name = ?"#;

/// Persistence operations the catalog depends on
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Insert a song, creating its group if absent
    async fn create(&self, song: &SongDetailed) -> Result<(), StoreError>;

    /// Look up one song by (group, name)
    async fn get(&self, song: &Song) -> Result<SongDetailed, StoreError>;

    /// Remove one song by (group, name)
    async fn delete(&self, song: &Song) -> Result<(), StoreError>;

    /// One page of songs matching every condition in `filter`
    async fn list_page(
        &self,
        page: PageParams,
        filter: &SongFilter,
    ) -> Result<Vec<SongDetailed>, StoreError>;

    /// Overwrite release date, lyrics and link of an existing song
    async fn update(&self, song: &SongDetailed) -> Result<(), StoreError>;
}

/// SQLite-backed song store
///
/// `op_timeout` bounds how long an operation waits before reporting
/// `Timeout`. A statement abandoned at the deadline keeps running on its
/// connection until SQLite gives up on the lock (the pool's busy timeout), and
/// the rollback of a timed-out `create` waits behind it, so `create` can return
/// up to one busy timeout plus the rollback bound after its deadline.
#[derive(Debug, Clone)]
pub struct SongStore {
    pool: SqlitePool,
    op_timeout: Duration,
}

impl SongStore {
    pub fn new(pool: SqlitePool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.op_timeout
    }

    /// Await a backend future, classifying errors and deadline expiry
    async fn bounded<T, F>(
        &self,
        deadline: Instant,
        operation: &'static str,
        fut: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout_at(deadline, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(sqlx::Error::PoolTimedOut)) | Err(_) => {
                warn!(operation, after = ?self.op_timeout, "Store operation timed out");
                Err(StoreError::Timeout {
                    operation,
                    after: self.op_timeout,
                })
            }
            Ok(Err(e)) => Err(StoreError::backend(operation, e)),
        }
    }

    async fn insert_in_tx(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        song: &SongDetailed,
        deadline: Instant,
    ) -> Result<(), StoreError> {
        self.bounded(
            deadline,
            "upsert group",
            sqlx::query(r#"INSERT INTO "groups" (name) VALUES (?) ON CONFLICT (name) DO NOTHING"#)
                .bind(song.group())
                .execute(&mut **tx),
        )
        .await?;

        let group_id: i64 = self
            .bounded(
                deadline,
                "resolve group",
                sqlx::query_scalar(r#"SELECT id FROM "groups" WHERE name = ?"#)
                    .bind(song.group())
                    .fetch_one(&mut **tx),
            )
            .await?;

        let inserted = self
            .bounded(
                deadline,
                "insert song",
                sqlx::query(
                    "INSERT INTO songs (name, group_id, release_date, lyrics, link) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(song.name())
                .bind(group_id)
                .bind(&song.release_date)
                .bind(&song.text)
                .bind(&song.link)
                .execute(&mut **tx),
            )
            .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict {
                group: song.group().to_string(),
                name: song.name().to_string(),
            }),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl SongRepository for SongStore {
    async fn create(&self, song: &SongDetailed) -> Result<(), StoreError> {
        let deadline = self.deadline();
        let mut tx = self
            .bounded(deadline, "begin transaction", self.pool.begin())
            .await?;

        if let Err(err) = self.insert_in_tx(&mut tx, song, deadline).await {
            return Err(rollback(tx, err).await);
        }

        self.bounded(deadline, "commit", tx.commit()).await?;

        info!(group = %song.group(), name = %song.name(), "Song created");
        Ok(())
    }

    async fn get(&self, song: &Song) -> Result<SongDetailed, StoreError> {
        let row = self
            .bounded(
                self.deadline(),
                "get song",
                sqlx::query(SELECT_SONG_BY_KEY)
                    .bind(&song.name)
                    .bind(&song.group)
                    .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(row) => song_from_row(&row),
            None => Err(StoreError::NoMatch),
        }
    }

    async fn delete(&self, song: &Song) -> Result<(), StoreError> {
        let result = self
            .bounded(
                self.deadline(),
                "delete song",
                sqlx::query(
                    r#"DELETE FROM songs
                    WHERE name = ? AND group_id = (SELECT id FROM "groups" WHERE name = ?)"#,
                )
                .bind(&song.name)
                .bind(&song.group)
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NoMatch);
        }

        info!(group = %song.group, name = %song.name, "Song deleted");
        Ok(())
    }

    async fn list_page(
        &self,
        page: PageParams,
        filter: &SongFilter,
    ) -> Result<Vec<SongDetailed>, StoreError> {
        filter.validate()?;
        debug!(?filter, page = page.page(), limit = page.limit(), "Listing songs");

        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SONGS);
        let mut separator = " WHERE ";
        for (field, value) in filter.iter() {
            builder
                .push(separator)
                .push(field.column())
                .push(" = ")
                .push_bind(value.to_owned());
            separator = " AND ";
        }
        builder
            .push(" ORDER BY g.name, s.name LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = self
            .bounded(
                self.deadline(),
                "list songs",
                builder.build().fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(song_from_row).collect()
    }

    async fn update(&self, song: &SongDetailed) -> Result<(), StoreError> {
        let result = self
            .bounded(
                self.deadline(),
                "update song",
                sqlx::query(
                    r#"UPDATE songs SET release_date = ?, lyrics = ?, link = ?
                    WHERE name = ? AND group_id = (SELECT id FROM "groups" WHERE name = ?)"#,
                )
                .bind(&song.release_date)
                .bind(&song.text)
                .bind(&song.link)
                .bind(song.name())
                .bind(song.group())
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NoMatch);
        }

        info!(group = %song.group(), name = %song.name(), "Song updated");
        Ok(())
    }
}

/// Roll back `tx`, folding a rollback failure into the returned error
async fn rollback(tx: Transaction<'static, Sqlite>, original: StoreError) -> StoreError {
    warn!(error = %original, "Rolling back transaction");

    let rollback_error = match timeout(ROLLBACK_TIMEOUT, tx.rollback()).await {
        Ok(Ok(())) => return original,
        Ok(Err(e)) => StoreError::backend("rollback", e),
        Err(_) => StoreError::Timeout {
            operation: "rollback",
            after: ROLLBACK_TIMEOUT,
        },
    };

    StoreError::RollbackFailed {
        original: Box::new(original),
        rollback: Box::new(rollback_error),
    }
}

fn is_unique_violation(err: &StoreError) -> bool {
    match err {
        StoreError::Backend {
            source: sqlx::Error::Database(db_err),
            ..
        } => db_err.is_unique_violation(),
        _ => false,
    }
}

fn song_from_row(row: &SqliteRow) -> Result<SongDetailed, StoreError> {
    let decode = || -> Result<SongDetailed, sqlx::Error> {
        Ok(SongDetailed {
            song: Song {
                group: row.try_get("group_name")?,
                name: row.try_get("name")?,
            },
            release_date: row.try_get("release_date")?,
            text: row.try_get("lyrics")?,
            link: row.try_get("link")?,
        })
    };
    decode().map_err(|e| StoreError::backend("decode song row", e))
}
