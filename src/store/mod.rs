//! Link store: durable token to (blob path, remaining views) mapping.
//!
//! This is the concurrency-critical core. Every `consume` runs its whole
//! read-decide-write as one transaction on a single-connection SQLite pool,
//! so concurrent consumes of the same token serialize and a link with one
//! view left satisfies exactly one of two racing callers.
//!
//! Rows and blobs are one logical unit with row-first cleanup: deleting the
//! row can strand a blob file briefly (harmless, sweepable), but a live row
//! never points at a blob the store already deleted.

pub mod error;
pub mod token;

pub use error::StoreError;

use crate::constants::{DEFAULT_MAX_CREATE_RETRIES, FILES_SUBDIR, LINKS_DB_FILENAME};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use token::{generate_blob_filename, generate_token, token_log_prefix};

/// One stored link: the token that spends it, where the blob lives, and how
/// many views remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub token: String,
    pub path: PathBuf,
    pub remaining: i64,
}

/// Informational counters exposed through the health endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub links_created: u64,
    pub views_served: u64,
    pub links_expired: u64,
}

#[derive(Default)]
struct Counters {
    links_created: AtomicU64,
    views_served: AtomicU64,
    links_expired: AtomicU64,
}

/// Durable store for view-limited links. Construct once, share by `Arc`.
pub struct LinkStore {
    pool: Pool<Sqlite>,
    files_dir: PathBuf,
    max_create_retries: u32,
    counters: Counters,
}

impl LinkStore {
    /// Open (or create) the store under `data_dir`.
    ///
    /// The rows live in `<data_dir>/links.db`, the blobs under
    /// `<data_dir>/files/`. Both are created if missing.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_retries(data_dir, DEFAULT_MAX_CREATE_RETRIES).await
    }

    /// `open` with an explicit token-collision retry budget.
    pub async fn open_with_retries(
        data_dir: impl AsRef<Path>,
        max_create_retries: u32,
    ) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        let files_dir = data_dir.join(FILES_SUBDIR);
        std::fs::create_dir_all(&files_dir)?;

        let db_path = data_dir.join(LINKS_DB_FILENAME);
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                // Prevent transient "database is locked" errors under concurrent access.
                .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits one writer at a time; a single connection keeps
            // every consume transaction serialized instead of surfacing
            // "database is locked" failures.
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS links (
                token TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                remaining INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        tracing::debug!(db = %db_path.display(), "Link store opened");

        Ok(Self {
            pool,
            files_dir,
            max_create_retries,
            counters: Counters::default(),
        })
    }

    /// Directory the blobs are written to.
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// Persist `blob` and register it for `max_views` views.
    ///
    /// The view budget is clamped to at least one. The blob is written
    /// first; the row insert retries with a fresh token when the generated
    /// one collides, and after the retry budget runs out the blob is
    /// removed and the collision surfaces as an error. A `Link` is only
    /// ever returned fully created.
    pub async fn create(&self, blob: &[u8], max_views: i64) -> Result<Link, StoreError> {
        let max_views = max_views.max(1);

        let path = self.files_dir.join(generate_blob_filename());
        tokio::fs::write(&path, blob).await?;

        for attempt in 1..=self.max_create_retries.max(1) {
            let token = generate_token();
            let result = sqlx::query("INSERT INTO links (token, path, remaining) VALUES (?, ?, ?)")
                .bind(&token)
                .bind(path.to_string_lossy().into_owned())
                .bind(max_views)
                .execute(&self.pool)
                .await;

            match result {
                Ok(_) => {
                    self.counters.links_created.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        token = token_log_prefix(&token),
                        views = max_views,
                        "Link created"
                    );
                    return Ok(Link {
                        token,
                        path,
                        remaining: max_views,
                    });
                }
                Err(error) if is_unique_violation(&error) => {
                    tracing::warn!(attempt, "Generated token collided, retrying with a fresh one");
                }
                Err(error) => {
                    self.remove_blob_file(&path).await;
                    return Err(error.into());
                }
            }
        }

        self.remove_blob_file(&path).await;
        Err(StoreError::TokenCollision {
            attempts: self.max_create_retries.max(1),
        })
    }

    /// Spend one view.
    ///
    /// Returns `None` for unknown tokens, with no side effect. A returned
    /// link with `remaining == 0` means this call exhausted the budget and
    /// deleted the row; the caller may still read the blob once and should
    /// then call [`remove_blob`](Self::remove_blob).
    pub async fn consume(&self, token: &str) -> Result<Option<Link>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT path, remaining FROM links WHERE token = ?")
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((path, remaining)) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let path = PathBuf::from(path);

        if remaining <= 0 {
            // Exhaustion deletes rows in the same transaction, so this row
            // should not exist. Purge it and its blob rather than serve it.
            sqlx::query("DELETE FROM links WHERE token = ?")
                .bind(token)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::warn!(
                token = token_log_prefix(token),
                "Purged row that outlived its view budget"
            );
            self.remove_blob_file(&path).await;
            return Ok(None);
        }

        let remaining = remaining - 1;

        if remaining == 0 {
            sqlx::query("DELETE FROM links WHERE token = ?")
                .bind(token)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("UPDATE links SET remaining = ? WHERE token = ?")
                .bind(remaining)
                .bind(token)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.counters.views_served.fetch_add(1, Ordering::Relaxed);
        if remaining == 0 {
            self.counters.links_expired.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(
            token = token_log_prefix(token),
            remaining,
            "View consumed"
        );

        Ok(Some(Link {
            token: token.to_string(),
            path,
            remaining,
        }))
    }

    /// Look at a link without spending a view. Never used for authorization.
    pub async fn fetch(&self, token: &str) -> Result<Option<Link>, StoreError> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT path, remaining FROM links WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(path, remaining)| Link {
            token: token.to_string(),
            path: PathBuf::from(path),
            remaining,
        }))
    }

    /// Remove the blob behind a link. Idempotent: a file that is already
    /// gone is not an error. The serving layer calls this once the
    /// exhausting view has its bytes.
    pub async fn remove_blob(&self, link: &Link) {
        self.remove_blob_file(&link.path).await;
    }

    async fn remove_blob_file(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Blob removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Blob removal failed")
            }
        }
    }

    /// Number of live links, for the health endpoint.
    pub async fn active_links(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Snapshot of the informational counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            links_created: self.counters.links_created.load(Ordering::Relaxed),
            views_served: self.counters.views_served.load(Ordering::Relaxed),
            links_expired: self.counters.links_expired.load(Ordering::Relaxed),
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => db_err.message().contains("UNIQUE constraint"),
        _ => false,
    }
}
