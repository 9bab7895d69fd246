//! # SQLite store
//!
//! Implements the `domains` ports over a sqlx `SqlitePool`. Every unit of
//! work owns one `sqlx::Transaction`; statements of a logical change all run
//! on it, so a failure anywhere leaves nothing visible once it is dropped.
//!
//! Write units open with `BEGIN IMMEDIATE`. A deferred transaction that reads
//! first cannot upgrade to a writer while another connection holds the lock,
//! and SQLite fails that upgrade at once instead of honouring the busy timeout.

mod chat;
mod comments;
mod likes;
mod posts;
mod replies;
mod reports;
mod topics;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::errors::{DomainError, Result};
use domains::ports::{ContentStore, UnitOfWork};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{error, info};

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and applies the
    /// embedded migrations.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !is_in_memory(url) {
            // readers keep going while a writer holds the lock
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            // an in-memory database lives exactly as long as its connection
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(url, max_connections, "sqlite store ready");
        Ok(Self { pool })
    }

    /// A private, single-connection in-memory database. Used by tests.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await.or_store("begin transaction")?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }

    async fn begin_write(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .or_store("begin write transaction")?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// One open transaction. Rolled back on drop unless committed.
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.commit().await.or_store("commit transaction")
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.rollback().await.or_store("rollback transaction")
    }
}

/// Maps sqlx failures into the domain taxonomy. Unique violations become
/// `DuplicateConflict`; everything else is a logged `Store` error.
pub(crate) trait SqlxResultExt<T> {
    fn or_store(self, op: &'static str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn or_store(self, op: &'static str) -> Result<T> {
        self.map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::DuplicateConflict(format!("{op}: unique constraint violated"))
            }
            _ => {
                error!(operation = op, error = %e, "sqlite operation failed");
                DomainError::store(format_args!("{op}: {e}"))
            }
        })
    }
}

/// A row that decoded but holds a value the domain rejects.
pub(crate) fn corrupt_row(op: &'static str, detail: impl std::fmt::Display) -> DomainError {
    error!(operation = op, %detail, "corrupt row");
    DomainError::store(format_args!("{op}: corrupt row ({detail})"))
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use domains::{NewComment, NewPost, NewReply, NewTopic, Rating, ReplyParent};

    pub async fn store() -> SqliteStore {
        SqliteStore::in_memory().await.expect("in-memory sqlite")
    }

    pub fn new_comment(author_id: i64) -> NewComment {
        NewComment {
            property_id: 100,
            author_id,
            content: "Quiet street, responsive landlord".into(),
            rating: Rating::new(4).unwrap(),
        }
    }

    pub fn new_reply(parent: ReplyParent, author_id: i64) -> NewReply {
        NewReply { parent, author_id, content: "Thanks for the tip".into() }
    }

    pub fn new_topic(creator_id: i64) -> NewTopic {
        NewTopic {
            title: "Looking for roommates".into(),
            description: Some("Fall semester".into()),
            creator_id,
        }
    }

    pub fn new_post(topic_id: i64, author_id: i64) -> NewPost {
        NewPost { topic_id, author_id, content: "I have a spare room".into() }
    }
}
