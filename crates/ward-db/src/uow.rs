//! # Unit of Work
//!
//! One store handle (a SQLite transaction on a pooled connection) shared by
//! every repository used while serving a single request.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.unit_of_work()        no connection taken yet                       │
//! │  db.write_unit_of_work()                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  repository / db_context  DbFactory::init ──► BEGIN [IMMEDIATE] (once)  │
//! │       │                                                                 │
//! │       ├── reads + writes on the same transaction                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit()                 COMMIT, handle released                       │
//! │       │                   (next access begins a fresh transaction)      │
//! │       ▼                                                                 │
//! │  dispose() / drop         ROLLBACK of anything uncommitted, once        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing written through a repository is visible to other units of work
//! until `commit()` succeeds.
//!
//! ## Transaction Modes
//! A deferred transaction takes SQLite's write lock at its first write. Under
//! WAL a reader that later tries to write fails with `SQLITE_BUSY` if another
//! writer committed in between, without waiting on the busy timeout. Units of
//! work that read and then write (check-then-insert) use
//! [`TransactionMode::Immediate`], which takes the write lock at `BEGIN` and
//! waits for it, so competing writers run one after the other.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{Entity, EntityRepository};

// =============================================================================
// Transaction Mode
// =============================================================================

/// How a unit of work begins its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// `BEGIN`: no lock until the first statement needs one.
    #[default]
    Deferred,
    /// `BEGIN IMMEDIATE`: the write lock is held from the start.
    Immediate,
}

// =============================================================================
// Store Handle Factory
// =============================================================================

/// Lazily creates the store handle and releases it exactly once.
#[derive(Debug)]
pub struct DbFactory {
    pool: SqlitePool,
    mode: TransactionMode,
    handle: Option<Transaction<'static, Sqlite>>,
    disposed: bool,
}

impl DbFactory {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_mode(pool, TransactionMode::Deferred)
    }

    pub fn with_mode(pool: SqlitePool, mode: TransactionMode) -> Self {
        DbFactory {
            pool,
            mode,
            handle: None,
            disposed: false,
        }
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Returns the cached handle, beginning a transaction on first use.
    ///
    /// ## Errors
    /// - `DbError::Disposed` after [`DbFactory::dispose`]
    /// - `DbError::PoolExhausted` when no connection frees up in time
    /// - `DbError::QueryFailed` when an immediate transaction cannot take the
    ///   write lock within the busy timeout
    pub async fn init(&mut self) -> DbResult<&mut SqliteConnection> {
        if self.disposed {
            return Err(DbError::Disposed);
        }

        let tx = match self.handle.take() {
            Some(tx) => tx,
            None => {
                debug!(mode = ?self.mode, "Beginning unit-of-work transaction");
                match self.mode {
                    TransactionMode::Deferred => self.pool.begin().await?,
                    TransactionMode::Immediate => self.pool.begin_with("BEGIN IMMEDIATE").await?,
                }
            }
        };

        Ok(&mut **self.handle.insert(tx))
    }

    /// Whether a transaction is currently open.
    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Hands the open transaction to the caller, leaving the factory empty.
    pub(crate) fn take_handle(&mut self) -> Option<Transaction<'static, Sqlite>> {
        self.handle.take()
    }

    /// Rolls back and releases the handle. Repeat calls do nothing.
    pub async fn dispose(&mut self) -> DbResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        if let Some(tx) = self.handle.take() {
            debug!("Rolling back uncommitted unit of work");
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for DbFactory {
    fn drop(&mut self) {
        // sqlx queues the ROLLBACK when the transaction itself drops
        if self.handle.is_some() {
            debug!("Unit of work dropped with an open transaction; rolling back");
        }
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// Transaction boundary for one logical operation.
///
/// ## Example
/// ```rust,ignore
/// let mut uow = db.unit_of_work();
/// let mut patients = uow.repository::<Patient>();
/// patients.add(&mut patient).await?;
/// uow.commit().await?;
/// ```
#[derive(Debug)]
pub struct UnitOfWork {
    factory: DbFactory,
}

impl UnitOfWork {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_mode(pool, TransactionMode::Deferred)
    }

    pub fn with_mode(pool: SqlitePool, mode: TransactionMode) -> Self {
        UnitOfWork {
            factory: DbFactory::with_mode(pool, mode),
        }
    }

    pub fn mode(&self) -> TransactionMode {
        self.factory.mode()
    }

    /// The store handle, resolved on first access and reused afterwards.
    pub async fn db_context(&mut self) -> DbResult<&mut SqliteConnection> {
        self.factory.init().await
    }

    /// A repository for `T` bound to this unit of work.
    pub fn repository<T: Entity>(&mut self) -> EntityRepository<'_, T> {
        EntityRepository::new(self)
    }

    /// Whether there is an open transaction holding uncommitted work.
    pub fn has_pending(&self) -> bool {
        self.factory.is_initialized()
    }

    /// Commits everything staged since the last commit.
    ///
    /// With no open transaction this succeeds without touching the store,
    /// so calling it twice in a row is safe.
    pub async fn commit(&mut self) -> DbResult<()> {
        if self.factory.is_disposed() {
            return Err(DbError::Disposed);
        }

        let Some(tx) = self.factory.take_handle() else {
            debug!("Nothing to commit");
            return Ok(());
        };

        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Commit failed");
            match DbError::from(e) {
                DbError::Internal(msg) => DbError::TransactionFailed(msg),
                other => other,
            }
        })?;

        debug!("Unit of work committed");
        Ok(())
    }

    /// Rolls back anything uncommitted and releases the handle.
    pub async fn dispose(&mut self) -> DbResult<()> {
        self.factory.dispose().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
