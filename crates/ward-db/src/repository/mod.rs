//! # Repository Module
//!
//! One generic repository over every persisted entity.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Generic Repository                                   │
//! │                                                                         │
//! │  Controller                                                            │
//! │       │                                                                 │
//! │       │  uow.repository::<Patient>()                                    │
//! │       ▼                                                                 │
//! │  EntityRepository<'_, T: Entity>   (borrows the UnitOfWork)             │
//! │  ├── get_all()          → EntityQuery (lazy)                            │
//! │  ├── find_by(predicate) → EntityQuery (lazy)                            │
//! │  ├── get_single(id)     → T or DbError::NotFound                        │
//! │  ├── add(&mut T)        → INSERT, id written back                       │
//! │  └── update(&T)         → UPDATE by id                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EntityQuery                                                           │
//! │  ├── filter / order_by_id / skip / take    (compose, no I/O)            │
//! │  └── to_list / first / count / exists / paginate   (run SQL)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  The unit of work's transaction                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entity types describe their table through [`Entity`]; everything else is
//! shared. Entity-specific lookups live next to the entity's `Entity` impl
//! ([`patient`], [`error_log`]).
//!
//! ## Not-Found Policy
//! `get_single` and `update` return `DbError::NotFound` for a missing id.
//! No sentinel values.

pub mod error_log;
pub mod patient;
pub mod query;

use std::future::Future;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::uow::UnitOfWork;

pub use query::{EntityQuery, Predicate};

// =============================================================================
// Entity
// =============================================================================

/// A bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    NullableText(Option<String>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Appends a `?` placeholder and binds the value.
    pub(crate) fn push_bind(self, qb: &mut QueryBuilder<'static, Sqlite>) {
        match self {
            SqlValue::Int(v) => qb.push_bind(v),
            SqlValue::Text(v) => qb.push_bind(v),
            SqlValue::NullableText(v) => qb.push_bind(v),
            SqlValue::Date(v) => qb.push_bind(v),
            SqlValue::Timestamp(v) => qb.push_bind(v),
        };
    }
}

/// A type persisted in its own table with an integer `id` primary key.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    /// Name used in errors and logs.
    const NAME: &'static str;

    const TABLE: &'static str;

    /// Persisted columns other than `id`, in the order of [`Entity::values`].
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Column values matching [`Entity::COLUMNS`].
    fn values(&self) -> Vec<SqlValue>;
}

/// `id, col1, col2, ...` for `T`.
pub(crate) fn select_list<T: Entity>() -> String {
    std::iter::once("id")
        .chain(T::COLUMNS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Repository
// =============================================================================

/// Data access for one entity type.
///
/// Writes are staged in the unit of work and become durable on
/// `UnitOfWork::commit`.
pub trait Repository<T: Entity> {
    /// Every row, as a lazy query.
    fn get_all(&mut self) -> EntityQuery<'_, T>;

    /// Rows matching `predicate`, as a lazy query evaluated in the store.
    fn find_by(&mut self, predicate: Predicate) -> EntityQuery<'_, T> {
        self.get_all().filter(predicate)
    }

    /// The row with `id`, or `DbError::NotFound`.
    fn get_single(&mut self, id: i64) -> impl Future<Output = DbResult<T>> + Send;

    /// Inserts `entity` and writes the assigned id back onto it.
    fn add(&mut self, entity: &mut T) -> impl Future<Output = DbResult<()>> + Send;

    /// Overwrites every column of the row with `entity.id()`.
    fn update(&mut self, entity: &T) -> impl Future<Output = DbResult<()>> + Send;
}

/// SQLite implementation of [`Repository`], bound to a unit of work.
pub struct EntityRepository<'u, T: Entity> {
    uow: &'u mut UnitOfWork,
    _entity: PhantomData<fn() -> T>,
}

impl<'u, T: Entity> EntityRepository<'u, T> {
    pub(crate) fn new(uow: &'u mut UnitOfWork) -> Self {
        EntityRepository {
            uow,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> for EntityRepository<'_, T> {
    fn get_all(&mut self) -> EntityQuery<'_, T> {
        EntityQuery::new(&mut *self.uow)
    }

    async fn get_single(&mut self, id: i64) -> DbResult<T> {
        debug!(entity = T::NAME, id, "Fetching by id");

        self.get_all()
            .filter(Predicate::IdEquals(id))
            .first()
            .await?
            .ok_or_else(|| DbError::not_found(T::NAME, id))
    }

    async fn add(&mut self, entity: &mut T) -> DbResult<()> {
        let values = entity.values();
        debug_assert_eq!(values.len(), T::COLUMNS.len());

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            value.push_bind(&mut qb);
        }
        qb.push(")");

        let conn = self.uow.db_context().await?;
        let result = qb.build().execute(conn).await?;

        entity.set_id(result.last_insert_rowid());
        debug!(entity = T::NAME, id = entity.id(), "Inserted");
        Ok(())
    }

    async fn update(&mut self, entity: &T) -> DbResult<()> {
        let id = entity.id();
        let values = entity.values();
        debug_assert_eq!(values.len(), T::COLUMNS.len());

        let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", T::TABLE));
        for (i, (column, value)) in T::COLUMNS.iter().zip(values).enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column).push(" = ");
            value.push_bind(&mut qb);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let conn = self.uow.db_context().await?;
        let result = qb.build().execute(conn).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::NAME, id));
        }

        debug!(entity = T::NAME, id, "Updated");
        Ok(())
    }
}
