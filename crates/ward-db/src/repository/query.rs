//! # Lazy Entity Queries
//!
//! [`EntityQuery`] collects a filter, an ordering and a slice, and only turns
//! them into SQL when a terminal method runs.
//!
//! ## Text Matching
//! Case-insensitive predicates run against shadow columns that already hold
//! [`fold_case`]d text, written by the entity on every insert and update. The
//! needle is folded the same way, so the store only compares bytes.
//! ```text
//! Predicate::contains_folded("last_name_folded", "ÉLO")
//!     → instr(last_name_folded, ?)  with ? = "élo"
//!
//!   "Élodie" ✓   "ÉLODIE" ✓   "Smith" ✗
//! ```

use std::marker::PhantomData;

use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use ward_core::validation::fold_case;
use ward_core::{PageRequest, PaginationSet};

use super::{select_list, Entity};
use crate::error::DbResult;
use crate::uow::UnitOfWork;

// =============================================================================
// Predicate
// =============================================================================

/// A filter evaluated by the store.
///
/// Column names are `&'static str` so only identifiers known at compile
/// time reach the SQL text; user input is always bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Folded column contains `needle`. `needle` is stored folded.
    ContainsFolded {
        column: &'static str,
        needle: String,
    },
    /// Folded column equals `value`. `value` is stored folded.
    EqualsFolded {
        column: &'static str,
        value: String,
    },
    IdEquals(i64),
    IdNotEquals(i64),
    /// At least one matches. Empty never matches.
    Any(Vec<Predicate>),
    /// All match. Empty always matches.
    All(Vec<Predicate>),
}

impl Predicate {
    /// `column` must hold [`fold_case`]d text.
    pub fn contains_folded(column: &'static str, needle: &str) -> Self {
        Predicate::ContainsFolded {
            column,
            needle: fold_case(needle),
        }
    }

    /// `column` must hold [`fold_case`]d text.
    pub fn equals_folded(column: &'static str, value: &str) -> Self {
        Predicate::EqualsFolded {
            column,
            value: fold_case(value),
        }
    }

    /// `needle` contained in any of the folded `columns`.
    pub fn contains_in_any(columns: &[&'static str], needle: &str) -> Self {
        Predicate::Any(
            columns
                .iter()
                .map(|column| Predicate::contains_folded(column, needle))
                .collect(),
        )
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Any(mut list) => {
                list.push(other);
                Predicate::Any(list)
            }
            first => Predicate::Any(vec![first, other]),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::All(mut list) => {
                list.push(other);
                Predicate::All(list)
            }
            first => Predicate::All(vec![first, other]),
        }
    }

    /// Appends this predicate as a boolean SQL expression.
    pub(crate) fn push_sql(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        match self {
            Predicate::ContainsFolded { column, needle } => {
                qb.push("instr(")
                    .push(*column)
                    .push(", ")
                    .push_bind(needle.clone())
                    .push(") > 0");
            }
            Predicate::EqualsFolded { column, value } => {
                qb.push(*column).push(" = ").push_bind(value.clone());
            }
            Predicate::IdEquals(id) => {
                qb.push("id = ").push_bind(*id);
            }
            Predicate::IdNotEquals(id) => {
                qb.push("id <> ").push_bind(*id);
            }
            Predicate::Any(list) => Self::push_group(qb, list, " OR ", "0"),
            Predicate::All(list) => Self::push_group(qb, list, " AND ", "1"),
        }
    }

    fn push_group(
        qb: &mut QueryBuilder<'static, Sqlite>,
        list: &[Predicate],
        joiner: &str,
        empty: &str,
    ) {
        if list.is_empty() {
            qb.push(empty);
            return;
        }
        qb.push("(");
        for (i, predicate) in list.iter().enumerate() {
            if i > 0 {
                qb.push(joiner);
            }
            predicate.push_sql(qb);
        }
        qb.push(")");
    }
}

// =============================================================================
// EntityQuery
// =============================================================================

/// A composable, not-yet-executed query over `T`'s table.
pub struct EntityQuery<'u, T: Entity> {
    uow: &'u mut UnitOfWork,
    predicate: Option<Predicate>,
    order_by_id: bool,
    skip: Option<u64>,
    take: Option<u64>,
    _entity: PhantomData<fn() -> T>,
}

impl<'u, T: Entity> EntityQuery<'u, T> {
    pub(crate) fn new(uow: &'u mut UnitOfWork) -> Self {
        EntityQuery {
            uow,
            predicate: None,
            order_by_id: false,
            skip: None,
            take: None,
            _entity: PhantomData,
        }
    }

    /// Narrows the query; repeated calls AND together.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Orders by id ascending.
    pub fn order_by_id(mut self) -> Self {
        self.order_by_id = true;
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.skip = Some(count);
        self
    }

    pub fn take(mut self, count: u64) -> Self {
        self.take = Some(count);
        self
    }

    /// Runs the query and returns every row.
    pub async fn to_list(self) -> DbResult<Vec<T>> {
        let mut qb = self.build(&select_list::<T>());
        debug!(entity = T::NAME, sql = qb.sql(), "Fetching list");

        let conn = self.uow.db_context().await?;
        let rows = qb.build_query_as::<T>().fetch_all(conn).await?;
        Ok(rows)
    }

    /// Runs the query and returns the first row, if any.
    pub async fn first(self) -> DbResult<Option<T>> {
        let query = self.take(1);
        let mut qb = query.build(&select_list::<T>());
        debug!(entity = T::NAME, sql = qb.sql(), "Fetching first");

        let conn = query.uow.db_context().await?;
        let row = qb.build_query_as::<T>().fetch_optional(conn).await?;
        Ok(row)
    }

    /// Number of rows the query would return.
    pub async fn count(self) -> DbResult<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM (");
        self.push_select(&mut qb, "id");
        qb.push(")");

        let conn = self.uow.db_context().await?;
        let count = qb.build_query_scalar::<i64>().fetch_one(conn).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Whether the query matches at least one row.
    pub async fn exists(self) -> DbResult<bool> {
        Ok(self.first_id().await?.is_some())
    }

    /// One page of the filtered rows, ordered by id.
    ///
    /// Counts the filtered set first, then fetches the slice at
    /// `page * page_size`. Any ordering or slicing already on the query is
    /// replaced; the filter is kept.
    pub async fn paginate(self, request: PageRequest) -> DbResult<PaginationSet<T>> {
        let EntityQuery { uow, predicate, .. } = self;

        let mut total_query = EntityQuery::<T>::new(&mut *uow);
        total_query.predicate = predicate.clone();
        let total_count = total_query.count().await?;

        let items = if request.offset() >= total_count {
            Vec::new()
        } else {
            let mut page_query = EntityQuery::<T>::new(uow);
            page_query.predicate = predicate;
            page_query
                .order_by_id()
                .skip(request.offset())
                .take(u64::from(request.page_size()))
                .to_list()
                .await?
        };

        debug!(
            entity = T::NAME,
            page = request.page(),
            page_size = request.page_size(),
            total_count,
            items = items.len(),
            "Paginated"
        );

        Ok(PaginationSet::new(request, total_count, items))
    }

    async fn first_id(self) -> DbResult<Option<i64>> {
        let query = self.take(1);
        let mut qb = query.build("id");
        let conn = query.uow.db_context().await?;
        let id = qb.build_query_scalar::<i64>().fetch_optional(conn).await?;
        Ok(id)
    }

    fn build(&self, projection: &str) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("");
        self.push_select(&mut qb, projection);
        qb
    }

    /// `SELECT <projection> FROM <table> [WHERE ..] [ORDER BY id] [LIMIT .. OFFSET ..]`
    fn push_select(&self, qb: &mut QueryBuilder<'static, Sqlite>, projection: &str) {
        qb.push("SELECT ").push(projection).push(" FROM ").push(T::TABLE);

        if let Some(predicate) = &self.predicate {
            qb.push(" WHERE ");
            predicate.push_sql(qb);
        }

        if self.order_by_id {
            qb.push(" ORDER BY id ASC");
        }

        if self.take.is_some() || self.skip.is_some() {
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded
            let limit = self.take.map(clamp_i64).unwrap_or(-1);
            qb.push(" LIMIT ").push_bind(limit);
            if let Some(skip) = self.skip {
                qb.push(" OFFSET ").push_bind(clamp_i64(skip));
            }
        }
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(predicate: &Predicate) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("");
        predicate.push_sql(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_folded_predicates_fold_the_needle() {
        let contains = Predicate::contains_folded("last_name_folded", " ÉLO ");
        assert_eq!(
            contains,
            Predicate::ContainsFolded {
                column: "last_name_folded",
                needle: "élo".to_string(),
            }
        );
        assert_eq!(sql(&contains), "instr(last_name_folded, ?) > 0");

        let equals = Predicate::equals_folded("email_folded", "Ü@X.com");
        assert_eq!(sql(&equals), "email_folded = ?");
    }

    #[test]
    fn test_empty_groups() {
        assert_eq!(sql(&Predicate::Any(vec![])), "0");
        assert_eq!(sql(&Predicate::All(vec![])), "1");
        assert_eq!(
            sql(&Predicate::IdEquals(1).or(Predicate::IdNotEquals(2))),
            "(id = ? OR id <> ?)"
        );
    }
}
