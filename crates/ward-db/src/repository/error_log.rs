//! # Error Log Repository
//!
//! Persists [`ErrorLog`] rows through the generic repository.

use tracing::{debug, warn};
use ward_core::ErrorLog;

use super::{Entity, Repository, SqlValue};
use crate::error::DbResult;
use crate::uow::UnitOfWork;

impl Entity for ErrorLog {
    const NAME: &'static str = "ErrorLog";
    const TABLE: &'static str = "errors";
    const COLUMNS: &'static [&'static str] = &["message", "stack_trace", "date_created"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.message.clone()),
            SqlValue::NullableText(self.stack_trace.clone()),
            SqlValue::Timestamp(self.date_created),
        ]
    }
}

/// Writes `entry` in its own unit of work and commits it.
///
/// Returns the stored id. Callers on an error path usually only log a
/// failure here, since the original error is what the client sees.
pub async fn log_error(uow: &mut UnitOfWork, mut entry: ErrorLog) -> DbResult<i64> {
    uow.repository::<ErrorLog>().add(&mut entry).await?;
    uow.commit().await.inspect_err(|e| warn!(error = %e, "Failed to commit error log"))?;

    debug!(id = entry.id, "Error logged");
    Ok(entry.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    #[tokio::test]
    async fn test_log_error_persists_entry() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let entry = ErrorLog::new("boom", Some("at handler".to_string()), Utc::now());
        let id = log_error(&mut db.unit_of_work(), entry).await.unwrap();

        let mut uow = db.unit_of_work();
        let stored = uow.repository::<ErrorLog>().get_single(id).await.unwrap();
        assert_eq!(stored.message, "boom");
        assert_eq!(stored.stack_trace.as_deref(), Some("at handler"));
    }
}
