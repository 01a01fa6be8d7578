//! Request-level layers shared by every route.
//!
//! ```text
//! request ──► log_requests ──► record_failures ──► [require_admin] ──► handler
//!                  │                  │
//!                  │                  └─ 5xx with FailureRecord → errors table
//!                  └─ method, path, status, elapsed_ms
//! ```

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};
use ward_core::ErrorLog;
use ward_db::repository::error_log::log_error;

use crate::error::FailureRecord;
use crate::state::AppState;

/// Logs one line per request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}

/// Persists unexpected failures to the error log.
///
/// Runs after the handler, so the handler's unit of work has already been
/// released and the entry gets a connection of its own.
pub async fn record_failures(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if let Some(record) = response.extensions().get::<FailureRecord>().cloned() {
        let entry = ErrorLog::new(record.message, record.stack_trace, state.mapping.now());
        let mut uow = state.db.unit_of_work();

        if let Err(e) = log_error(&mut uow, entry).await {
            warn!(error = %e, "Could not write error log entry");
        }
    }

    response
}
