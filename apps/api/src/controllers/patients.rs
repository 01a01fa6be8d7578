//! # Patients Controller
//!
//! The `/api/patients` endpoints.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reads:   parse route/query ──► query (filtered, paged) ──► 200         │
//! │              │ malformed → 400                                          │
//! │                                                                         │
//! │  writes:  validate ──► business rule ──► mutate ──► commit ──► 201/200  │
//! │              │ 400         │ 400 (duplicate)                            │
//! │                                                                         │
//! │  every handler owns one unit of work; returning without a commit        │
//! │  rolls its transaction back. Writes hold the write lock from BEGIN.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Routes
//! | method | path                                      |
//! |--------|-------------------------------------------|
//! | GET    | `/?filter=<text>`                         |
//! | GET    | `/details/{id}`                           |
//! | POST   | `/register`                               |
//! | POST   | `/update`                                 |
//! | GET    | `/search[/{page}[/{page_size}[/{filter}]]]` |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};
use ward_core::pagination::DEFAULT_PAGE_SIZE;
use ward_core::validation::{
    normalize_filter, parse_route_id, parse_route_u32, validate_patient, validate_patient_update,
};
use ward_core::{
    CoreError, PageRequest, PaginationSet, Patient, PatientViewModel, ValidationError,
};
use ward_db::repository::patient::{contact_filter, search_filter};
use ward_db::Repository;

use crate::error::ApiError;
use crate::state::{AppState, RequestUnitOfWork, WriteUnitOfWork};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/details/{id}", get(details))
        .route("/register", post(register))
        .route("/update", post(update))
        .route("/search", get(search))
        .route("/search/{page}", get(search_page))
        .route("/search/{page}/{page_size}", get(search_page_size))
        .route("/search/{page}/{page_size}/{filter}", get(search_filtered))
}

// =============================================================================
// Reads
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListQuery {
    filter: Option<String>,
}

/// `GET /api/patients?filter=`: email, first or last name contains the filter.
///
/// The parameter is required; an empty value lists everyone.
async fn list(
    State(state): State<AppState>,
    mut uow: RequestUnitOfWork,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<PatientViewModel>>, ApiError> {
    let Query(query) = query?;
    let filter = query.filter.ok_or_else(|| ValidationError::required("filter"))?;

    let mut patients = uow.repository::<Patient>();
    let rows = match normalize_filter(&filter) {
        Some(needle) => patients.find_by(contact_filter(&needle)),
        None => patients.get_all(),
    }
    .order_by_id()
    .to_list()
    .await?;

    debug!(filter = %filter, count = rows.len(), "Listed patients");
    Ok(Json(rows.iter().map(|p| state.mapping.to_view_model(p)).collect()))
}

/// `GET /api/patients/details/{id}`
async fn details(
    State(state): State<AppState>,
    mut uow: RequestUnitOfWork,
    Path(raw_id): Path<String>,
) -> Result<Json<PatientViewModel>, ApiError> {
    let id = parse_route_id("id", &raw_id)?;

    let patient = uow.repository::<Patient>().get_single(id).await?;
    Ok(Json(state.mapping.to_view_model(&patient)))
}

async fn search(
    State(state): State<AppState>,
    uow: RequestUnitOfWork,
) -> Result<Json<PaginationSet<PatientViewModel>>, ApiError> {
    run_search(&state, uow, PageRequest::default(), None).await
}

async fn search_page(
    State(state): State<AppState>,
    uow: RequestUnitOfWork,
    Path(page): Path<String>,
) -> Result<Json<PaginationSet<PatientViewModel>>, ApiError> {
    let page = parse_route_u32("page", &page)?;
    run_search(&state, uow, PageRequest::new(page, DEFAULT_PAGE_SIZE)?, None).await
}

async fn search_page_size(
    State(state): State<AppState>,
    uow: RequestUnitOfWork,
    Path((page, page_size)): Path<(String, String)>,
) -> Result<Json<PaginationSet<PatientViewModel>>, ApiError> {
    let request = parse_page_request(&page, &page_size)?;
    run_search(&state, uow, request, None).await
}

async fn search_filtered(
    State(state): State<AppState>,
    uow: RequestUnitOfWork,
    Path((page, page_size, filter)): Path<(String, String, String)>,
) -> Result<Json<PaginationSet<PatientViewModel>>, ApiError> {
    let request = parse_page_request(&page, &page_size)?;
    run_search(&state, uow, request, Some(filter)).await
}

fn parse_page_request(page: &str, page_size: &str) -> Result<PageRequest, ValidationError> {
    let page = parse_route_u32("page", page)?;
    let page_size = parse_route_u32("pageSize", page_size)?;
    PageRequest::new(page, page_size)
}

/// Pages through patients whose last name, identity card or first name
/// contains `filter`; everyone when there is no filter.
async fn run_search(
    state: &AppState,
    mut uow: RequestUnitOfWork,
    request: PageRequest,
    filter: Option<String>,
) -> Result<Json<PaginationSet<PatientViewModel>>, ApiError> {
    let needle = filter.as_deref().and_then(normalize_filter);

    let mut patients = uow.repository::<Patient>();
    let query = match &needle {
        Some(needle) => patients.find_by(search_filter(needle)),
        None => patients.get_all(),
    };
    let page = query.paginate(request).await?;

    debug!(
        filter = needle.as_deref().unwrap_or(""),
        page = page.page,
        count = page.count,
        total = page.total_count,
        "Searched patients"
    );
    Ok(Json(page.map(|p| state.mapping.to_view_model(&p))))
}

// =============================================================================
// Writes
// =============================================================================

/// `POST /api/patients/register`
async fn register(
    State(state): State<AppState>,
    mut uow: WriteUnitOfWork,
    payload: Result<Json<PatientViewModel>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientViewModel>), ApiError> {
    let Json(vm) = payload?;
    validate_patient(&vm, state.mapping.today())?;

    let mut patients = uow.repository::<Patient>();
    if patients.user_exists(&vm.email, &vm.identity_card).await? {
        return Err(CoreError::DuplicatePatient.into());
    }

    let mut patient = state.mapping.new_patient(&vm);
    patients.add(&mut patient).await?;
    uow.commit().await?;

    info!(id = patient.id, "Patient registered");
    Ok((StatusCode::CREATED, Json(state.mapping.to_view_model(&patient))))
}

/// `POST /api/patients/update`
///
/// The body must carry the `id` of an existing patient.
async fn update(
    State(state): State<AppState>,
    mut uow: WriteUnitOfWork,
    payload: Result<Json<PatientViewModel>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(vm) = payload?;
    validate_patient_update(&vm, state.mapping.today())?;

    let mut patients = uow.repository::<Patient>();
    let mut patient = patients.get_single(vm.id).await?;

    if patients
        .user_exists_except(&vm.email, &vm.identity_card, vm.id)
        .await?
    {
        return Err(CoreError::DuplicatePatient.into());
    }

    state.mapping.apply(&vm, &mut patient);
    patients.update(&patient).await?;
    uow.commit().await?;

    info!(id = patient.id, "Patient updated");
    Ok(StatusCode::OK)
}
