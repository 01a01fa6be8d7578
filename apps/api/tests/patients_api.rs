//! HTTP integration tests for the patients API.
//!
//! Starts the full router on an ephemeral port over an in-memory database
//! (or a scratch file when requests must run side by side) and exercises it
//! with reqwest.

use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use ward_api::{router, ApiConfig, ApiError, AppState};
use ward_core::{ErrorLog, MappingProfile, Patient, UNASSIGNED_ID};
use ward_db::{Database, DbConfig, Repository};

struct TestServer {
    base: String,
    db: Database,
    token: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(DbConfig::in_memory()).await
    }

    async fn start_with(config: DbConfig) -> Self {
        let db = Database::new(config).await.unwrap();
        let state = AppState::new(db.clone(), &ApiConfig::default()).with_mapping(
            MappingProfile::new().with_clock(|| Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()),
        );
        let token = state.jwt.issue_token("tester", &["Admin"]).unwrap();

        let base = serve(router(state)).await;
        TestServer {
            base,
            db,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// Inserts patients directly through the repository.
    async fn seed(&self, names: &[(&str, &str)]) {
        let mut uow = self.db.unit_of_work();
        for (i, (first, last)) in names.iter().enumerate() {
            let mut patient = Patient {
                id: UNASSIGNED_ID,
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{}.{}@example.com", first, i).to_lowercase(),
                identity_card: format!("CARD-{:03}", i),
                unique_key: uuid::Uuid::new_v4().to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
                mobile: "0123456789".to_string(),
                registration_date: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            };
            uow.repository::<Patient>().add(&mut patient).await.unwrap();
        }
        uow.commit().await.unwrap();
    }
}

/// Bind to port 0 and return the actual address.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn ada() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "identityCard": "ID-0001",
        "dateOfBirth": "1990-12-10",
        "mobile": "0123456789"
    })
}

// =============================================================================
// Health & auth
// =============================================================================

#[tokio::test]
async fn health_needs_no_token() {
    let server = TestServer::start().await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn missing_token_is_401() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/api/patients/search"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_401() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/api/patients/search"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn token_without_admin_role_is_403() {
    let server = TestServer::start().await;
    let jwt = ward_api::auth::JwtManager::new(&ApiConfig::default().auth.jwt_secret, 3600);
    let token = jwt.issue_token("reader", &["Viewer"]).unwrap();

    let resp = server
        .client
        .post(server.url("/api/patients/register"))
        .bearer_auth(token)
        .json(&ada())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The handler never ran.
    let resp = server.get("/api/patients/search").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["totalCount"], 0);
}

// =============================================================================
// Register / details / update
// =============================================================================

#[tokio::test]
async fn register_then_details_returns_equal_view_model() {
    let server = TestServer::start().await;

    let resp = server.post("/api/patients/register", &ada()).await;
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();

    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(created["firstName"], "Ada");
    assert_eq!(created["registrationDate"], "2024-06-01T09:30:00Z");
    assert!(created["uniqueKey"].as_str().is_some());

    let resp = server.get(&format!("/api/patients/details/{}", id)).await;
    assert_eq!(resp.status(), 200);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn register_invalid_body_lists_messages_in_field_order() {
    let server = TestServer::start().await;

    let body = json!({
        "firstName": "",
        "lastName": "Lovelace",
        "email": "not-an-email",
        "identityCard": "ID-1",
        "mobile": "12345"
    });
    let resp = server.post("/api/patients/register", &body).await;
    assert_eq!(resp.status(), 400);

    let messages: Vec<String> = resp.json().await.unwrap();
    assert_eq!(
        messages,
        vec![
            "First Name must be between 1 - 100 characters",
            "Date of Birth is required",
            "Mobile phone must have 10 digits",
            "Enter a valid Email address",
        ]
    );
}

#[tokio::test]
async fn register_future_date_of_birth_is_rejected() {
    let server = TestServer::start().await;

    let mut body = ada();
    body["dateOfBirth"] = json!("2030-01-01");
    let resp = server.post("/api/patients/register", &body).await;
    assert_eq!(resp.status(), 400);

    let messages: Vec<String> = resp.json().await.unwrap();
    assert_eq!(messages, vec!["Date of Birth cannot be in the future"]);
}

#[tokio::test]
async fn register_malformed_json_is_400() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/patients/register"))
        .bearer_auth(&server.token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let messages: Vec<String> = resp.json().await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn duplicate_email_in_other_case_is_business_rule_error() {
    let server = TestServer::start().await;
    assert_eq!(server.post("/api/patients/register", &ada()).await.status(), 201);

    let mut twin = ada();
    twin["email"] = json!("ADA@Example.COM");
    twin["identityCard"] = json!("ID-9999");
    let resp = server.post("/api/patients/register", &twin).await;
    assert_eq!(resp.status(), 400);

    let messages: Vec<String> = resp.json().await.unwrap();
    assert_eq!(messages, vec!["Email or Identity Card number already exists"]);

    let resp = server.get("/api/patients/search").await;
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["totalCount"], 1);
}

#[tokio::test]
async fn duplicate_identity_card_is_business_rule_error() {
    let server = TestServer::start().await;
    assert_eq!(server.post("/api/patients/register", &ada()).await.status(), 201);

    let mut twin = ada();
    twin["email"] = json!("grace@example.com");
    twin["identityCard"] = json!("id-0001");
    let resp = server.post("/api/patients/register", &twin).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn update_existing_patient() {
    let server = TestServer::start().await;
    let created: Value = server
        .post("/api/patients/register", &ada())
        .await
        .json()
        .await
        .unwrap();

    let mut changed = created.clone();
    changed["lastName"] = json!("King");
    changed["mobile"] = json!("0987654321");
    let resp = server.post("/api/patients/update", &changed).await;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().is_empty());

    let fetched: Value = server
        .get(&format!("/api/patients/details/{}", created["id"]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["lastName"], "King");
    assert_eq!(fetched["mobile"], "0987654321");
    assert_eq!(fetched["uniqueKey"], created["uniqueKey"]);
    assert_eq!(fetched["registrationDate"], created["registrationDate"]);
}

#[tokio::test]
async fn update_keeping_own_email_is_allowed() {
    let server = TestServer::start().await;
    let mut created: Value = server
        .post("/api/patients/register", &ada())
        .await
        .json()
        .await
        .unwrap();

    created["email"] = json!("ADA@EXAMPLE.COM");
    let resp = server.post("/api/patients/update", &created).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn update_onto_another_patients_email_is_rejected() {
    let server = TestServer::start().await;
    server.seed(&[("Grace", "Hopper")]).await;
    let mut created: Value = server
        .post("/api/patients/register", &ada())
        .await
        .json()
        .await
        .unwrap();

    created["email"] = json!("grace.0@example.com");
    let resp = server.post("/api/patients/update", &created).await;
    assert_eq!(resp.status(), 400);

    let messages: Vec<String> = resp.json().await.unwrap();
    assert_eq!(messages, vec!["Email or Identity Card number already exists"]);
}

#[tokio::test]
async fn concurrent_duplicate_registrations_yield_one_patient() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start_with(DbConfig::new(dir.path().join("ward.db"))).await;

    let mut first = ada();
    first["identityCard"] = json!("ID-A");
    let mut second = ada();
    second["email"] = json!("ADA@EXAMPLE.COM");
    second["identityCard"] = json!("ID-B");

    let (a, b) = tokio::join!(
        server.post("/api/patients/register", &first),
        server.post("/api/patients/register", &second),
    );
    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 400]);

    let loser = if a.status() == 400 { a } else { b };
    let messages: Vec<String> = loser.json().await.unwrap();
    assert_eq!(messages, vec!["Email or Identity Card number already exists"]);

    let mut uow = server.db.unit_of_work();
    assert_eq!(uow.repository::<Patient>().get_all().count().await.unwrap(), 1);
}

#[tokio::test]
async fn non_ascii_email_in_other_case_is_duplicate() {
    let server = TestServer::start().await;

    let mut first = ada();
    first["email"] = json!("Ü@x.com");
    assert_eq!(server.post("/api/patients/register", &first).await.status(), 201);

    let mut twin = ada();
    twin["email"] = json!("ü@x.com");
    twin["identityCard"] = json!("ID-0002");
    let resp = server.post("/api/patients/register", &twin).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn update_without_id_is_validation_error() {
    let server = TestServer::start().await;
    assert_eq!(server.post("/api/patients/register", &ada()).await.status(), 201);

    let resp = server.post("/api/patients/update", &ada()).await;
    assert_eq!(resp.status(), 400);

    let messages: Vec<String> = resp.json().await.unwrap();
    assert_eq!(messages, vec!["ID is required"]);
}

#[tokio::test]
async fn update_unknown_patient_is_404() {
    let server = TestServer::start().await;

    let mut body = ada();
    body["id"] = json!(4242);
    let resp = server.post("/api/patients/update", &body).await;
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn details_unknown_and_malformed_ids() {
    let server = TestServer::start().await;

    assert_eq!(server.get("/api/patients/details/999").await.status(), 404);
    assert_eq!(server.get("/api/patients/details/abc").await.status(), 400);
}

// =============================================================================
// List & search
// =============================================================================

#[tokio::test]
async fn list_requires_filter_parameter() {
    let server = TestServer::start().await;

    let resp = server.get("/api/patients").await;
    assert_eq!(resp.status(), 400);

    let messages: Vec<String> = resp.json().await.unwrap();
    assert_eq!(messages, vec!["filter is required"]);
}

#[tokio::test]
async fn list_matches_contact_fields_ignoring_case() {
    let server = TestServer::start().await;
    server
        .seed(&[("Anna", "Smith"), ("Bob", "SMITH"), ("Carl", "Smithers"), ("Dora", "Jones")])
        .await;

    let rows: Vec<Value> = server
        .get("/api/patients?filter=%20SMITH%20")
        .await
        .json()
        .await
        .unwrap();
    let last_names: Vec<&str> = rows.iter().map(|r| r["lastName"].as_str().unwrap()).collect();
    assert_eq!(last_names, vec!["Smith", "SMITH", "Smithers"]);

    let rows: Vec<Value> = server.get("/api/patients?filter=").await.json().await.unwrap();
    assert_eq!(rows.len(), 4);

    let rows: Vec<Value> = server
        .get("/api/patients?filter=dora.3@")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn search_pages_through_matches() {
    let server = TestServer::start().await;
    let mut names = vec![("Pat", "Smith"); 10];
    names.push(("Dora", "Jones"));
    server.seed(&names).await;

    let first: Value = server
        .get("/api/patients/search/0/4/smith")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["page"], 0);
    assert_eq!(first["count"], 4);
    assert_eq!(first["totalCount"], 10);
    assert_eq!(first["totalPages"], 3);
    assert_eq!(first["items"].as_array().unwrap().len(), 4);

    let last: Value = server
        .get("/api/patients/search/2/4/smith")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(last["count"], 2);

    let beyond: Value = server
        .get("/api/patients/search/3/4/smith")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(beyond["count"], 0);
    assert_eq!(beyond["totalCount"], 10);
    assert_eq!(beyond["totalPages"], 3);
    assert!(beyond["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_defaults_and_identity_card_match() {
    let server = TestServer::start().await;
    server
        .seed(&[("Anna", "Smith"), ("Bob", "Jones"), ("Carl", "Brown"), ("Dora", "White"), ("Ed", "Black")])
        .await;

    let page: Value = server.get("/api/patients/search").await.json().await.unwrap();
    assert_eq!(page["count"], 4);
    assert_eq!(page["totalCount"], 5);
    assert_eq!(page["totalPages"], 2);

    let page: Value = server.get("/api/patients/search/1").await.json().await.unwrap();
    assert_eq!(page["page"], 1);
    assert_eq!(page["count"], 1);

    let page: Value = server
        .get("/api/patients/search/0/10/card-00")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalCount"], 5);

    let ids: Vec<i64> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn search_matches_non_ascii_names_ignoring_case() {
    let server = TestServer::start().await;
    server.seed(&[("ÉLODIE", "Durand"), ("Eli", "Smith")]).await;

    let page: Value = server
        .get("/api/patients/search/0/10/élodie")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["items"][0]["firstName"], "ÉLODIE");
}

#[tokio::test]
async fn search_rejects_bad_route_segments() {
    let server = TestServer::start().await;

    assert_eq!(server.get("/api/patients/search/-1").await.status(), 400);
    assert_eq!(server.get("/api/patients/search/0/zero").await.status(), 400);
    assert_eq!(server.get("/api/patients/search/0/0/smith").await.status(), 400);
}

// =============================================================================
// Error log
// =============================================================================

#[tokio::test]
async fn unexpected_failures_are_written_to_error_log() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let state = AppState::new(db.clone(), &ApiConfig::default());

    let app = Router::new()
        .route(
            "/boom",
            get(|| async { Err::<(), _>(ApiError::Internal("disk on fire".into())) }),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            ward_api::middleware::record_failures,
        ))
        .with_state(state);
    let base = serve(app).await;

    let resp = reqwest::get(format!("{base}/boom")).await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INTERNAL");
    assert_eq!(body["message"], "Internal server error");

    let mut uow = db.unit_of_work();
    let entries = uow.repository::<ErrorLog>().get_all().to_list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "disk on fire");
}

#[tokio::test]
async fn store_failure_mid_request_is_500_and_writes_nothing() {
    let server = TestServer::start().await;
    sqlx::query(
        "CREATE TRIGGER reject_patients BEFORE INSERT ON patients \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END",
    )
    .execute(server.db.pool())
    .await
    .unwrap();

    let resp = server.post("/api/patients/register", &ada()).await;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "DATABASE_ERROR");
    assert_eq!(body["message"], "Database operation failed");

    let mut uow = server.db.unit_of_work();
    assert_eq!(uow.repository::<Patient>().get_all().count().await.unwrap(), 0);

    let entries = uow.repository::<ErrorLog>().get_all().to_list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.contains("disk full"), "{}", entries[0].message);
}

#[tokio::test]
async fn store_failure_during_update_leaves_row_unchanged() {
    let server = TestServer::start().await;
    let created: Value = server
        .post("/api/patients/register", &ada())
        .await
        .json()
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_updates BEFORE UPDATE ON patients \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END",
    )
    .execute(server.db.pool())
    .await
    .unwrap();

    let mut changed = created.clone();
    changed["lastName"] = json!("King");
    let resp = server.post("/api/patients/update", &changed).await;
    assert_eq!(resp.status(), 500);

    let fetched: Value = server
        .get(&format!("/api/patients/details/{}", created["id"]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["lastName"], "Lovelace");
}
