//! End-to-end tests for the full budgetdeskd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! repositories, real mediator and validators, real axum router) and
//! exercises the HTTP layer via `tower::ServiceExt::oneshot`. No TCP port
//! is bound.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use budgetdesk_adapter_storage_sqlite_sqlx::SqliteCountryRepository;
use budgetdesk_app::ports::Repository;
use budgetdesk_domain::country::Country;
use budgetdesk_domain::id::ClientId;
use budgetdeskd::config::Config;
use budgetdeskd::wiring::{self, App};

/// Build a fully-wired application backed by an in-memory `SQLite` database.
async fn app() -> App {
    let mut config = Config::default();
    config
        .connection_strings
        .insert("App.Sqlite".to_string(), "sqlite::memory:".to_string());
    wiring::build(&config)
        .await
        .expect("in-memory database should initialise")
}

async fn call(app: &App, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let resp = app.router.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn create_client(app: &App, name: &str) -> Value {
    let (status, client) =
        call(app, Method::POST, "/api/clients", Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::CREATED);
    client
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_reject_duplicate_normalized_email_and_keep_one_row() {
    let app = app().await;
    let (status, created) = call(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({"user_name": "ada", "email": "ada@example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["normalized_email"], "ADA@EXAMPLE.ORG");
    assert!(created["created_at"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({"user_name": "countess", "email": "Ada@Example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["failures"][0]["message"],
        "Email 'Ada@Example.org' is already in use"
    );

    let (_, page) = call(&app, Method::GET, "/api/users", None).await;
    assert_eq!(page["total"], 1);
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_report_page_three_for_skip_ten_take_five() {
    let app = app().await;
    for idx in 0..12 {
        create_client(&app, &format!("Client {idx:02}")).await;
    }

    let (status, page) = call(
        &app,
        Method::GET,
        "/api/clients?skip=10&take=5&sort=name",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page_number"], 3);
    assert_eq!(page["page_size"], 5);
    assert_eq!(page["total"], 12);
    let names: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Client 10", "Client 11"]);
}

#[tokio::test]
async fn should_return_not_found_when_deleting_missing_client() {
    let app = app().await;
    let uri = format!("/api/clients/{}", ClientId::new());
    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_reject_unknown_sort_field() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/clients?sort=password", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["failures"][0]["field"], "password");
}

#[tokio::test]
async fn should_soft_delete_client_and_allow_name_reuse() {
    let app = app().await;
    let client = create_client(&app, "Acme").await;
    let uri = format!("/api/clients/{}", client["id"].as_str().unwrap());

    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, deleted) =
        call(&app, Method::GET, &format!("{uri}?include_deleted=true"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["is_deleted"], true);
    assert!(deleted["deleted_at"].is_string());

    create_client(&app, "Acme").await;
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_eager_load_client_and_guard_client_delete() {
    let app = app().await;
    let client = create_client(&app, "Acme").await;
    let client_uri = format!("/api/clients/{}", client["id"].as_str().unwrap());

    let (status, budget) = call(
        &app,
        Method::POST,
        "/api/budgets",
        Some(json!({"client_id": client["id"], "title": "Roof repair", "amount_cents": 120_000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let budget_uri = format!("/api/budgets/{}", budget["id"].as_str().unwrap());

    let (_, loaded) = call(&app, Method::GET, &format!("{budget_uri}?include=client"), None).await;
    assert_eq!(loaded["client"]["name"], "Acme");

    let (status, body) = call(&app, Method::DELETE, &client_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["failures"][0]["message"],
        "Client still has 1 budget(s) and cannot be deleted"
    );

    let (status, _) = call(&app, Method::DELETE, &budget_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::DELETE, &client_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn should_serve_grid_envelope() {
    let app = app().await;
    let client = create_client(&app, "Acme").await;
    for (title, amount) in [("Roof repair", 120_000), ("Roof paint", 30_000), ("Garden", 9_900)] {
        call(
            &app,
            Method::POST,
            "/api/budgets",
            Some(json!({"client_id": client["id"], "title": title, "amount_cents": amount})),
        )
        .await;
    }

    let (status, grid) = call(
        &app,
        Method::POST,
        "/api/budgets/grid",
        Some(json!({
            "draw": 3,
            "start": 1,
            "length": 1,
            "search": "ROOF",
            "order": [{"column": "amount_cents", "dir": "desc"}],
            "include": ["client"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grid["draw"], 3);
    assert_eq!(grid["records_total"], 3);
    assert_eq!(grid["records_filtered"], 2);
    assert_eq!(grid["page"], 2);
    assert_eq!(grid["data"][0]["title"], "Roof paint");
    assert_eq!(grid["data"][0]["client"]["name"], "Acme");
}

#[tokio::test]
async fn should_reject_non_positive_budget_amount() {
    let app = app().await;
    let client = create_client(&app, "Acme").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/budgets",
        Some(json!({"client_id": client["id"], "title": "Free", "amount_cents": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["failures"][0]["field"], "amount_cents");
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_refuse_to_delete_default_and_last_setting() {
    let app = app().await;
    let (_, page) = call(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(page["total"], 1);
    let seeded = &page["items"][0];
    assert_eq!(seeded["key"], "currency");
    let seeded_uri = format!("/api/settings/{}", seeded["id"].as_str().unwrap());

    let (status, body) = call(&app, Method::DELETE, &seeded_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages: Vec<&str> = body["failures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|failure| failure["message"].as_str().unwrap())
        .collect();
    assert_eq!(
        messages,
        vec![
            "The default setting cannot be deleted",
            "The last setting cannot be deleted",
        ]
    );

    let (status, extra) = call(
        &app,
        Method::POST,
        "/api/settings",
        Some(json!({"key": "locale", "value": "fr-BE"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let extra_uri = format!("/api/settings/{}", extra["id"].as_str().unwrap());
    let (status, _) = call(&app, Method::DELETE, &extra_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ---------------------------------------------------------------------------
// Countries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_serve_countries_from_cache_until_refreshed() {
    let app = app().await;
    let (status, countries) = call(&app, Method::GET, "/api/countries", None).await;
    assert_eq!(status, StatusCode::OK);
    let countries = countries.as_array().unwrap().clone();
    assert_eq!(countries.len(), 11);
    assert_eq!(countries[0]["name"], "Belgium");

    let repo = SqliteCountryRepository::new(app.database.pool().clone());
    repo.insert(Country::new("IE", "Ireland")).await.unwrap();

    let (_, cached) = call(&app, Method::GET, "/api/countries", None).await;
    assert_eq!(cached.as_array().unwrap().len(), 11);

    let (status, _) = call(&app, Method::POST, "/api/countries/refresh", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, fresh) = call(&app, Method::GET, "/api/countries", None).await;
    assert_eq!(fresh.as_array().unwrap().len(), 12);
}
