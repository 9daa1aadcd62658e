//! JSON REST API handler modules.

pub mod budgets;
pub mod clients;
#[allow(clippy::missing_errors_doc)]
pub mod countries;
#[allow(clippy::missing_errors_doc)]
pub mod crud;
#[allow(clippy::missing_errors_doc)]
pub mod grid;
pub mod settings;
pub mod users;

use axum::Router;
use axum::routing::{get, post};

use budgetdesk_domain::budget::Budget;
use budgetdesk_domain::client::Client;
use budgetdesk_domain::setting::Setting;
use budgetdesk_domain::user::User;

use crate::api::crud::Resource;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    let router = Router::new()
        .route("/countries", get(countries::list))
        .route("/countries/refresh", post(countries::refresh))
        .route("/clients/grid", post(grid::grid::<Client>))
        .route("/budgets/grid", post(grid::grid::<Budget>));

    let router = resource::<Client>(router, "/clients");
    let router = resource::<Budget>(router, "/budgets");
    let router = resource::<Setting>(router, "/settings");
    resource::<User>(router, "/users")
}

fn resource<E: Resource>(router: Router<AppState>, path: &str) -> Router<AppState> {
    router
        .route(path, get(crud::list::<E>).post(crud::create::<E>))
        .route(
            &format!("{path}/{{id}}"),
            get(crud::get::<E>)
                .put(crud::update::<E>)
                .delete(crud::delete::<E>),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use budgetdesk_app::cache::{CacheConfig, CacheProvider};
    use budgetdesk_app::mediator::Mediator;
    use budgetdesk_app::memory::InMemoryRepository;
    use budgetdesk_app::ports::Repository;
    use budgetdesk_app::requests::countries::{CountriesHandler, ListCountries, RefreshCountries};
    use budgetdesk_app::requests::register_crud;
    use budgetdesk_app::validators::register_validators;
    use budgetdesk_domain::country::Country;
    use budgetdesk_domain::id::ClientId;

    use super::*;

    struct TestApp {
        router: Router,
        settings: Arc<InMemoryRepository<Setting>>,
    }

    async fn setup() -> TestApp {
        let users = Arc::new(InMemoryRepository::<User>::new());
        let clients = Arc::new(InMemoryRepository::<Client>::new());
        let budgets = Arc::new(InMemoryRepository::<Budget>::new());
        let settings = Arc::new(InMemoryRepository::<Setting>::new());
        let countries = Arc::new(InMemoryRepository::<Country>::new());
        countries.insert(Country::new("PT", "Portugal")).await.unwrap();
        countries.insert(Country::new("BE", "Belgium")).await.unwrap();

        let cache = Arc::new(CacheProvider::new(CacheConfig {
            default_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(60),
        }));
        let countries_handler = CountriesHandler::new(countries, cache);

        let builder = Mediator::builder();
        let builder = register_crud::<User, _>(builder, Arc::clone(&users));
        let builder = register_crud::<Client, _>(builder, Arc::clone(&clients));
        let builder = register_crud::<Budget, _>(builder, Arc::clone(&budgets));
        let builder = register_crud::<Setting, _>(builder, Arc::clone(&settings));
        let mediator = register_validators(builder, &users, &clients, &budgets, &settings)
            .handler::<ListCountries, _>(countries_handler.clone())
            .handler::<RefreshCountries, _>(countries_handler)
            .build()
            .unwrap();

        TestApp {
            router: crate::router::build(AppState::new(mediator)),
            settings,
        }
    }

    async fn call(
        app: &TestApp,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn should_reject_duplicate_normalized_email() {
        let app = setup().await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({"user_name": "ada", "email": "ada@example.org"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({"user_name": "ada2", "email": " ADA@example.org "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["failures"][0]["field"], "email");
        assert!(
            body["failures"][0]["message"]
                .as_str()
                .unwrap()
                .contains("already in use")
        );

        let (_, page) = call(&app, Method::GET, "/api/users", None).await;
        assert_eq!(page["total"], 1);
    }

    #[tokio::test]
    async fn should_report_page_three_for_skip_ten_take_five() {
        let app = setup().await;
        for idx in 0..12 {
            call(
                &app,
                Method::POST,
                "/api/clients",
                Some(json!({"name": format!("Client {idx:02}")})),
            )
            .await;
        }

        let (status, page) =
            call(&app, Method::GET, "/api/clients?skip=10&take=5&sort=name", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["page_number"], 3);
        assert_eq!(page["total"], 12);
        assert_eq!(page["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_missing_client() {
        let app = setup().await;
        let uri = format!("/api/clients/{}", ClientId::new());
        let (status, body) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn should_reject_malformed_id() {
        let app = setup().await;
        let (status, body) = call(&app, Method::GET, "/api/clients/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["failures"][0]["field"], "id");
    }

    #[tokio::test]
    async fn should_refuse_to_delete_the_last_setting() {
        let app = setup().await;
        let setting = app
            .settings
            .insert(Setting::new("currency", "EUR"))
            .await
            .unwrap();

        let uri = format!("/api/settings/{}", setting.id);
        let (status, body) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["failures"][0]["message"], "The last setting cannot be deleted");
        assert_eq!(app.settings.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn should_update_client_in_place() {
        let app = setup().await;
        let (_, created) =
            call(&app, Method::POST, "/api/clients", Some(json!({"name": "Acme"}))).await;
        let uri = format!("/api/clients/{}", created["id"].as_str().unwrap());

        let (status, updated) = call(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"name": "Acme Corp", "email": "billing@acme.test"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Acme Corp");
        assert_eq!(updated["created_at"], created["created_at"]);

        let (_, fetched) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(fetched["email"], "billing@acme.test");
    }

    #[tokio::test]
    async fn should_serve_budget_grid_envelope() {
        let app = setup().await;
        let (_, client) =
            call(&app, Method::POST, "/api/clients", Some(json!({"name": "Acme"}))).await;
        let budgets = [("Roof repair", 120_000), ("Roof paint", 30_000), ("Garden", 9_900)];
        for (title, amount) in budgets {
            let (status, _) = call(
                &app,
                Method::POST,
                "/api/budgets",
                Some(json!({"client_id": client["id"], "title": title, "amount_cents": amount})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, grid) = call(
            &app,
            Method::POST,
            "/api/budgets/grid",
            Some(json!({
                "draw": 7,
                "start": 0,
                "length": 1,
                "search": "roof",
                "order": [{"column": "amount_cents", "dir": "desc"}],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(grid["draw"], 7);
        assert_eq!(grid["records_total"], 3);
        assert_eq!(grid["records_filtered"], 2);
        assert_eq!(grid["page"], 1);
        assert_eq!(grid["data"][0]["title"], "Roof repair");
    }

    #[tokio::test]
    async fn should_reject_budget_for_unknown_client() {
        let app = setup().await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/budgets",
            Some(json!({"client_id": ClientId::new(), "title": "Roof", "amount_cents": 100})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["failures"][0]["field"], "client_id");
    }

    #[tokio::test]
    async fn should_list_countries_sorted_by_name() {
        let app = setup().await;
        let (status, countries) = call(&app, Method::GET, "/api/countries", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(countries[0]["code"], "BE");
        assert_eq!(countries[1]["code"], "PT");

        let (status, _) = call(&app, Method::POST, "/api/countries/refresh", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
