//! Repository, mediator and router construction for one database.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use budgetdesk_adapter_http_axum::router;
use budgetdesk_adapter_http_axum::state::AppState;
use budgetdesk_adapter_storage_sqlite_sqlx::{
    Database, SqliteBudgetRepository, SqliteClientRepository, SqliteCountryRepository,
    SqliteSettingRepository, SqliteUserRepository,
};
use budgetdesk_app::cache::CacheProvider;
use budgetdesk_app::mediator::{Mediator, MediatorError};
use budgetdesk_app::requests::countries::{CountriesHandler, ListCountries, RefreshCountries};
use budgetdesk_app::requests::register_crud;
use budgetdesk_app::validators::register_validators;
use budgetdesk_domain::budget::Budget;
use budgetdesk_domain::client::Client;
use budgetdesk_domain::setting::Setting;
use budgetdesk_domain::user::User;

use crate::config::Config;

/// Everything a running server owns.
pub struct App {
    pub router: Router,
    pub cache: Arc<CacheProvider>,
    pub database: Database,
}

/// Register every handler and validator against `SQLite` repositories.
///
/// # Errors
///
/// Returns [`MediatorError`] if a request type ends up with two handlers or
/// with validators but no handler.
pub fn build_mediator(
    database: &Database,
    cache: Arc<CacheProvider>,
    slow_request_threshold: Duration,
) -> Result<Mediator, MediatorError> {
    let pool = database.pool();
    let users = Arc::new(SqliteUserRepository::new(pool.clone()));
    let clients = Arc::new(SqliteClientRepository::new(pool.clone()));
    let budgets = Arc::new(SqliteBudgetRepository::new(pool.clone()));
    let settings = Arc::new(SqliteSettingRepository::new(pool.clone()));
    let countries = CountriesHandler::new(
        Arc::new(SqliteCountryRepository::new(pool.clone())),
        cache,
    );

    let builder = Mediator::builder().slow_request_threshold(slow_request_threshold);
    let builder = register_crud::<User, _>(builder, Arc::clone(&users));
    let builder = register_crud::<Client, _>(builder, Arc::clone(&clients));
    let builder = register_crud::<Budget, _>(builder, Arc::clone(&budgets));
    let builder = register_crud::<Setting, _>(builder, Arc::clone(&settings));
    register_validators(builder, &users, &clients, &budgets, &settings)
        .handler::<ListCountries, _>(countries.clone())
        .handler::<RefreshCountries, _>(countries)
        .build()
}

/// Open the configured database and assemble the router over it.
///
/// # Errors
///
/// Fails if the configuration names no usable connection string, the
/// database cannot be opened or migrated, or the mediator is misconfigured.
pub async fn build(config: &Config) -> anyhow::Result<App> {
    let database = budgetdesk_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url()?.to_string(),
    }
    .build()
    .await?;

    let cache = Arc::new(CacheProvider::new(config.cache_config()));
    let mediator = build_mediator(
        &database,
        Arc::clone(&cache),
        config.slow_request_threshold(),
    )?;
    tracing::debug!("mediator ready");

    Ok(App {
        router: router::build(AppState::new(mediator)),
        cache,
        database,
    })
}
