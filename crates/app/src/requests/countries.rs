//! Country reference data, served through the cache provider.

use std::sync::Arc;
use std::time::Duration;

use budgetdesk_domain::country::Country;
use budgetdesk_domain::error::AppError;
use budgetdesk_domain::query::QuerySpec;

use crate::cache::CacheProvider;
use crate::mediator::{Handler, Request};
use crate::ports::Repository;

/// Cache key holding every country, sorted by name.
pub const COUNTRIES_CACHE_KEY: &str = "countries:all";

/// Every country, sorted by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCountries;

impl Request for ListCountries {
    type Response = Arc<Vec<Country>>;
}

/// Drop the cached country list so the next read hits the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshCountries;

impl Request for RefreshCountries {
    type Response = ();
}

/// Serves [`ListCountries`] and [`RefreshCountries`].
pub struct CountriesHandler<R> {
    repo: Arc<R>,
    cache: Arc<CacheProvider>,
    ttl: Option<Duration>,
}

impl<R> Clone for CountriesHandler<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }
    }
}

impl<R: Repository<Country> + 'static> CountriesHandler<R> {
    /// Cached entries use the provider's default TTL.
    pub fn new(repo: Arc<R>, cache: Arc<CacheProvider>) -> Self {
        Self {
            repo,
            cache,
            ttl: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl<R: Repository<Country> + 'static> Handler<ListCountries> for CountriesHandler<R> {
    async fn handle(&self, _request: ListCountries) -> Result<Arc<Vec<Country>>, AppError> {
        let spec = &QuerySpec::new().order_by("name").detached();
        let repo = self.repo.as_ref();
        self.cache
            .get_or_insert_with(COUNTRIES_CACHE_KEY, self.ttl, move || async move {
                repo.list(spec).await.map(Arc::new)
            })
            .await
    }
}

impl<R: Repository<Country> + 'static> Handler<RefreshCountries> for CountriesHandler<R> {
    async fn handle(&self, _request: RefreshCountries) -> Result<(), AppError> {
        self.cache.invalidate(COUNTRIES_CACHE_KEY).await;
        Ok(())
    }
}
