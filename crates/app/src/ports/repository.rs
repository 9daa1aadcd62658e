//! Generic repository port: CRUD and specification-driven reads for any
//! [`Entity`].

use std::future::Future;

use budgetdesk_domain::entity::Entity;
use budgetdesk_domain::error::AppError;
use budgetdesk_domain::query::{Page, Projection, QueryOptions, QuerySpec, project, unknown_field};
use budgetdesk_domain::validation::ValidationErrors;

/// Persistence for one entity type.
///
/// Reads never mutate. Every write persists immediately and is the only
/// place audit and soft-delete parts are stamped:
/// - `insert` sets `created_at` and clears `modified_at`;
/// - `update` sets `modified_at` and keeps the stored `created_at`;
/// - `delete` flips the soft-delete marker when `E::SOFT_DELETE`, otherwise
///   removes the row.
///
/// Store failures propagate as [`AppError::Storage`] without retry.
pub trait Repository<E: Entity>: Send + Sync {
    /// Look up one row by key, honoring the default filters unless relaxed
    /// by `options`.
    fn find(
        &self,
        id: E::Id,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Option<E>, AppError>> + Send;

    /// Rows matching `spec`, sorted, windowed, with includes loaded.
    fn list(&self, spec: &QuerySpec) -> impl Future<Output = Result<Vec<E>, AppError>> + Send;

    /// Number of rows matching `spec`'s filter, ignoring its window.
    fn count(&self, spec: &QuerySpec) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Persist a new row.
    fn insert(&self, entity: E) -> impl Future<Output = Result<E, AppError>> + Send;

    /// Overwrite an existing row. Fails with `NotFound` if the key is absent.
    fn update(&self, entity: E) -> impl Future<Output = Result<E, AppError>> + Send;

    /// Delete (soft or hard, per `E::SOFT_DELETE`) a visible row.
    /// Fails with `NotFound` if no visible row has this key.
    fn delete(&self, id: E::Id) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Remove a row for good, regardless of soft-delete support or filters.
    fn purge(&self, id: E::Id) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Whether any row matches `spec`.
    fn exists(&self, spec: &QuerySpec) -> impl Future<Output = Result<bool, AppError>> + Send {
        async move { Ok(self.count(spec).await? > 0) }
    }

    /// A window of rows plus the total count and derived page number.
    fn page(&self, spec: &QuerySpec) -> impl Future<Output = Result<Page<E>, AppError>> + Send {
        async move {
            let items = self.list(spec).await?;
            let total = self.count(&spec.without_window()).await?;
            Ok(Page::new(items, total, spec))
        }
    }

    /// Project the named `fields` out of every row matching `spec`.
    fn select(
        &self,
        spec: &QuerySpec,
        fields: &[String],
    ) -> impl Future<Output = Result<Vec<Projection>, AppError>> + Send {
        async move {
            check_selected::<E>(fields)?;
            let rows = self.list(spec).await?;
            Ok(rows.iter().map(|row| project(row, fields)).collect())
        }
    }
}

fn check_selected<E: Entity>(fields: &[String]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for field in fields.iter().filter(|field| !E::has_field(field)) {
        errors.push(unknown_field::<E>(field));
    }
    errors.into_result()
}
