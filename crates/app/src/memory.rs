//! In-process [`Repository`] backed by a vector.
//!
//! Evaluates the same [`QuerySpec`] semantics as the SQL adapter, so use-case
//! tests and demos can run without a database.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use budgetdesk_domain::entity::Entity;
use budgetdesk_domain::error::{AppError, NotFoundError};
use budgetdesk_domain::query::{Filter, QueryOptions, QuerySpec};
use budgetdesk_domain::time::now;
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

use crate::ports::Repository;

/// Loads one named relation into a batch of rows.
pub type IncludeLoader<E> = Arc<dyn Fn(&mut [E]) -> Result<(), AppError> + Send + Sync>;

/// Errors raised by the in-memory store itself.
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    /// A row with the same key already exists.
    #[error("duplicate key {0}")]
    DuplicateKey(String),
}

impl From<MemoryStoreError> for AppError {
    fn from(err: MemoryStoreError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Vector-backed repository. Rows keep insertion order.
pub struct InMemoryRepository<E: Entity> {
    rows: Mutex<Vec<E>>,
    global_filters: Vec<Filter>,
    includes: HashMap<String, IncludeLoader<E>>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            global_filters: Vec::new(),
            includes: HashMap::new(),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default filter applied to every read unless
    /// `ignore_query_filters` is set.
    #[must_use]
    pub fn with_global_filter(mut self, filter: Filter) -> Self {
        self.global_filters.push(filter);
        self
    }

    /// Register the loader for an includable relation.
    #[must_use]
    pub fn with_include(
        mut self,
        relation: impl Into<String>,
        loader: impl Fn(&mut [E]) -> Result<(), AppError> + Send + Sync + 'static,
    ) -> Self {
        self.includes.insert(relation.into(), Arc::new(loader));
        self
    }

    /// Clone every stored row, deleted ones included.
    #[must_use]
    pub fn snapshot(&self) -> Vec<E> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<E>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_visible(&self, row: &E, options: QueryOptions) -> bool {
        if options.hides_deleted() && row.is_deleted() {
            return false;
        }
        !options.applies_global_filters() || self.global_filters.iter().all(|f| f.matches(row))
    }

    fn visible(&self, options: QueryOptions) -> Vec<E> {
        self.lock()
            .iter()
            .filter(|row| self.is_visible(row, options))
            .cloned()
            .collect()
    }

    fn check_includes(&self, spec: &QuerySpec) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for relation in spec
            .includes
            .iter()
            .filter(|relation| !self.includes.contains_key(relation.as_str()))
        {
            errors.push(ValidationFailure::new(
                relation.clone(),
                format!("is not an includable relation of {}", E::NAME),
            ));
        }
        errors.into_result()
    }

    fn not_found(id: E::Id) -> AppError {
        NotFoundError {
            entity: E::NAME,
            id: id.to_string(),
        }
        .into()
    }

    fn list_sync(&self, spec: &QuerySpec) -> Result<Vec<E>, AppError> {
        spec.check_fields::<E>()?;
        self.check_includes(spec)?;
        let visible = self.visible(spec.options);
        let mut rows = spec.apply(&visible);
        for relation in &spec.includes {
            if let Some(loader) = self.includes.get(relation) {
                loader(&mut rows)?;
            }
        }
        Ok(rows)
    }

    fn count_sync(&self, spec: &QuerySpec) -> Result<u64, AppError> {
        spec.check_fields::<E>()?;
        let visible = self.visible(spec.options);
        let matched = spec.without_window().apply(&visible).len();
        Ok(u64::try_from(matched).unwrap_or(u64::MAX))
    }

    fn insert_sync(&self, mut entity: E) -> Result<E, AppError> {
        let mut rows = self.lock();
        let id = entity.id();
        if rows.iter().any(|row| row.id() == id) {
            return Err(MemoryStoreError::DuplicateKey(id.to_string()).into());
        }
        entity.prepare_for_save();
        if let Some(audit) = entity.audit_mut() {
            audit.mark_created(now());
        }
        if let Some(marker) = entity.soft_delete_mut() {
            marker.restore();
        }
        rows.push(entity.clone());
        Ok(entity)
    }

    fn update_sync(&self, mut entity: E) -> Result<E, AppError> {
        let mut rows = self.lock();
        let id = entity.id();
        let Some(stored) = rows.iter_mut().find(|row| row.id() == id) else {
            return Err(Self::not_found(id));
        };
        entity.prepare_for_save();
        if let (Some(audit), Some(previous)) = (entity.audit_mut(), stored.audit()) {
            audit.created_at = previous.created_at;
            audit.mark_modified(now());
        }
        if let (Some(marker), Some(previous)) = (entity.soft_delete_mut(), stored.soft_delete()) {
            *marker = *previous;
        }
        *stored = entity.clone();
        Ok(entity)
    }

    fn delete_sync(&self, id: E::Id) -> Result<(), AppError> {
        let mut rows = self.lock();
        let position = rows
            .iter()
            .position(|row| row.id() == id && self.is_visible(row, QueryOptions::default()))
            .ok_or_else(|| Self::not_found(id))?;

        if E::SOFT_DELETE {
            let row = &mut rows[position];
            if let Some(marker) = row.soft_delete_mut() {
                marker.mark_deleted(now());
            }
        } else {
            rows.remove(position);
        }
        Ok(())
    }

    fn purge_sync(&self, id: E::Id) -> Result<(), AppError> {
        let mut rows = self.lock();
        let position = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        rows.remove(position);
        Ok(())
    }
}

impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    fn find(
        &self,
        id: E::Id,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Option<E>, AppError>> + Send {
        let found = self
            .lock()
            .iter()
            .find(|row| row.id() == id && self.is_visible(row, options))
            .cloned();
        async { Ok(found) }
    }

    fn list(&self, spec: &QuerySpec) -> impl Future<Output = Result<Vec<E>, AppError>> + Send {
        let result = self.list_sync(spec);
        async { result }
    }

    fn count(&self, spec: &QuerySpec) -> impl Future<Output = Result<u64, AppError>> + Send {
        let result = self.count_sync(spec);
        async { result }
    }

    fn insert(&self, entity: E) -> impl Future<Output = Result<E, AppError>> + Send {
        let result = self.insert_sync(entity);
        async { result }
    }

    fn update(&self, entity: E) -> impl Future<Output = Result<E, AppError>> + Send {
        let result = self.update_sync(entity);
        async { result }
    }

    fn delete(&self, id: E::Id) -> impl Future<Output = Result<(), AppError>> + Send {
        let result = self.delete_sync(id);
        async { result }
    }

    fn purge(&self, id: E::Id) -> impl Future<Output = Result<(), AppError>> + Send {
        let result = self.purge_sync(id);
        async { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetdesk_domain::budget::{Budget, INCLUDE_CLIENT};
    use budgetdesk_domain::client::Client;
    use budgetdesk_domain::id::{ClientId, UserId};
    use budgetdesk_domain::setting::Setting;

    #[tokio::test]
    async fn should_stamp_created_at_and_leave_modified_at_unset_on_insert() {
        let repo = InMemoryRepository::<Client>::new();
        let mut client = Client::new("Acme");
        client.audit.modified_at = Some(now());

        let before = now();
        let saved = repo.insert(client).await.unwrap();
        assert!(saved.audit.created_at >= before);
        assert!(saved.audit.modified_at.is_none());
    }

    #[tokio::test]
    async fn should_set_modified_at_and_keep_created_at_on_update() {
        let repo = InMemoryRepository::<Client>::new();
        let saved = repo.insert(Client::new("Acme")).await.unwrap();
        let created_at = saved.audit.created_at;

        let mut changed = saved.clone();
        changed.name = "Acme Corp".to_string();
        changed.audit.created_at = created_at - chrono::Duration::days(30);
        let updated = repo.update(changed).await.unwrap();

        assert_eq!(updated.audit.created_at, created_at);
        assert!(updated.audit.modified_at.is_some_and(|at| at >= created_at));
        let stored = repo.find(saved.id, QueryOptions::default()).await.unwrap().unwrap();
        assert_eq!(stored.name, "Acme Corp");
        assert_eq!(stored.audit.created_at, created_at);
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_row() {
        let repo = InMemoryRepository::<Client>::new();
        let result = repo.update(Client::new("Ghost")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_reject_duplicate_keys_as_storage_error() {
        let repo = InMemoryRepository::<Client>::new();
        let client = repo.insert(Client::new("Acme")).await.unwrap();
        let result = repo.insert(client).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn should_hide_soft_deleted_rows_unless_included() {
        let repo = InMemoryRepository::<Client>::new();
        let acme = repo.insert(Client::new("Acme")).await.unwrap();
        repo.insert(Client::new("Globex")).await.unwrap();

        repo.delete(acme.id).await.unwrap();

        assert_eq!(repo.count(&QuerySpec::new()).await.unwrap(), 1);
        assert_eq!(
            repo.count(&QuerySpec::new().include_deleted()).await.unwrap(),
            2
        );
        assert!(repo.find(acme.id, QueryOptions::default()).await.unwrap().is_none());
        let deleted = repo
            .find(
                acme.id,
                QueryOptions {
                    include_deleted: true,
                    ..QueryOptions::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(deleted.soft_delete.is_deleted);
        assert!(deleted.soft_delete.deleted_at.is_some());
    }

    #[tokio::test]
    async fn should_raise_not_found_when_deleting_missing_or_already_deleted_key() {
        let repo = InMemoryRepository::<Client>::new();
        let result = repo.delete(ClientId::new()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let acme = repo.insert(Client::new("Acme")).await.unwrap();
        repo.delete(acme.id).await.unwrap();
        let again = repo.delete(acme.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_hard_delete_entities_without_soft_delete() {
        let repo = InMemoryRepository::<Setting>::new();
        let setting = repo.insert(Setting::new("theme", "dark")).await.unwrap();
        repo.delete(setting.id).await.unwrap();
        assert!(repo.snapshot().is_empty());
    }

    #[tokio::test]
    async fn should_purge_soft_deleted_rows() {
        let repo = InMemoryRepository::<Client>::new();
        let acme = repo.insert(Client::new("Acme")).await.unwrap();
        repo.delete(acme.id).await.unwrap();
        repo.purge(acme.id).await.unwrap();
        assert!(repo.snapshot().is_empty());
    }

    #[tokio::test]
    async fn should_apply_global_filters_unless_ignored() {
        let owner = UserId::new();
        let repo =
            InMemoryRepository::<Client>::new().with_global_filter(Filter::eq("owner_id", owner));
        repo.insert(Client::new("Mine").with_owner(owner)).await.unwrap();
        let theirs = repo
            .insert(Client::new("Theirs").with_owner(UserId::new()))
            .await
            .unwrap();

        let visible = repo.list(&QuerySpec::new()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Mine");

        let all = repo.list(&QuerySpec::new().ignore_query_filters()).await.unwrap();
        assert_eq!(all.len(), 2);

        // include_deleted alone does not lift global filters
        let still_scoped = repo.list(&QuerySpec::new().include_deleted()).await.unwrap();
        assert_eq!(still_scoped.len(), 1);

        assert!(matches!(
            repo.delete(theirs.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_page_with_total_and_page_number() {
        let repo = InMemoryRepository::<Client>::new();
        for idx in 0..23 {
            repo.insert(Client::new(format!("Client {idx:02}"))).await.unwrap();
        }

        let spec = QuerySpec::new().order_by("name").skip(10).take(5);
        let page = repo.page(&spec).await.unwrap();
        assert_eq!(page.page_number, 3);
        assert_eq!(page.total, 23);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].name, "Client 10");
    }

    #[tokio::test]
    async fn should_reject_unknown_includes_and_fields() {
        let repo = InMemoryRepository::<Client>::new();
        let result = repo.list(&QuerySpec::new().include("budgets")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = repo.select(&QuerySpec::new(), &["colour".to_string()]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn should_load_registered_includes() {
        let clients = Arc::new(InMemoryRepository::<Client>::new());
        let acme = clients.insert(Client::new("Acme")).await.unwrap();

        let lookup = Arc::clone(&clients);
        let budgets = InMemoryRepository::<Budget>::new().with_include(
            INCLUDE_CLIENT,
            move |rows: &mut [Budget]| {
                let known = lookup.snapshot();
                for row in rows {
                    row.client = known.iter().find(|c| c.id == row.client_id).cloned();
                }
                Ok(())
            },
        );
        budgets.insert(Budget::new(acme.id, "Website", 100)).await.unwrap();

        let plain = budgets.list(&QuerySpec::new()).await.unwrap();
        assert!(plain[0].client.is_none());

        let loaded = budgets.list(&QuerySpec::new().include(INCLUDE_CLIENT)).await.unwrap();
        assert_eq!(loaded[0].client.as_ref().map(|c| c.name.as_str()), Some("Acme"));
    }

    #[tokio::test]
    async fn should_select_projections() {
        let repo = InMemoryRepository::<Client>::new();
        repo.insert(Client::new("Acme")).await.unwrap();
        let rows = repo
            .select(&QuerySpec::new(), &["name".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0]["name"],
            budgetdesk_domain::query::FieldValue::Text("Acme".to_string())
        );
    }
}
