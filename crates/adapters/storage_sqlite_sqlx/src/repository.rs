//! Generic `SQLite` implementation of [`Repository`].

use std::marker::PhantomData;

use chrono::SubsecRound;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use budgetdesk_app::ports::Repository;
use budgetdesk_domain::error::{AppError, NotFoundError};
use budgetdesk_domain::query::{FieldValue, Filter, QueryOptions, QuerySpec};
use budgetdesk_domain::time::{Timestamp, now};
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

use crate::error::StorageError;
use crate::sql::{Columns, format_timestamp, push_filter, push_order, push_value, push_window};
use crate::table::SqlTable;

/// Columns an update never writes: the key, and the parts only insert and
/// delete may stamp.
const WRITE_ONCE: [&str; 4] = ["id", "created_at", "is_deleted", "deleted_at"];

/// `SQLite`-backed repository for any [`SqlTable`].
pub struct SqliteRepository<E> {
    pool: SqlitePool,
    global_filters: Vec<Filter>,
    entity: PhantomData<fn() -> E>,
}

impl<E: SqlTable> SqliteRepository<E> {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            global_filters: Vec::new(),
            entity: PhantomData,
        }
    }

    /// Add a default filter applied to every read and delete unless
    /// `ignore_query_filters` is set.
    #[must_use]
    pub fn with_global_filter(mut self, filter: Filter) -> Self {
        self.global_filters.push(filter);
        self
    }

    fn columns() -> Columns {
        Columns::new(E::TABLE, E::FIELDS)
    }

    fn select_all() -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!("SELECT * FROM \"{}\"", E::TABLE))
    }

    /// Stored timestamps carry microseconds; stamping at that precision
    /// keeps returned entities equal to what a later read yields.
    fn stamp() -> Timestamp {
        now().trunc_subsecs(6)
    }

    fn not_found(id: E::Id) -> AppError {
        NotFoundError {
            entity: E::NAME,
            id: id.to_string(),
        }
        .into()
    }

    /// Append the `WHERE` clause: soft-delete and global filters as
    /// `options` allow, then `extra`.
    fn push_conditions(
        &self,
        builder: &mut QueryBuilder<'_, Sqlite>,
        options: QueryOptions,
        extra: Option<&Filter>,
    ) -> Result<(), StorageError> {
        let mut conditions = Vec::new();
        if E::SOFT_DELETE && options.hides_deleted() {
            conditions.push(Filter::eq("is_deleted", false));
        }
        if options.applies_global_filters() {
            conditions.extend(self.global_filters.iter().cloned());
        }
        conditions.extend(extra.cloned());
        if conditions.is_empty() {
            return Ok(());
        }
        builder.push(" WHERE ");
        push_filter(builder, Self::columns(), &Filter::And { filters: conditions })
    }

    fn check_includes(spec: &QuerySpec) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for relation in spec
            .includes
            .iter()
            .filter(|relation| !E::INCLUDES.contains(&relation.as_str()))
        {
            errors.push(ValidationFailure::new(
                relation.clone(),
                format!("is not an includable relation of {}", E::NAME),
            ));
        }
        errors.into_result()
    }

    async fn fetch_all(
        &self,
        mut builder: QueryBuilder<'_, Sqlite>,
    ) -> Result<Vec<E>, StorageError> {
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(E::from_row).collect::<Result<Vec<_>, _>>()?)
    }
}

impl<E: SqlTable> Repository<E> for SqliteRepository<E> {
    async fn find(&self, id: E::Id, options: QueryOptions) -> Result<Option<E>, AppError> {
        let mut builder = Self::select_all();
        self.push_conditions(&mut builder, options, Some(&Filter::eq("id", id)))?;
        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        let entity = row
            .as_ref()
            .map(E::from_row)
            .transpose()
            .map_err(StorageError::from)?;
        Ok(entity)
    }

    async fn list(&self, spec: &QuerySpec) -> Result<Vec<E>, AppError> {
        spec.check_fields::<E>()?;
        Self::check_includes(spec)?;

        let mut builder = Self::select_all();
        self.push_conditions(&mut builder, spec.options, spec.filter.as_ref())?;
        push_order(&mut builder, Self::columns(), &spec.sort)?;
        push_window(&mut builder, spec.skip, spec.take);
        tracing::trace!(table = E::TABLE, sql = builder.sql(), "list");

        let mut rows = self.fetch_all(builder).await?;
        for relation in &spec.includes {
            E::load_include(&self.pool, relation, &mut rows).await?;
        }
        Ok(rows)
    }

    async fn count(&self, spec: &QuerySpec) -> Result<u64, AppError> {
        spec.check_fields::<E>()?;

        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM \"{}\"", E::TABLE));
        self.push_conditions(&mut builder, spec.options, spec.filter.as_ref())?;
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert(&self, mut entity: E) -> Result<E, AppError> {
        entity.prepare_for_save();
        if let Some(audit) = entity.audit_mut() {
            audit.mark_created(Self::stamp());
        }
        if let Some(marker) = entity.soft_delete_mut() {
            marker.restore();
        }

        let column_list = E::FIELDS
            .iter()
            .map(|column| format!("\"{column}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let mut builder =
            QueryBuilder::new(format!("INSERT INTO \"{}\" ({column_list}) VALUES (", E::TABLE));
        for (idx, column) in E::FIELDS.iter().enumerate() {
            if idx > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, &entity.field(column).unwrap_or(FieldValue::Null));
        }
        builder.push(")");

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        tracing::debug!(table = E::TABLE, id = %entity.id(), "row inserted");

        Ok(entity)
    }

    /// Writes every mutable column and returns the stored row, so the
    /// result carries the original `created_at` and soft-delete marker.
    async fn update(&self, mut entity: E) -> Result<E, AppError> {
        entity.prepare_for_save();
        if let Some(audit) = entity.audit_mut() {
            audit.mark_modified(Self::stamp());
        }

        let id = entity.id();
        let mut builder = QueryBuilder::new(format!("UPDATE \"{}\" SET ", E::TABLE));
        let mutable = E::FIELDS.iter().filter(|column| !WRITE_ONCE.contains(*column));
        for (idx, column) in mutable.enumerate() {
            if idx > 0 {
                builder.push(", ");
            }
            builder.push(format!("\"{column}\" = "));
            push_value(&mut builder, &entity.field(column).unwrap_or(FieldValue::Null));
        }
        builder.push(" WHERE \"id\" = ");
        push_value(&mut builder, &id.into());
        builder.push(" RETURNING *");

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?
            .ok_or_else(|| Self::not_found(id))?;
        tracing::debug!(table = E::TABLE, id = %id, "row updated");

        Ok(E::from_row(&row).map_err(StorageError::from)?)
    }

    async fn delete(&self, id: E::Id) -> Result<(), AppError> {
        let mut builder = if E::SOFT_DELETE {
            let mut builder = QueryBuilder::new(format!(
                "UPDATE \"{}\" SET \"is_deleted\" = 1, \"deleted_at\" = ",
                E::TABLE
            ));
            builder.push_bind(format_timestamp(Self::stamp()));
            builder
        } else {
            QueryBuilder::new(format!("DELETE FROM \"{}\"", E::TABLE))
        };
        self.push_conditions(
            &mut builder,
            QueryOptions::default(),
            Some(&Filter::eq("id", id)),
        )?;

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        tracing::debug!(table = E::TABLE, id = %id, soft = E::SOFT_DELETE, "row deleted");
        Ok(())
    }

    async fn purge(&self, id: E::Id) -> Result<(), AppError> {
        let mut builder =
            QueryBuilder::new(format!("DELETE FROM \"{}\" WHERE \"id\" = ", E::TABLE));
        push_value(&mut builder, &id.into());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        tracing::debug!(table = E::TABLE, id = %id, "row purged");
        Ok(())
    }
}
