//! Mapping between domain entities and their `SQLite` tables.
//!
//! Column names match [`Entity::FIELDS`] one to one, so writes are generated
//! from [`Entity::field`]; only decoding a row is entity-specific.

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use budgetdesk_domain::audit::{Audit, SoftDelete};
use budgetdesk_domain::entity::Entity;
use budgetdesk_domain::time::Timestamp;

use crate::error::StorageError;

/// An entity stored in its own table.
pub trait SqlTable: Entity {
    /// Table name. Never user-supplied.
    const TABLE: &'static str;

    /// Relations [`SqlTable::load_include`] can populate.
    const INCLUDES: &'static [&'static str] = &[];

    /// Decode one `SELECT *` row.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if a column is missing or malformed.
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;

    /// Populate `relation` on every row of a result set.
    fn load_include(
        _pool: &SqlitePool,
        _relation: &str,
        _rows: &mut [Self],
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        async { Ok(()) }
    }
}

fn decode_error(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

/// Read a UUID key stored as text.
pub(crate) fn get_id<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(decode_error)
}

pub(crate) fn get_opt_id<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| T::from_str(&raw).map_err(decode_error))
        .transpose()
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, sqlx::Error> {
    Ok(chrono::DateTime::parse_from_rfc3339(raw)
        .map_err(decode_error)?
        .to_utc())
}

pub(crate) fn get_timestamp(row: &SqliteRow, column: &str) -> Result<Timestamp, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(&raw)
}

pub(crate) fn get_opt_timestamp(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Timestamp>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.as_deref().map(parse_timestamp).transpose()
}

pub(crate) fn get_audit(row: &SqliteRow) -> Result<Audit, sqlx::Error> {
    Ok(Audit {
        created_at: get_timestamp(row, "created_at")?,
        modified_at: get_opt_timestamp(row, "modified_at")?,
    })
}

pub(crate) fn get_soft_delete(row: &SqliteRow) -> Result<SoftDelete, sqlx::Error> {
    Ok(SoftDelete {
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: get_opt_timestamp(row, "deleted_at")?,
    })
}
