//! Translation of [`Filter`]s, sorts and windows into `SQLite` SQL.
//!
//! Column names are checked against a whitelist and quoted; every value is
//! bound. Comparisons are wrapped in `COALESCE(.., 0)` so a `NULL` column
//! yields false instead of `NULL`, which keeps `NOT` and the in-memory
//! evaluation in agreement.

use chrono::SecondsFormat;
use sqlx::{QueryBuilder, Sqlite};

use budgetdesk_domain::query::{Direction, FieldValue, Filter, Sort};
use budgetdesk_domain::time::Timestamp;

use crate::error::StorageError;

/// Fixed-width RFC 3339, so stored timestamps sort chronologically as text.
pub(crate) fn format_timestamp(at: Timestamp) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The columns one table lets a statement reference.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Columns {
    table: &'static str,
    names: &'static [&'static str],
}

impl Columns {
    pub(crate) fn new(table: &'static str, names: &'static [&'static str]) -> Self {
        Self { table, names }
    }

    pub(crate) fn push(
        self,
        builder: &mut QueryBuilder<'_, Sqlite>,
        column: &str,
    ) -> Result<(), StorageError> {
        if !self.names.contains(&column) {
            return Err(StorageError::UnknownColumn {
                table: self.table,
                column: column.to_string(),
            });
        }
        builder.push(format!("\"{column}\""));
        Ok(())
    }
}

pub(crate) fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &FieldValue) {
    match value {
        FieldValue::Null => builder.push("NULL"),
        FieldValue::Bool(flag) => builder.push_bind(i64::from(*flag)),
        FieldValue::Int(number) => builder.push_bind(*number),
        FieldValue::Uuid(uuid) => builder.push_bind(uuid.to_string()),
        FieldValue::Timestamp(at) => builder.push_bind(format_timestamp(*at)),
        FieldValue::Text(text) => builder.push_bind(text.clone()),
    };
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn push_null_check(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: Columns,
    field: &str,
    check: &str,
) -> Result<(), StorageError> {
    columns.push(builder, field)?;
    builder.push(check);
    Ok(())
}

fn push_compare(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: Columns,
    field: &str,
    operator: &str,
    value: &FieldValue,
) -> Result<(), StorageError> {
    builder.push("COALESCE(");
    columns.push(builder, field)?;
    builder.push(format!(" {operator} "));
    push_value(builder, value);
    builder.push(", 0)");
    Ok(())
}

fn push_like(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: Columns,
    field: &str,
    pattern: String,
) -> Result<(), StorageError> {
    builder.push("COALESCE(");
    columns.push(builder, field)?;
    builder.push(" LIKE ");
    builder.push_bind(pattern);
    builder.push(" ESCAPE '\\', 0)");
    Ok(())
}

fn push_joined(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: Columns,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) -> Result<(), StorageError> {
    if filters.is_empty() {
        builder.push(empty);
        return Ok(());
    }
    builder.push("(");
    for (idx, filter) in filters.iter().enumerate() {
        if idx > 0 {
            builder.push(separator);
        }
        push_filter(builder, columns, filter)?;
    }
    builder.push(")");
    Ok(())
}

/// Append `filter` as a boolean SQL expression.
pub(crate) fn push_filter(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: Columns,
    filter: &Filter,
) -> Result<(), StorageError> {
    match filter {
        Filter::Eq { field, value } if value.is_null() => {
            push_null_check(builder, columns, field, " IS NULL")?;
        }
        Filter::Ne { field, value } if value.is_null() => {
            push_null_check(builder, columns, field, " IS NOT NULL")?;
        }
        Filter::IsNull { field } => push_null_check(builder, columns, field, " IS NULL")?,
        Filter::NotNull { field } => push_null_check(builder, columns, field, " IS NOT NULL")?,
        Filter::Eq { field, value } => push_compare(builder, columns, field, "=", value)?,
        Filter::Ne { field, value } => push_compare(builder, columns, field, "<>", value)?,
        Filter::Lt { field, value } => push_compare(builder, columns, field, "<", value)?,
        Filter::Le { field, value } => push_compare(builder, columns, field, "<=", value)?,
        Filter::Gt { field, value } => push_compare(builder, columns, field, ">", value)?,
        Filter::Ge { field, value } => push_compare(builder, columns, field, ">=", value)?,
        Filter::Contains { field, value } => {
            push_like(builder, columns, field, format!("%{}%", escape_like(value)))?;
        }
        Filter::StartsWith { field, value } => {
            push_like(builder, columns, field, format!("{}%", escape_like(value)))?;
        }
        Filter::In { field, values } => {
            if values.is_empty() {
                builder.push("0");
            } else {
                builder.push("COALESCE(");
                columns.push(builder, field)?;
                builder.push(" IN (");
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        builder.push(", ");
                    }
                    push_value(builder, value);
                }
                builder.push("), 0)");
            }
        }
        Filter::And { filters } => push_joined(builder, columns, filters, " AND ", "1")?,
        Filter::Or { filters } => push_joined(builder, columns, filters, " OR ", "0")?,
        Filter::Not { filter } => {
            builder.push("NOT (");
            push_filter(builder, columns, filter)?;
            builder.push(")");
        }
    }
    Ok(())
}

/// Append `ORDER BY`, always ending with `rowid` so ties keep insertion order.
pub(crate) fn push_order(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: Columns,
    sort: &[Sort],
) -> Result<(), StorageError> {
    builder.push(" ORDER BY ");
    for key in sort {
        columns.push(builder, &key.field)?;
        builder.push(match key.direction {
            Direction::Asc => " ASC, ",
            Direction::Desc => " DESC, ",
        });
    }
    builder.push("rowid");
    Ok(())
}

/// Append `LIMIT`/`OFFSET`. A missing `take` means no limit.
pub(crate) fn push_window(builder: &mut QueryBuilder<'_, Sqlite>, skip: u64, take: Option<u64>) {
    let skip = i64::try_from(skip).unwrap_or(i64::MAX);
    match take {
        Some(take) => {
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(take).unwrap_or(i64::MAX));
        }
        None if skip > 0 => {
            builder.push(" LIMIT -1");
        }
        None => return,
    }
    builder.push(" OFFSET ");
    builder.push_bind(skip);
}
