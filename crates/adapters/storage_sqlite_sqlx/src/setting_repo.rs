//! `settings` table.

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use budgetdesk_domain::setting::Setting;

use crate::repository::SqliteRepository;
use crate::table::{SqlTable, get_audit, get_id};

/// `SQLite`-backed setting repository.
pub type SqliteSettingRepository = SqliteRepository<Setting>;

impl SqlTable for Setting {
    const TABLE: &'static str = "settings";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_id(row, "id")?,
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            is_default: row.try_get("is_default")?,
            audit: get_audit(row)?,
        })
    }
}
