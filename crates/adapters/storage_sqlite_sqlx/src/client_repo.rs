//! `clients` table.

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use budgetdesk_domain::client::Client;

use crate::repository::SqliteRepository;
use crate::table::{SqlTable, get_audit, get_id, get_opt_id, get_soft_delete};

/// `SQLite`-backed client repository.
pub type SqliteClientRepository = SqliteRepository<Client>;

impl SqlTable for Client {
    const TABLE: &'static str = "clients";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_id(row, "id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            owner_id: get_opt_id(row, "owner_id")?,
            audit: get_audit(row)?,
            soft_delete: get_soft_delete(row)?,
        })
    }
}
