//! `users` table.

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use budgetdesk_domain::user::User;

use crate::repository::SqliteRepository;
use crate::table::{SqlTable, get_audit, get_id};

/// `SQLite`-backed user repository.
pub type SqliteUserRepository = SqliteRepository<User>;

impl SqlTable for User {
    const TABLE: &'static str = "users";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_id(row, "id")?,
            user_name: row.try_get("user_name")?,
            email: row.try_get("email")?,
            normalized_email: row.try_get("normalized_email")?,
            audit: get_audit(row)?,
        })
    }
}
