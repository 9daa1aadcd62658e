//! `countries` table. Seeded by the initial migration.

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use budgetdesk_domain::country::Country;

use crate::repository::SqliteRepository;
use crate::table::{SqlTable, get_id};

/// `SQLite`-backed country repository.
pub type SqliteCountryRepository = SqliteRepository<Country>;

impl SqlTable for Country {
    const TABLE: &'static str = "countries";

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_id(row, "id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use budgetdesk_app::ports::Repository;
    use budgetdesk_domain::query::{Filter, QuerySpec};

    #[tokio::test]
    async fn should_list_seeded_countries_by_name() {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let repo = SqliteCountryRepository::new(db.pool().clone());

        let countries = repo
            .list(&QuerySpec::new().order_by("name").take(3))
            .await
            .unwrap();
        let codes: Vec<&str> = countries.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["BE", "BR", "CA"]);

        let portugal = QuerySpec::new().filter(Filter::starts_with("name", "port"));
        assert_eq!(repo.count(&portugal).await.unwrap(), 1);
    }
}
