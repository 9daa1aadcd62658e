//! `budgets` table, with the `client` relation loadable on demand.

use std::collections::{HashMap, HashSet};

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use budgetdesk_domain::budget::{Budget, INCLUDE_CLIENT};
use budgetdesk_domain::client::Client;
use budgetdesk_domain::id::ClientId;

use crate::error::StorageError;
use crate::repository::SqliteRepository;
use crate::table::{SqlTable, get_audit, get_id, get_opt_id, get_soft_delete};

/// `SQLite`-backed budget repository.
pub type SqliteBudgetRepository = SqliteRepository<Budget>;

impl SqlTable for Budget {
    const TABLE: &'static str = "budgets";
    const INCLUDES: &'static [&'static str] = &[INCLUDE_CLIENT];

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_id(row, "id")?,
            client_id: get_id(row, "client_id")?,
            title: row.try_get("title")?,
            amount_cents: row.try_get("amount_cents")?,
            owner_id: get_opt_id(row, "owner_id")?,
            audit: get_audit(row)?,
            soft_delete: get_soft_delete(row)?,
            client: None,
        })
    }

    /// Loads referenced clients in one query, deleted ones included.
    async fn load_include(
        pool: &SqlitePool,
        relation: &str,
        rows: &mut [Self],
    ) -> Result<(), StorageError> {
        if relation != INCLUDE_CLIENT || rows.is_empty() {
            return Ok(());
        }

        let ids: HashSet<ClientId> = rows.iter().map(|budget| budget.client_id).collect();
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT * FROM \"clients\" WHERE \"id\" IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let clients = builder
            .build()
            .fetch_all(pool)
            .await?
            .iter()
            .map(Client::from_row)
            .map(|client| client.map(|client| (client.id, client)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        for budget in rows {
            budget.client = clients.get(&budget.client_id).cloned();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_repo::SqliteClientRepository;
    use crate::pool::Config;
    use budgetdesk_app::ports::Repository;
    use budgetdesk_domain::error::AppError;
    use budgetdesk_domain::query::{Filter, QuerySpec};

    async fn setup() -> (SqliteBudgetRepository, SqliteClientRepository) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        (
            SqliteBudgetRepository::new(db.pool().clone()),
            SqliteClientRepository::new(db.pool().clone()),
        )
    }

    #[tokio::test]
    async fn should_load_client_only_when_included() {
        let (budgets, clients) = setup().await;
        let acme = clients.insert(Client::new("Acme")).await.unwrap();
        let globex = clients.insert(Client::new("Globex")).await.unwrap();
        budgets.insert(Budget::new(acme.id, "Website", 120_000)).await.unwrap();
        budgets.insert(Budget::new(globex.id, "Audit", 45_000)).await.unwrap();

        let plain = budgets.list(&QuerySpec::new()).await.unwrap();
        assert!(plain.iter().all(|budget| budget.client.is_none()));

        let loaded = budgets
            .list(&QuerySpec::new().include(INCLUDE_CLIENT).order_by("title"))
            .await
            .unwrap();
        let pairs: Vec<(&str, &str)> = loaded
            .iter()
            .map(|b| (b.title.as_str(), b.client.as_ref().unwrap().name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Audit", "Globex"), ("Website", "Acme")]);
    }

    #[tokio::test]
    async fn should_not_persist_included_client() {
        let (budgets, clients) = setup().await;
        let acme = clients.insert(Client::new("Acme")).await.unwrap();
        let mut budget = Budget::new(acme.id, "Website", 120_000);
        budget.client = Some(acme);

        let stored = budgets.insert(budget).await.unwrap();
        assert!(stored.client.is_none());
    }

    #[tokio::test]
    async fn should_reject_unknown_include() {
        let (budgets, _clients) = setup().await;
        let result = budgets.list(&QuerySpec::new().include("owner")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn should_compare_amounts_numerically() {
        let (budgets, clients) = setup().await;
        let acme = clients.insert(Client::new("Acme")).await.unwrap();
        for amount in [900, 10_000, 100] {
            budgets
                .insert(Budget::new(acme.id, format!("B{amount}"), amount))
                .await
                .unwrap();
        }

        let spec = QuerySpec::new()
            .filter(Filter::ge("amount_cents", 900_i64))
            .order_by("amount_cents");
        let amounts: Vec<i64> = budgets
            .list(&spec)
            .await
            .unwrap()
            .iter()
            .map(|b| b.amount_cents)
            .collect();
        assert_eq!(amounts, vec![900, 10_000]);
    }

    #[tokio::test]
    async fn should_surface_foreign_key_violation_as_storage_error() {
        let (budgets, _clients) = setup().await;
        let result = budgets
            .insert(Budget::new(ClientId::new(), "Orphan", 100))
            .await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
