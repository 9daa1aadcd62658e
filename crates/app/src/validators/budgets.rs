//! Budget validation: title and amount rules plus an existing client.

use std::sync::Arc;

use budgetdesk_domain::budget::Budget;
use budgetdesk_domain::client::Client;
use budgetdesk_domain::error::AppError;
use budgetdesk_domain::query::QueryOptions;
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

use super::MAX_NAME_LENGTH;
use crate::ports::Repository;
use crate::requests::{Create, Update};
use crate::validation::{Rules, Validator};

/// Validates [`Create<Budget>`] and [`Update<Budget>`].
pub struct BudgetValidator<C> {
    clients: Arc<C>,
    rules: Rules<Budget>,
}

impl<C: Repository<Client> + 'static> BudgetValidator<C> {
    pub fn new(clients: Arc<C>) -> Self {
        let rules = Rules::new()
            .not_empty("title", |b: &Budget| b.title.as_str())
            .max_length("title", MAX_NAME_LENGTH, |b: &Budget| b.title.as_str())
            .positive("amount_cents", |b: &Budget| b.amount_cents);
        Self { clients, rules }
    }

    /// The referenced client must be live and visible to the caller's
    /// default filters.
    async fn check(&self, budget: &Budget) -> Result<ValidationErrors, AppError> {
        let mut errors = self.rules.check(budget);
        let client = self
            .clients
            .find(budget.client_id, QueryOptions::default())
            .await?;
        if client.is_none() {
            errors.push(ValidationFailure::new(
                "client_id",
                format!("Client '{}' does not exist", budget.client_id),
            ));
        }
        Ok(errors)
    }
}

impl<C: Repository<Client> + 'static> Validator<Create<Budget>> for BudgetValidator<C> {
    async fn validate(&self, request: &Create<Budget>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity).await
    }
}

impl<C: Repository<Client> + 'static> Validator<Update<Budget>> for BudgetValidator<C> {
    async fn validate(&self, request: &Update<Budget>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity).await
    }
}
