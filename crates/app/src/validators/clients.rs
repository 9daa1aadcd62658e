//! Client validation: unique name among live clients, and no deleting a
//! client that still has budgets.

use std::sync::Arc;

use budgetdesk_domain::budget::Budget;
use budgetdesk_domain::client::Client;
use budgetdesk_domain::error::AppError;
use budgetdesk_domain::id::ClientId;
use budgetdesk_domain::query::{Filter, QuerySpec};
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

use super::MAX_NAME_LENGTH;
use crate::ports::Repository;
use crate::requests::{Create, Delete, Update};
use crate::validation::{Rules, Validator};

/// Validates [`Create<Client>`] and [`Update<Client>`].
pub struct ClientValidator<R> {
    clients: Arc<R>,
    rules: Rules<Client>,
}

impl<R: Repository<Client> + 'static> ClientValidator<R> {
    pub fn new(clients: Arc<R>) -> Self {
        let rules = Rules::new()
            .not_empty("name", |c: &Client| c.name.as_str())
            .max_length("name", MAX_NAME_LENGTH, |c: &Client| c.name.as_str())
            .email("email", |c: &Client| c.email.as_deref());
        Self { clients, rules }
    }

    async fn check(
        &self,
        client: &Client,
        current: Option<ClientId>,
    ) -> Result<ValidationErrors, AppError> {
        let mut errors = self.rules.check(client);
        if errors.failures().iter().any(|f| f.field == "name") {
            return Ok(errors);
        }

        // Owner scoping must not hide a clash, but deleted clients free their name.
        let mut filter =
            Filter::eq("name", client.name.trim()).and(Filter::eq("is_deleted", false));
        if let Some(id) = current {
            filter = filter.and(Filter::ne("id", id));
        }
        let spec = QuerySpec::new().filter(filter).ignore_query_filters();
        if self.clients.exists(&spec).await? {
            errors.push(ValidationFailure::new(
                "name",
                format!("Client '{}' already exists", client.name.trim()),
            ));
        }
        Ok(errors)
    }
}

impl<R: Repository<Client> + 'static> Validator<Create<Client>> for ClientValidator<R> {
    async fn validate(&self, request: &Create<Client>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity, None).await
    }
}

impl<R: Repository<Client> + 'static> Validator<Update<Client>> for ClientValidator<R> {
    async fn validate(&self, request: &Update<Client>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity, Some(request.entity.id)).await
    }
}

/// Rejects [`Delete<Client>`] while live budgets reference the client.
pub struct DeleteClientValidator<B> {
    budgets: Arc<B>,
}

impl<B: Repository<Budget> + 'static> DeleteClientValidator<B> {
    pub fn new(budgets: Arc<B>) -> Self {
        Self { budgets }
    }
}

impl<B: Repository<Budget> + 'static> Validator<Delete<Client>> for DeleteClientValidator<B> {
    async fn validate(&self, request: &Delete<Client>) -> Result<ValidationErrors, AppError> {
        let spec = QuerySpec::new()
            .filter(Filter::eq("client_id", request.id).and(Filter::eq("is_deleted", false)))
            .ignore_query_filters();
        let budgets = self.budgets.count(&spec).await?;
        if budgets == 0 {
            return Ok(ValidationErrors::new());
        }
        Ok(ValidationErrors::single(
            "id",
            format!("Client still has {budgets} budget(s) and cannot be deleted"),
        ))
    }
}
