//! Budget resource.

use serde::Deserialize;

use budgetdesk_domain::budget::Budget;
use budgetdesk_domain::id::{ClientId, UserId};

use crate::api::crud::Resource;

/// Request body for creating or updating a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetBody {
    pub client_id: ClientId,
    pub title: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

impl Resource for Budget {
    type Body = BudgetBody;

    const SEARCH_FIELDS: &'static [&'static str] = &["title"];

    fn from_body(body: BudgetBody) -> Self {
        let mut budget = Budget::new(body.client_id, body.title, body.amount_cents);
        budget.owner_id = body.owner_id;
        budget
    }

    fn apply(&mut self, body: BudgetBody) {
        self.client_id = body.client_id;
        self.title = body.title;
        self.amount_cents = body.amount_cents;
        self.owner_id = body.owner_id;
    }
}
