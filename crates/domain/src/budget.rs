//! Budget: a priced proposal drawn up for a client.

use serde::{Deserialize, Serialize};

use crate::audit::{Audit, SoftDelete};
use crate::client::Client;
use crate::entity::Entity;
use crate::id::{BudgetId, ClientId, UserId};
use crate::query::FieldValue;

/// Relation name for eager-loading [`Budget::client`].
pub const INCLUDE_CLIENT: &str = "client";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub client_id: ClientId,
    pub title: String,
    /// Total in minor currency units.
    pub amount_cents: i64,
    pub owner_id: Option<UserId>,
    #[serde(flatten)]
    pub audit: Audit,
    #[serde(flatten)]
    pub soft_delete: SoftDelete,
    /// Populated only when the read asked for [`INCLUDE_CLIENT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
}

impl Budget {
    #[must_use]
    pub fn new(client_id: ClientId, title: impl Into<String>, amount_cents: i64) -> Self {
        Self {
            id: BudgetId::new(),
            client_id,
            title: title.into(),
            amount_cents,
            owner_id: None,
            audit: Audit::default(),
            soft_delete: SoftDelete::default(),
            client: None,
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

impl Entity for Budget {
    type Id = BudgetId;

    const NAME: &'static str = "Budget";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "client_id",
        "title",
        "amount_cents",
        "owner_id",
        "created_at",
        "modified_at",
        "is_deleted",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn id(&self) -> BudgetId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "client_id" => Some(self.client_id.into()),
            "title" => Some(self.title.as_str().into()),
            "amount_cents" => Some(self.amount_cents.into()),
            "owner_id" => Some(self.owner_id.into()),
            other => self
                .audit
                .field(other)
                .or_else(|| self.soft_delete.field(other)),
        }
    }

    fn prepare_for_save(&mut self) {
        self.client = None;
    }

    fn audit(&self) -> Option<&Audit> {
        Some(&self.audit)
    }

    fn audit_mut(&mut self) -> Option<&mut Audit> {
        Some(&mut self.audit)
    }

    fn soft_delete(&self) -> Option<&SoftDelete> {
        Some(&self.soft_delete)
    }

    fn soft_delete_mut(&mut self) -> Option<&mut SoftDelete> {
        Some(&mut self.soft_delete)
    }
}
