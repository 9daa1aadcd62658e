//! Client: a customer that budgets are drawn up for.

use serde::{Deserialize, Serialize};

use crate::audit::{Audit, SoftDelete};
use crate::entity::Entity;
use crate::id::{ClientId, UserId};
use crate::query::FieldValue;

/// A customer record. Auditable, soft-deletable, optionally owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: Option<String>,
    pub owner_id: Option<UserId>,
    #[serde(flatten)]
    pub audit: Audit,
    #[serde(flatten)]
    pub soft_delete: SoftDelete,
}

impl Client {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ClientId::new(),
            name: name.into(),
            email: None,
            owner_id: None,
            audit: Audit::default(),
            soft_delete: SoftDelete::default(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

impl Entity for Client {
    type Id = ClientId;

    const NAME: &'static str = "Client";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "owner_id",
        "created_at",
        "modified_at",
        "is_deleted",
        "deleted_at",
    ];
    const SOFT_DELETE: bool = true;

    fn id(&self) -> ClientId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "email" => Some(self.email.clone().into()),
            "owner_id" => Some(self.owner_id.into()),
            other => self
                .audit
                .field(other)
                .or_else(|| self.soft_delete.field(other)),
        }
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
