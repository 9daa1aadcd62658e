//! User: an application account.
//!
//! Password hashing, lockout and the rest of identity management are handled
//! outside this crate; a user here is the profile the rest of the domain
//! references.

use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::entity::Entity;
use crate::id::UserId;
use crate::query::FieldValue;

/// An application account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    pub email: String,
    /// Upper-cased, trimmed email. Unique across users.
    pub normalized_email: String,
    #[serde(flatten)]
    pub audit: Audit,
}

impl User {
    #[must_use]
    pub fn new(user_name: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            id: UserId::new(),
            user_name: user_name.into(),
            normalized_email: normalize_email(&email),
            email,
            audit: Audit::default(),
        }
    }
}

/// Canonical form used for email uniqueness.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_uppercase()
}

impl Entity for User {
    type Id = UserId;

    const NAME: &'static str = "User";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "user_name",
        "email",
        "normalized_email",
        "created_at",
        "modified_at",
    ];

    fn id(&self) -> UserId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "user_name" => Some(self.user_name.as_str().into()),
            "email" => Some(self.email.as_str().into()),
            "normalized_email" => Some(self.normalized_email.as_str().into()),
            other => self.audit.field(other),
        }
    }

    fn prepare_for_save(&mut self) {
        self.normalized_email = normalize_email(&self.email);
    }

    fn audit(&self) -> Option<&Audit> {
        Some(&self.audit)
    }

    fn audit_mut(&mut self) -> Option<&mut Audit> {
        Some(&mut self.audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_normalize_email_on_construction() {
        let user = User::new("ada", "  Ada@Example.org ");
        assert_eq!(user.normalized_email, "ADA@EXAMPLE.ORG");
    }

    #[test]
    fn should_refresh_normalized_email_before_save() {
        let mut user = User::new("ada", "ada@example.org");
        user.email = "Countess@Example.org".to_string();
        user.prepare_for_save();
        assert_eq!(user.normalized_email, "COUNTESS@EXAMPLE.ORG");
    }

    #[test]
    fn should_not_be_soft_deletable() {
        const { assert!(!User::SOFT_DELETE) };
        assert!(User::new("ada", "ada@example.org").soft_delete().is_none());
    }
}
