//! Setting: a named configuration value editable at runtime.

use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::entity::Entity;
use crate::id::SettingId;
use crate::query::FieldValue;

/// A key/value setting. Exactly one setting is expected to carry
/// `is_default`; it can never be deleted, nor can the last remaining one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: SettingId,
    pub key: String,
    pub value: String,
    pub is_default: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Setting {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: SettingId::new(),
            key: key.into(),
            value: value.into(),
            is_default: false,
            audit: Audit::default(),
        }
    }

    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

impl Entity for Setting {
    type Id = SettingId;

    const NAME: &'static str = "Setting";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "key",
        "value",
        "is_default",
        "created_at",
        "modified_at",
    ];

    fn id(&self) -> SettingId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "key" => Some(self.key.as_str().into()),
            "value" => Some(self.value.as_str().into()),
            "is_default" => Some(self.is_default.into()),
            other => self.audit.field(other),
        }
    }

    fn audit(&self) -> Option<&Audit> {
        Some(&self.audit)
    }

    fn audit_mut(&mut self) -> Option<&mut Audit> {
        Some(&mut self.audit)
    }
}
