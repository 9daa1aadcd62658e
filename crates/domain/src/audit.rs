//! Audit and soft-delete parts embedded in entities.
//!
//! Both parts are written exclusively by repositories: callers never set
//! `created_at`, `modified_at`, or `deleted_at` themselves.

use serde::{Deserialize, Serialize};

use crate::query::FieldValue;
use crate::time::{Timestamp, now};

/// Creation and last-modification timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: Timestamp,
    pub modified_at: Option<Timestamp>,
}

impl Default for Audit {
    fn default() -> Self {
        Self {
            created_at: now(),
            modified_at: None,
        }
    }
}

impl Audit {
    /// Field names contributed by this part.
    pub const FIELDS: [&'static str; 2] = ["created_at", "modified_at"];

    /// Stamp a freshly inserted row.
    pub fn mark_created(&mut self, at: Timestamp) {
        self.created_at = at;
        self.modified_at = None;
    }

    /// Stamp a mutating save. `created_at` is left untouched.
    pub fn mark_modified(&mut self, at: Timestamp) {
        self.modified_at = Some(at);
    }

    /// Read one of [`Self::FIELDS`] by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "created_at" => Some(self.created_at.into()),
            "modified_at" => Some(self.modified_at.into()),
            _ => None,
        }
    }
}

/// Soft-delete marker. Deleted rows are hidden from queries by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDelete {
    pub is_deleted: bool,
    pub deleted_at: Option<Timestamp>,
}

impl SoftDelete {
    /// Field names contributed by this part.
    pub const FIELDS: [&'static str; 2] = ["is_deleted", "deleted_at"];

    pub fn mark_deleted(&mut self, at: Timestamp) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
    }

    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "is_deleted" => Some(self.is_deleted.into()),
            "deleted_at" => Some(self.deleted_at.into()),
            _ => None,
        }
    }
}
