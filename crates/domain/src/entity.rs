//! The contract every persisted record fulfils.
//!
//! Repositories are generic over [`Entity`]: they read fields by name to
//! evaluate [`QuerySpec`](crate::query::QuerySpec)s, and they stamp the
//! optional [`Audit`] and [`SoftDelete`] parts on writes.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::audit::{Audit, SoftDelete};
use crate::query::FieldValue;

/// A record with an identity key, stored in its own table.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Identity key. Unique within the backing store.
    type Id: Copy
        + Eq
        + Hash
        + fmt::Debug
        + fmt::Display
        + FromStr
        + Into<FieldValue>
        + Send
        + Sync
        + 'static;

    /// Human-readable kind, used in not-found errors and logs.
    const NAME: &'static str;

    /// Every field name [`Entity::field`] answers for, `"id"` included.
    const FIELDS: &'static [&'static str];

    /// Whether deletes flip a [`SoftDelete`] marker instead of removing the row.
    const SOFT_DELETE: bool = false;

    fn id(&self) -> Self::Id;

    /// Read a field by name. `None` when the name is not in [`Entity::FIELDS`].
    fn field(&self, name: &str) -> Option<FieldValue>;

    fn audit(&self) -> Option<&Audit> {
        None
    }

    fn audit_mut(&mut self) -> Option<&mut Audit> {
        None
    }

    fn soft_delete(&self) -> Option<&SoftDelete> {
        None
    }

    fn soft_delete_mut(&mut self) -> Option<&mut SoftDelete> {
        None
    }

    /// Normalize derived fields and drop eager-loaded relations before a
    /// write. Called by repositories on insert and update.
    fn prepare_for_save(&mut self) {}

    fn is_deleted(&self) -> bool {
        self.soft_delete().is_some_and(|marker| marker.is_deleted)
    }

    /// Whether `name` is a known field of this entity.
    fn has_field(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }
}
