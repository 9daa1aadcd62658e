//! Query specifications: an explicit description of a read.
//!
//! A [`QuerySpec`] bundles filter, sort, paging, include and flag
//! descriptors. Repositories interpret it internally (SQL for the `SQLite`
//! adapter, plain iteration for the in-memory one), so callers never touch
//! a query-building API.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::time::Timestamp;
use crate::validation::{ValidationErrors, ValidationFailure};

/// A scalar value read from or compared against an entity field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Uuid(uuid::Uuid),
    Timestamp(Timestamp),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compare two non-null values of compatible kinds.
    ///
    /// UUIDs and text compare through their string form; any other mix of
    /// kinds is incomparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Text(b)) => Some(a.to_string().as_str().cmp(b.as_str())),
            (Self::Text(a), Self::Uuid(b)) => Some(a.as_str().cmp(b.to_string().as_str())),
            _ => None,
        }
    }

    /// Total order used for in-memory sorting. `Null` sorts first.
    fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Uuid(value) => Some(value.to_string()),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<uuid::Uuid> for FieldValue {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Boolean predicate over entity fields.
///
/// Comparisons against a `NULL` field never match, except through
/// [`Filter::IsNull`]. `Eq`/`Ne` with a `Null` operand behave as
/// `IsNull`/`NotNull`. Text matching (`Contains`, `StartsWith`) is
/// ASCII case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    Eq { field: String, value: FieldValue },
    Ne { field: String, value: FieldValue },
    Lt { field: String, value: FieldValue },
    Le { field: String, value: FieldValue },
    Gt { field: String, value: FieldValue },
    Ge { field: String, value: FieldValue },
    Contains { field: String, value: String },
    StartsWith { field: String, value: String },
    In { field: String, values: Vec<FieldValue> },
    IsNull { field: String },
    NotNull { field: String },
    And { filters: Vec<Filter> },
    Or { filters: Vec<Filter> },
    Not { filter: Box<Filter> },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn le(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Le {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Ge {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::StartsWith {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull {
            field: field.into(),
        }
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Self::NotNull {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::And { mut filters } => {
                filters.push(other);
                Self::And { filters }
            }
            first => Self::And {
                filters: vec![first, other],
            },
        }
    }

    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        match self {
            Self::Or { mut filters } => {
                filters.push(other);
                Self::Or { filters }
            }
            first => Self::Or {
                filters: vec![first, other],
            },
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not {
            filter: Box::new(self),
        }
    }

    /// Collect every field name this filter references.
    pub fn referenced_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Eq { field, .. }
            | Self::Ne { field, .. }
            | Self::Lt { field, .. }
            | Self::Le { field, .. }
            | Self::Gt { field, .. }
            | Self::Ge { field, .. }
            | Self::Contains { field, .. }
            | Self::StartsWith { field, .. }
            | Self::In { field, .. }
            | Self::IsNull { field }
            | Self::NotNull { field } => out.push(field),
            Self::And { filters } | Self::Or { filters } => {
                for filter in filters {
                    filter.referenced_fields(out);
                }
            }
            Self::Not { filter } => filter.referenced_fields(out),
        }
    }

    /// Evaluate this filter against an entity held in memory.
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        let read = |field: &str| entity.field(field).unwrap_or(FieldValue::Null);
        let cmp = |field: &str, value: &FieldValue, accept: fn(Ordering) -> bool| {
            let current = read(field);
            if current.is_null() || value.is_null() {
                return false;
            }
            current.compare(value).is_some_and(accept)
        };

        match self {
            Self::Eq { field, value } if value.is_null() => read(field).is_null(),
            Self::Ne { field, value } if value.is_null() => !read(field).is_null(),
            Self::Eq { field, value } => cmp(field, value, Ordering::is_eq),
            Self::Ne { field, value } => cmp(field, value, Ordering::is_ne),
            Self::Lt { field, value } => cmp(field, value, Ordering::is_lt),
            Self::Le { field, value } => cmp(field, value, Ordering::is_le),
            Self::Gt { field, value } => cmp(field, value, Ordering::is_gt),
            Self::Ge { field, value } => cmp(field, value, Ordering::is_ge),
            Self::Contains { field, value } => read(field).as_text().is_some_and(|text| {
                text.to_ascii_lowercase()
                    .contains(&value.to_ascii_lowercase())
            }),
            Self::StartsWith { field, value } => read(field).as_text().is_some_and(|text| {
                text.to_ascii_lowercase()
                    .starts_with(&value.to_ascii_lowercase())
            }),
            Self::In { field, values } => {
                let current = read(field);
                !current.is_null()
                    && values
                        .iter()
                        .any(|value| current.compare(value) == Some(Ordering::Equal))
            }
            Self::IsNull { field } => read(field).is_null(),
            Self::NotNull { field } => !read(field).is_null(),
            Self::And { filters } => filters.iter().all(|filter| filter.matches(entity)),
            Self::Or { filters } => filters.iter().any(|filter| filter.matches(entity)),
            Self::Not { filter } => !filter.matches(entity),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Whether results are meant to be written back.
///
/// Every repository result is an owned, detached value; the flag is kept so
/// read-only intent stays visible at call sites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tracking {
    #[default]
    Tracked,
    Detached,
}

/// Flags that relax the default filters of a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Bypass the soft-delete filter only.
    pub include_deleted: bool,
    /// Bypass every default filter, soft-delete included.
    pub ignore_query_filters: bool,
    pub tracking: Tracking,
}

impl QueryOptions {
    /// Whether soft-deleted rows should be hidden.
    #[must_use]
    pub fn hides_deleted(&self) -> bool {
        !(self.include_deleted || self.ignore_query_filters)
    }

    /// Whether repository-level global filters apply.
    #[must_use]
    pub fn applies_global_filters(&self) -> bool {
        !self.ignore_query_filters
    }
}

/// A complete read description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    pub filter: Option<Filter>,
    pub sort: Vec<Sort>,
    pub skip: u64,
    pub take: Option<u64>,
    pub includes: Vec<String>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

impl QuerySpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate, AND-ed with any existing one.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.sort.push(Sort::asc(field));
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.push(Sort::desc(field));
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    #[must_use]
    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.includes.push(relation.into());
        self
    }

    #[must_use]
    pub fn include_deleted(mut self) -> Self {
        self.options.include_deleted = true;
        self
    }

    #[must_use]
    pub fn ignore_query_filters(mut self) -> Self {
        self.options.ignore_query_filters = true;
        self
    }

    #[must_use]
    pub fn detached(mut self) -> Self {
        self.options.tracking = Tracking::Detached;
        self
    }

    /// One-based page number of this window: `floor(skip / take) + 1`.
    ///
    /// An unbounded or empty window is page 1.
    #[must_use]
    pub fn page_number(&self) -> u64 {
        match self.take {
            Some(take) if take > 0 => (self.skip / take).saturating_add(1),
            _ => 1,
        }
    }

    /// Same spec without the paging window, for counting.
    #[must_use]
    pub fn without_window(&self) -> Self {
        Self {
            skip: 0,
            take: None,
            sort: Vec::new(),
            includes: Vec::new(),
            ..self.clone()
        }
    }

    /// Check every referenced field against `E::FIELDS`.
    ///
    /// # Errors
    ///
    /// Returns one failure per unknown filter or sort field.
    pub fn check_fields<E: Entity>(&self) -> Result<(), ValidationErrors> {
        let mut referenced = Vec::new();
        if let Some(filter) = &self.filter {
            filter.referenced_fields(&mut referenced);
        }
        referenced.extend(self.sort.iter().map(|sort| sort.field.as_str()));

        let mut errors = ValidationErrors::new();
        for field in referenced {
            if !E::has_field(field) {
                errors.push(unknown_field::<E>(field));
            }
        }
        errors.into_result()
    }

    /// Evaluate the filter, sort, and window against an in-memory slice.
    ///
    /// Default filters are the caller's concern; this only applies what the
    /// spec itself describes.
    pub fn apply<'a, E: Entity>(&self, rows: impl IntoIterator<Item = &'a E>) -> Vec<E> {
        let mut matched: Vec<E> = rows
            .into_iter()
            .filter(|row| self.filter.as_ref().is_none_or(|filter| filter.matches(*row)))
            .cloned()
            .collect();

        if !self.sort.is_empty() {
            matched.sort_by(|a, b| {
                for key in &self.sort {
                    let left = a.field(&key.field).unwrap_or(FieldValue::Null);
                    let right = b.field(&key.field).unwrap_or(FieldValue::Null);
                    let ord = match key.direction {
                        Direction::Asc => left.sort_cmp(&right),
                        Direction::Desc => right.sort_cmp(&left),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let take = self
            .take
            .map_or(usize::MAX, |take| usize::try_from(take).unwrap_or(usize::MAX));
        matched.into_iter().skip(skip).take(take).collect()
    }
}

/// Failure reported for a field name the entity does not expose.
#[must_use]
pub fn unknown_field<E: Entity>(field: &str) -> ValidationFailure {
    ValidationFailure::new(field, format!("is not a field of {}", E::NAME))
}

/// One window of results plus the total matching count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter, ignoring the window.
    pub total: u64,
    pub page_number: u64,
    pub page_size: Option<u64>,
}

impl<T> Page<T> {
    /// Assemble a page for `spec`.
    pub fn new(items: Vec<T>, total: u64, spec: &QuerySpec) -> Self {
        Self {
            items,
            total,
            page_number: spec.page_number(),
            page_size: spec.take,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}

/// Named field values selected from one entity.
pub type Projection = BTreeMap<String, FieldValue>;

/// Project `fields` out of `entity`.
#[must_use]
pub fn project<E: Entity>(entity: &E, fields: &[String]) -> Projection {
    fields
        .iter()
        .map(|name| {
            (
                name.clone(),
                entity.field(name).unwrap_or(FieldValue::Null),
            )
        })
        .collect()
}
