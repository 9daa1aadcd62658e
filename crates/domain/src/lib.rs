//! # budgetdesk-domain
//!
//! Pure domain model for the budgetdesk application.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - The [`Entity`](entity::Entity) contract shared by every persisted record,
//!   with optional **audit** and **soft-delete** parts
//! - Explicit **query specifications** (filters, sorts, paging, includes) that
//!   repositories interpret without leaking a query-building API
//! - **Validation results** (named field failures)
//! - Concrete records: **users**, **clients**, **budgets**, **settings**,
//!   **countries**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod audit;
pub mod entity;
pub mod error;
pub mod id;
pub mod query;
pub mod time;
pub mod validation;

pub mod budget;
pub mod client;
pub mod country;
pub mod setting;
pub mod user;
