//! # budgetdesk-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for users, clients, budgets, settings and
//!   countries (`/api/clients`, `/api/budgets/grid`, …)
//! - Map HTTP requests into mediator requests (driving adapter)
//! - Map [`AppError`](budgetdesk_domain::error::AppError)s into status codes
//!
//! ## Dependency rule
//! Depends on `budgetdesk-app` (for the mediator and request types) and
//! `budgetdesk-domain` (for the records serialized in bodies). Never leaks
//! axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
