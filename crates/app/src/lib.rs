//! # budgetdesk-app
//!
//! Application layer: request pipeline, validation, caching and **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **port traits** that adapters implement:
//!   - `Repository<E>`: CRUD and specification-driven reads for any entity
//! - Route typed requests through the [`mediator`] and its fixed behavior
//!   chain (error logging, validation, performance logging)
//! - Provide the generic CRUD [`requests`] and their handler
//! - Provide the entity [`validators`] built on [`validation::Rules`]
//! - Provide **in-process infrastructure** that doesn't need IO: the TTL
//!   [`cache`] and the vector-backed [`memory`] repository
//!
//! ## Dependency rule
//! Depends on `budgetdesk-domain` only (plus `tokio` for time and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod cache;
pub mod mediator;
pub mod memory;
pub mod ports;
pub mod requests;
pub mod validation;
pub mod validators;
