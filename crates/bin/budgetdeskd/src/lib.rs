//! # budgetdeskd: budgetdesk daemon
//!
//! Composition root that wires the storage adapter, the mediator and the
//! HTTP adapter together. `main.rs` adds logging, the listener and
//! graceful shutdown on top.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

pub mod config;
pub mod wiring;
