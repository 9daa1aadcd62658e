//! Shared application state for axum handlers.

use std::sync::Arc;

use budgetdesk_app::mediator::Mediator;

/// Application state shared across all axum handlers.
///
/// Every handler dispatches through the mediator, so it is the only thing
/// the state carries.
pub struct AppState {
    pub mediator: Arc<Mediator>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            mediator: Arc::clone(&self.mediator),
        }
    }
}

impl AppState {
    pub fn new(mediator: Mediator) -> Self {
        Self {
            mediator: Arc::new(mediator),
        }
    }

    /// Create a state around a mediator already shared with other tasks.
    pub fn from_arc(mediator: Arc<Mediator>) -> Self {
        Self { mediator }
    }
}
