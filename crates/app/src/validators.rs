//! Validators for the CRUD requests of each entity.
//!
//! Each validator pairs a synchronous [`Rules`](crate::validation::Rules)
//! set with the store checks the rules cannot express: uniqueness,
//! referenced rows and last-record guards. Store checks run only after the
//! field rules they depend on have passed.

pub mod budgets;
pub mod clients;
pub mod settings;
pub mod users;

use std::sync::Arc;

use budgetdesk_domain::budget::Budget;
use budgetdesk_domain::client::Client;
use budgetdesk_domain::setting::Setting;
use budgetdesk_domain::user::User;

use crate::mediator::MediatorBuilder;
use crate::ports::Repository;
use crate::requests::{Create, Delete, Update};

pub use budgets::BudgetValidator;
pub use clients::{ClientValidator, DeleteClientValidator};
pub use settings::{DeleteSettingValidator, SettingValidator};
pub use users::UserValidator;

/// Longest accepted name, title or key.
pub const MAX_NAME_LENGTH: usize = 200;

/// Register every entity validator on `builder`.
#[must_use]
pub fn register_validators<U, C, B, S>(
    builder: MediatorBuilder,
    users: &Arc<U>,
    clients: &Arc<C>,
    budgets: &Arc<B>,
    settings: &Arc<S>,
) -> MediatorBuilder
where
    U: Repository<User> + 'static,
    C: Repository<Client> + 'static,
    B: Repository<Budget> + 'static,
    S: Repository<Setting> + 'static,
{
    builder
        .validator::<Create<User>, _>(UserValidator::new(Arc::clone(users)))
        .validator::<Update<User>, _>(UserValidator::new(Arc::clone(users)))
        .validator::<Create<Client>, _>(ClientValidator::new(Arc::clone(clients)))
        .validator::<Update<Client>, _>(ClientValidator::new(Arc::clone(clients)))
        .validator::<Delete<Client>, _>(DeleteClientValidator::new(Arc::clone(budgets)))
        .validator::<Create<Budget>, _>(BudgetValidator::new(Arc::clone(clients)))
        .validator::<Update<Budget>, _>(BudgetValidator::new(Arc::clone(clients)))
        .validator::<Create<Setting>, _>(SettingValidator::new(Arc::clone(settings)))
        .validator::<Update<Setting>, _>(SettingValidator::new(Arc::clone(settings)))
        .validator::<Delete<Setting>, _>(DeleteSettingValidator::new(Arc::clone(settings)))
}
