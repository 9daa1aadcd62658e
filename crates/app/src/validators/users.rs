//! User validation: profile fields and unique normalized email.

use std::sync::Arc;

use budgetdesk_domain::error::AppError;
use budgetdesk_domain::id::UserId;
use budgetdesk_domain::query::{Filter, QuerySpec};
use budgetdesk_domain::user::{User, normalize_email};
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

use super::MAX_NAME_LENGTH;
use crate::ports::Repository;
use crate::requests::{Create, Update};
use crate::validation::{Rules, Validator};

/// Validates [`Create<User>`] and [`Update<User>`].
pub struct UserValidator<R> {
    users: Arc<R>,
    rules: Rules<User>,
}

impl<R: Repository<User> + 'static> UserValidator<R> {
    pub fn new(users: Arc<R>) -> Self {
        let rules = Rules::new()
            .not_empty("user_name", |u: &User| u.user_name.as_str())
            .max_length("user_name", MAX_NAME_LENGTH, |u: &User| u.user_name.as_str())
            .not_empty("email", |u: &User| u.email.as_str())
            .email("email", |u: &User| Some(u.email.as_str()));
        Self { users, rules }
    }

    /// Field rules first; the uniqueness lookup only runs on a well-formed
    /// email. `current` is the user being updated, excluded from the lookup.
    async fn check(
        &self,
        user: &User,
        current: Option<UserId>,
    ) -> Result<ValidationErrors, AppError> {
        let mut errors = self.rules.check(user);
        if errors.failures().iter().any(|f| f.field == "email") {
            return Ok(errors);
        }

        let mut filter = Filter::eq("normalized_email", normalize_email(&user.email));
        if let Some(id) = current {
            filter = filter.and(Filter::ne("id", id));
        }
        let spec = QuerySpec::new().filter(filter).ignore_query_filters();
        if self.users.exists(&spec).await? {
            errors.push(ValidationFailure::new(
                "email",
                format!("Email '{}' is already in use", user.email.trim()),
            ));
        }
        Ok(errors)
    }
}

impl<R: Repository<User> + 'static> Validator<Create<User>> for UserValidator<R> {
    async fn validate(&self, request: &Create<User>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity, None).await
    }
}

impl<R: Repository<User> + 'static> Validator<Update<User>> for UserValidator<R> {
    async fn validate(&self, request: &Update<User>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity, Some(request.entity.id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediator::Mediator;
    use crate::memory::InMemoryRepository;
    use crate::requests::register_crud;

    fn setup() -> (Mediator, Arc<InMemoryRepository<User>>) {
        let repo = Arc::new(InMemoryRepository::<User>::new());
        let mediator = register_crud::<User, _>(Mediator::builder(), Arc::clone(&repo))
            .validator::<Create<User>, _>(UserValidator::new(Arc::clone(&repo)))
            .validator::<Update<User>, _>(UserValidator::new(Arc::clone(&repo)))
            .build()
            .unwrap();
        (mediator, repo)
    }

    fn messages(err: &AppError) -> Vec<String> {
        match err {
            AppError::Validation(errors) => errors
                .failures()
                .iter()
                .map(|f| f.message.clone())
                .collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_reject_duplicate_normalized_email_and_leave_store_untouched() {
        let (mediator, repo) = setup();
        mediator
            .send(Create::new(User::new("ada", "ada@example.org")))
            .await
            .unwrap();

        let err = mediator
            .send(Create::new(User::new("ada2", " ADA@Example.org")))
            .await
            .unwrap_err();

        assert_eq!(messages(&err), vec!["Email 'ADA@Example.org' is already in use"]);
        assert_eq!(repo.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn should_report_malformed_email_without_store_lookup() {
        let (mediator, _repo) = setup();
        let err = mediator
            .send(Create::new(User::new("", "not-an-email")))
            .await
            .unwrap_err();
        assert_eq!(
            messages(&err),
            vec!["must not be empty", "is not a valid email address"]
        );
    }

    #[tokio::test]
    async fn should_allow_user_to_keep_own_email_on_update() {
        let (mediator, _repo) = setup();
        let mut user = mediator
            .send(Create::new(User::new("ada", "ada@example.org")))
            .await
            .unwrap();
        user.user_name = "ada.lovelace".to_string();
        let updated = mediator.send(Update::new(user)).await.unwrap();
        assert_eq!(updated.user_name, "ada.lovelace");
    }

    #[tokio::test]
    async fn should_reject_taking_another_users_email_on_update() {
        let (mediator, _repo) = setup();
        mediator
            .send(Create::new(User::new("ada", "ada@example.org")))
            .await
            .unwrap();
        let mut grace = mediator
            .send(Create::new(User::new("grace", "grace@example.org")))
            .await
            .unwrap();
        grace.email = "ada@example.org".to_string();

        let err = mediator.send(Update::new(grace)).await.unwrap_err();
        assert_eq!(messages(&err), vec!["Email 'ada@example.org' is already in use"]);
    }
}
