//! Validation layer: declarative field rules and the async validator trait.

use std::future::Future;

use futures::future::BoxFuture;

use budgetdesk_domain::error::AppError;
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

/// Checks one request type and reports every violation it finds.
///
/// Returning `Ok` with failures rejects the request; returning `Err` means
/// the check itself could not run (e.g. the store is down).
pub trait Validator<R>: Send + Sync + 'static {
    fn validate(
        &self,
        request: &R,
    ) -> impl Future<Output = Result<ValidationErrors, AppError>> + Send;
}

/// Object-safe form of [`Validator`], used inside pipelines.
pub(crate) trait DynValidator<R>: Send + Sync {
    fn call<'a>(&'a self, request: &'a R) -> BoxFuture<'a, Result<ValidationErrors, AppError>>;
}

impl<R: Sync, V: Validator<R>> DynValidator<R> for V {
    fn call<'a>(&'a self, request: &'a R) -> BoxFuture<'a, Result<ValidationErrors, AppError>> {
        Box::pin(self.validate(request))
    }
}

type Rule<T> = Box<dyn Fn(&T) -> Option<ValidationFailure> + Send + Sync>;

/// Ordered synchronous rules over a value. Every rule runs on every check.
pub struct Rules<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Default for Rules<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: 'static> Rules<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an arbitrary rule.
    #[must_use]
    pub fn rule(
        mut self,
        rule: impl Fn(&T) -> Option<ValidationFailure> + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// The text must contain something other than whitespace.
    #[must_use]
    pub fn not_empty(self, field: &'static str, get: fn(&T) -> &str) -> Self {
        self.rule(move |target| {
            get(target)
                .trim()
                .is_empty()
                .then(|| ValidationFailure::new(field, "must not be empty"))
        })
    }

    /// The optional text must be present and non-blank.
    #[must_use]
    pub fn required(self, field: &'static str, get: fn(&T) -> Option<&str>) -> Self {
        self.rule(move |target| {
            get(target)
                .is_none_or(|value| value.trim().is_empty())
                .then(|| ValidationFailure::new(field, "is required"))
        })
    }

    /// At most `max` characters.
    #[must_use]
    pub fn max_length(self, field: &'static str, max: usize, get: fn(&T) -> &str) -> Self {
        self.rule(move |target| {
            (get(target).chars().count() > max).then(|| {
                ValidationFailure::new(field, format!("must be at most {max} characters"))
            })
        })
    }

    /// When present, the text must look like an email address.
    #[must_use]
    pub fn email(self, field: &'static str, get: fn(&T) -> Option<&str>) -> Self {
        self.rule(move |target| {
            get(target)
                .filter(|value| !looks_like_email(value))
                .map(|_| ValidationFailure::new(field, "is not a valid email address"))
        })
    }

    /// Strictly greater than zero.
    #[must_use]
    pub fn positive(self, field: &'static str, get: fn(&T) -> i64) -> Self {
        self.rule(move |target| {
            (get(target) <= 0).then(|| ValidationFailure::new(field, "must be greater than zero"))
        })
    }

    /// Run every rule in declaration order.
    #[must_use]
    pub fn check(&self, target: &T) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.extend(self.rules.iter().filter_map(|rule| rule(target)));
        errors
    }
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !value.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Signup {
        name: String,
        email: Option<String>,
        age: i64,
    }

    fn rules() -> Rules<Signup> {
        Rules::new()
            .not_empty("name", |s: &Signup| s.name.as_str())
            .max_length("name", 5, |s: &Signup| s.name.as_str())
            .required("email", |s: &Signup| s.email.as_deref())
            .email("email", |s: &Signup| s.email.as_deref())
            .positive("age", |s: &Signup| s.age)
    }

    #[test]
    fn should_pass_valid_input() {
        let signup = Signup {
            name: "Ada".to_string(),
            email: Some("ada@example.org".to_string()),
            age: 36,
        };
        assert!(rules().check(&signup).is_empty());
    }

    #[test]
    fn should_report_every_failure_in_declaration_order() {
        let signup = Signup {
            name: "  ".to_string(),
            email: None,
            age: 0,
        };
        let errors = rules().check(&signup);
        let got: Vec<(&str, &str)> = errors
            .failures()
            .iter()
            .map(|f| (f.field.as_str(), f.message.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("name", "must not be empty"),
                ("email", "is required"),
                ("age", "must be greater than zero"),
            ]
        );
    }

    #[test]
    fn should_reject_malformed_emails() {
        for bad in ["plain", "@example.org", "a@b", "a@@b.org", "a b@c.org", "a@.org"] {
            assert!(!looks_like_email(bad), "{bad} should be rejected");
        }
        assert!(looks_like_email("first.last@sub.example.org"));
    }

    #[test]
    fn should_count_characters_not_bytes_for_max_length() {
        let signup = Signup {
            name: "Zoë".to_string(),
            email: Some("z@e.io".to_string()),
            age: 1,
        };
        assert!(rules().check(&signup).is_empty());
    }
}
