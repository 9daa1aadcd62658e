//! Setting validation: unique keys, and the default or last setting can
//! never be deleted.

use std::sync::Arc;

use budgetdesk_domain::error::AppError;
use budgetdesk_domain::id::SettingId;
use budgetdesk_domain::query::{Filter, QueryOptions, QuerySpec};
use budgetdesk_domain::setting::Setting;
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

use super::MAX_NAME_LENGTH;
use crate::ports::Repository;
use crate::requests::{Create, Delete, Update};
use crate::validation::{Rules, Validator};

/// Validates [`Create<Setting>`] and [`Update<Setting>`].
pub struct SettingValidator<R> {
    settings: Arc<R>,
    rules: Rules<Setting>,
}

impl<R: Repository<Setting> + 'static> SettingValidator<R> {
    pub fn new(settings: Arc<R>) -> Self {
        let rules = Rules::new()
            .not_empty("key", |s: &Setting| s.key.as_str())
            .max_length("key", MAX_NAME_LENGTH, |s: &Setting| s.key.as_str());
        Self { settings, rules }
    }

    async fn check(
        &self,
        setting: &Setting,
        current: Option<SettingId>,
    ) -> Result<ValidationErrors, AppError> {
        let mut errors = self.rules.check(setting);
        if !errors.is_empty() {
            return Ok(errors);
        }
        let mut filter = Filter::eq("key", setting.key.trim());
        if let Some(id) = current {
            filter = filter.and(Filter::ne("id", id));
        }
        if self.settings.exists(&QuerySpec::new().filter(filter)).await? {
            errors.push(ValidationFailure::new(
                "key",
                format!("Setting '{}' already exists", setting.key.trim()),
            ));
        }
        Ok(errors)
    }
}

impl<R: Repository<Setting> + 'static> Validator<Create<Setting>> for SettingValidator<R> {
    async fn validate(&self, request: &Create<Setting>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity, None).await
    }
}

impl<R: Repository<Setting> + 'static> Validator<Update<Setting>> for SettingValidator<R> {
    async fn validate(&self, request: &Update<Setting>) -> Result<ValidationErrors, AppError> {
        self.check(&request.entity, Some(request.entity.id)).await
    }
}

/// Guards [`Delete<Setting>`]. A missing key passes, so the handler can
/// answer with `NotFound`.
pub struct DeleteSettingValidator<R> {
    settings: Arc<R>,
}

impl<R: Repository<Setting> + 'static> DeleteSettingValidator<R> {
    pub fn new(settings: Arc<R>) -> Self {
        Self { settings }
    }
}

impl<R: Repository<Setting> + 'static> Validator<Delete<Setting>> for DeleteSettingValidator<R> {
    async fn validate(&self, request: &Delete<Setting>) -> Result<ValidationErrors, AppError> {
        let mut errors = ValidationErrors::new();
        let Some(setting) = self.settings.find(request.id, QueryOptions::default()).await? else {
            return Ok(errors);
        };
        if setting.is_default {
            errors.push(ValidationFailure::new("id", "The default setting cannot be deleted"));
        }
        if self.settings.count(&QuerySpec::new()).await? <= 1 {
            errors.push(ValidationFailure::new("id", "The last setting cannot be deleted"));
        }
        Ok(errors)
    }
}
