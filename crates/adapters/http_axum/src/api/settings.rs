//! Setting resource.

use serde::Deserialize;

use budgetdesk_domain::setting::Setting;

use crate::api::crud::Resource;

/// Request body for creating or updating a setting.
#[derive(Debug, Deserialize)]
pub struct SettingBody {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Resource for Setting {
    type Body = SettingBody;

    const SEARCH_FIELDS: &'static [&'static str] = &["key", "value"];

    fn from_body(body: SettingBody) -> Self {
        let setting = Setting::new(body.key, body.value);
        if body.is_default {
            setting.as_default()
        } else {
            setting
        }
    }

    fn apply(&mut self, body: SettingBody) {
        self.key = body.key;
        self.value = body.value;
        self.is_default = body.is_default;
    }
}
