//! Country: read-mostly reference data, served through the cache.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::CountryId;
use crate::query::FieldValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    pub name: String,
}

impl Country {
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CountryId::new(),
            code: code.into(),
            name: name.into(),
        }
    }
}

impl Entity for Country {
    type Id = CountryId;

    const NAME: &'static str = "Country";
    const FIELDS: &'static [&'static str] = &["id", "code", "name"];

    fn id(&self) -> CountryId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "code" => Some(self.code.as_str().into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}
