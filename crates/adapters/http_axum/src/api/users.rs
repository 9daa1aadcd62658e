//! User resource.

use serde::Deserialize;

use budgetdesk_domain::user::{User, normalize_email};

use crate::api::crud::Resource;

/// Request body for creating or updating a user.
#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub user_name: String,
    pub email: String,
}

impl Resource for User {
    type Body = UserBody;

    const SEARCH_FIELDS: &'static [&'static str] = &["user_name", "email"];

    fn from_body(body: UserBody) -> Self {
        User::new(body.user_name, body.email)
    }

    fn apply(&mut self, body: UserBody) {
        self.user_name = body.user_name;
        self.normalized_email = normalize_email(&body.email);
        self.email = body.email;
    }
}
