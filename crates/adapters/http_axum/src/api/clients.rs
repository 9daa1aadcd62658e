//! Client resource.

use serde::Deserialize;

use budgetdesk_domain::client::Client;
use budgetdesk_domain::id::UserId;

use crate::api::crud::Resource;

/// Request body for creating or updating a client.
#[derive(Debug, Deserialize)]
pub struct ClientBody {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

impl Resource for Client {
    type Body = ClientBody;

    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email"];

    fn from_body(body: ClientBody) -> Self {
        let mut client = Client::new(body.name);
        client.email = body.email;
        client.owner_id = body.owner_id;
        client
    }

    fn apply(&mut self, body: ClientBody) {
        self.name = body.name;
        self.email = body.email;
        self.owner_id = body.owner_id;
    }
}
