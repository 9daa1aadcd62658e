//! JSON REST handlers shared by every CRUD resource.
//!
//! Each handler is generic over a [`Resource`] and dispatches one of the
//! generic CRUD requests through the mediator.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use budgetdesk_app::requests::{Create, Delete, GetById, List, Update};
use budgetdesk_domain::entity::Entity;
use budgetdesk_domain::query::{Filter, Page, QuerySpec};
use budgetdesk_domain::validation::ValidationErrors;

use crate::error::ApiError;
use crate::state::AppState;

/// An entity exposed over the API, with the body clients send to write it.
pub trait Resource: Entity + Serialize {
    /// Writable fields accepted by create and update.
    type Body: DeserializeOwned + Send + 'static;

    /// Fields a free-text `search` matches against.
    const SEARCH_FIELDS: &'static [&'static str];

    fn from_body(body: Self::Body) -> Self;

    /// Overwrite the writable fields of a stored entity.
    fn apply(&mut self, body: Self::Body);
}

/// Query string accepted by the list endpoints.
///
/// `sort` and `include` are comma-separated; a `-` prefix sorts descending.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub skip: u64,
    pub take: Option<u64>,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub include: Option<String>,
    pub include_deleted: bool,
}

impl ListParams {
    pub fn into_spec<E: Resource>(self) -> QuerySpec {
        let mut spec = QuerySpec::new().skip(self.skip).detached();
        if let Some(take) = self.take {
            spec = spec.take(take);
        }
        for key in split_list(self.sort.as_deref()) {
            spec = match key.strip_prefix('-') {
                Some(field) => spec.order_by_desc(field),
                None => spec.order_by(key),
            };
        }
        for relation in split_list(self.include.as_deref()) {
            spec = spec.include(relation);
        }
        if let Some(filter) = self.search.as_deref().and_then(search_filter::<E>) {
            spec = spec.filter(filter);
        }
        if self.include_deleted {
            spec = spec.include_deleted();
        }
        spec
    }
}

/// Query string accepted by the get endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetParams {
    pub include: Option<String>,
    pub include_deleted: bool,
}

impl GetParams {
    fn into_spec(self) -> QuerySpec {
        let mut spec = QuerySpec::new().detached();
        for relation in split_list(self.include.as_deref()) {
            spec = spec.include(relation);
        }
        if self.include_deleted {
            spec = spec.include_deleted();
        }
        spec
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

/// Case-insensitive substring match over [`Resource::SEARCH_FIELDS`].
pub(crate) fn search_filter<E: Resource>(term: &str) -> Option<Filter> {
    let term = term.trim();
    if term.is_empty() || E::SEARCH_FIELDS.is_empty() {
        return None;
    }
    Some(Filter::Or {
        filters: E::SEARCH_FIELDS
            .iter()
            .map(|field| Filter::contains(*field, term))
            .collect(),
    })
}

pub(crate) fn parse_id<E: Entity>(raw: &str) -> Result<E::Id, ApiError> {
    raw.parse::<E::Id>().map_err(|_| {
        ApiError::from(ValidationErrors::single(
            "id",
            format!("'{raw}' is not a valid {} id", E::NAME),
        ))
    })
}

/// Possible responses from the list endpoint.
pub enum ListResponse<E> {
    Ok(Json<Page<E>>),
}

impl<E: Serialize> IntoResponse for ListResponse<E> {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse<E> {
    Ok(Json<E>),
}

impl<E: Serialize> IntoResponse for GetResponse<E> {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse<E> {
    Created(Json<E>),
}

impl<E: Serialize> IntoResponse for CreateResponse<E> {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/{resource}`
pub async fn list<E: Resource>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<ListResponse<E>, ApiError> {
    let page = state
        .mediator
        .send(List::<E>::new(params.into_spec::<E>()))
        .await?;
    Ok(ListResponse::Ok(Json(page)))
}

/// `GET /api/{resource}/{id}`
pub async fn get<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<GetResponse<E>, ApiError> {
    let id = parse_id::<E>(&id)?;
    let entity = state
        .mediator
        .send(GetById::<E>::new(id).with_spec(params.into_spec()))
        .await?;
    Ok(GetResponse::Ok(Json(entity)))
}

/// `POST /api/{resource}`
pub async fn create<E: Resource>(
    State(state): State<AppState>,
    Json(body): Json<E::Body>,
) -> Result<CreateResponse<E>, ApiError> {
    let created = state.mediator.send(Create::new(E::from_body(body))).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/{resource}/{id}`
pub async fn update<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<E::Body>,
) -> Result<GetResponse<E>, ApiError> {
    let id = parse_id::<E>(&id)?;
    let mut entity = state
        .mediator
        .send(GetById::<E>::new(id).with_spec(QuerySpec::new().detached()))
        .await?;
    entity.apply(body);
    let updated = state.mediator.send(Update::new(entity)).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/{resource}/{id}`
pub async fn delete<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError> {
    let id = parse_id::<E>(&id)?;
    state.mediator.send(Delete::<E>::new(id)).await?;
    Ok(DeleteResponse::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetdesk_domain::client::Client;

    #[test]
    fn should_translate_list_params_into_spec() {
        let params = ListParams {
            skip: 10,
            take: Some(5),
            sort: Some("-name, email".to_string()),
            include_deleted: true,
            ..ListParams::default()
        };
        let spec = params.into_spec::<Client>();

        assert_eq!(spec.skip, 10);
        assert_eq!(spec.take, Some(5));
        assert_eq!(spec.page_number(), 3);
        assert_eq!(spec.sort.len(), 2);
        assert_eq!(spec.sort[0].field, "name");
        assert!(spec.options.include_deleted);
    }

    #[test]
    fn should_skip_blank_search_terms() {
        assert!(search_filter::<Client>("   ").is_none());
        assert!(search_filter::<Client>("acme").is_some());
    }

    #[test]
    fn should_reject_malformed_ids() {
        assert!(parse_id::<Client>("not-a-uuid").is_err());
    }
}
