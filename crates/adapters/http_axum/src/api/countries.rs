//! Country reference data.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use budgetdesk_app::requests::countries::{ListCountries, RefreshCountries};
use budgetdesk_domain::country::Country;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/countries`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Country>>, ApiError> {
    let countries = state.mediator.send(ListCountries).await?;
    Ok(Json(countries.as_ref().clone()))
}

/// `POST /api/countries/refresh`
pub async fn refresh(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.mediator.send(RefreshCountries).await?;
    Ok(StatusCode::NO_CONTENT)
}
