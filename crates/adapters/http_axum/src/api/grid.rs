//! Data-table endpoint: one paged, searched and sorted window plus the
//! counts a table widget needs to draw its pager.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use budgetdesk_app::requests::{Count, List};
use budgetdesk_domain::query::{Direction, QuerySpec, Sort};

use crate::api::crud::{Resource, search_filter};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LENGTH: i64 = 10;

fn default_length() -> i64 {
    DEFAULT_LENGTH
}

/// Request body for `POST /api/{resource}/grid`.
#[derive(Debug, Deserialize)]
pub struct GridRequest {
    /// Echoed back so the widget can discard stale responses.
    #[serde(default)]
    pub draw: u64,
    #[serde(default)]
    pub start: u64,
    /// Rows per page. Negative means every row.
    #[serde(default = "default_length")]
    pub length: i64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub order: Vec<GridOrder>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct GridOrder {
    pub column: String,
    #[serde(default)]
    pub dir: Direction,
}

/// Response envelope for the grid endpoint.
#[derive(Debug, Serialize)]
pub struct GridResponse<E> {
    pub draw: u64,
    /// Rows visible before the search is applied.
    pub records_total: u64,
    /// Rows matching the search.
    pub records_filtered: u64,
    pub page: u64,
    pub data: Vec<E>,
}

impl GridRequest {
    fn base_spec(&self) -> QuerySpec {
        let spec = QuerySpec::new().detached();
        if self.include_deleted {
            spec.include_deleted()
        } else {
            spec
        }
    }

    fn into_spec<E: Resource>(self) -> QuerySpec {
        let mut spec = self.base_spec().skip(self.start);
        if let Ok(take) = u64::try_from(self.length) {
            spec = spec.take(take);
        }
        spec.sort.extend(self.order.into_iter().map(|key| Sort {
            field: key.column,
            direction: key.dir,
        }));
        spec.includes.extend(self.include);
        if let Some(filter) = self.search.as_deref().and_then(search_filter::<E>) {
            spec = spec.filter(filter);
        }
        spec
    }
}

/// `POST /api/{resource}/grid`
pub async fn grid<E: Resource>(
    State(state): State<AppState>,
    Json(request): Json<GridRequest>,
) -> Result<Json<GridResponse<E>>, ApiError> {
    let draw = request.draw;
    let records_total = state
        .mediator
        .send(Count::<E>::new(request.base_spec()))
        .await?;
    let page = state
        .mediator
        .send(List::<E>::new(request.into_spec::<E>()))
        .await?;

    Ok(Json(GridResponse {
        draw,
        records_total,
        records_filtered: page.total,
        page: page.page_number,
        data: page.items,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetdesk_domain::budget::Budget;

    fn request(json: &str) -> GridRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn should_default_to_ten_rows() {
        let spec = request(r#"{"draw": 1}"#).into_spec::<Budget>();
        assert_eq!(spec.take, Some(10));
        assert_eq!(spec.skip, 0);
    }

    #[test]
    fn should_drop_the_window_for_negative_length() {
        let spec = request(r#"{"start": 20, "length": -1}"#).into_spec::<Budget>();
        assert_eq!(spec.take, None);
        assert_eq!(spec.skip, 20);
    }

    #[test]
    fn should_map_order_and_search() {
        let spec = request(
            r#"{"order": [{"column": "amount_cents", "dir": "desc"}], "search": "roof", "include": ["client"]}"#,
        )
        .into_spec::<Budget>();
        assert_eq!(spec.sort, vec![Sort::desc("amount_cents")]);
        assert_eq!(spec.includes, vec!["client".to_string()]);
        assert!(spec.filter.is_some());
    }
}
