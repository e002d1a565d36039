//! Request handlers.

use axum::extract::{Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::charts::{build_profile_charts, ProfileChart};
use crate::client::ClientError;
use crate::filters::{
    build_search_params, search_chips, CatalogueOption, FilterCatalogue, FilterForm, FilterMap,
};
use crate::indicators::{load_indicator_charts, IndicatorCharts, IndicatorQuery};
use crate::journal::{JournalProfileState, ProfileSummary};
use crate::results::DataSourceKind;

/// Banner text shown for any failed indicator load.
pub const INDICATOR_ERROR: &str = "Error loading indicator data.";

/// Error body `{error}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Upstream failure; the detail is logged, the page gets `message`.
    fn upstream(err: ClientError, message: &str) -> Self {
        tracing::error!("{}: {}", message, err);
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.to_string(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct SourceParams {
    pub data_source: Option<String>,
    /// Width of the chart containers, for title wrapping.
    pub width: Option<u32>,
    /// Visible text of the selected breakdown option.
    pub breakdown_label: Option<String>,
}

impl SourceParams {
    fn data_source<'a>(&'a self, state: &'a AppState) -> &'a str {
        self.data_source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&state.default_data_source)
    }
}

/// Filter catalogue with standardized labels, each field sorted by label.
pub async fn filters(
    State(state): State<AppState>,
    Query(params): Query<SourceParams>,
) -> Result<Json<FilterCatalogue>, ApiError> {
    let data_source = params.data_source(&state);
    let raw = state
        .client
        .fetch_filters(data_source)
        .await
        .map_err(|e| ApiError::upstream(e, "Error loading filters."))?;

    let mut catalogue = FilterCatalogue::new();
    for (key, options) in raw.iter() {
        let mut options: Vec<CatalogueOption> = options
            .iter()
            .filter(|o| !o.value.is_empty())
            .map(|o| {
                CatalogueOption::new(o.value.clone(), state.labels.standardize(key, &o.label))
            })
            .collect();
        options.sort_by_cached_key(|o| o.label.to_lowercase());
        catalogue.insert(key, options);
    }
    Ok(Json(catalogue))
}

pub async fn indicator_charts(
    State(state): State<AppState>,
    Query(params): Query<SourceParams>,
    Json(filters): Json<FilterMap>,
) -> Result<Json<IndicatorCharts>, ApiError> {
    let query = IndicatorQuery {
        data_source: params.data_source(&state).to_string(),
        filters,
        breakdown_label: params.breakdown_label.clone(),
        width_px: Some(params.width.unwrap_or(state.chart_width_px)),
    };
    let page = load_indicator_charts(&state.client, &state.labels, &query)
        .await
        .map_err(|e| ApiError::upstream(e, INDICATOR_ERROR))?;
    Ok(Json(page))
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub total_results: u64,
    pub results_html: String,
    pub active_filters_html: String,
    pub active_filter_count: usize,
}

pub async fn search(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SearchPage>, ApiError> {
    let query = FilterMap::from_query(query.as_deref().unwrap_or_default());
    let index_name = query
        .get_str("index_name")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&state.default_data_source)
        .to_string();
    let text = query.get_str("search").unwrap_or_default().trim().to_string();

    let search_filters = state
        .client
        .search_filters(&index_name)
        .await
        .map_err(|e| ApiError::upstream(e, "Error loading filters."))?;
    let mut form = FilterForm::for_search(&search_filters);
    form.restore_from_url(&query);

    let params = build_search_params(&text, &index_name, &form);
    let response = state
        .client
        .search_results(&params)
        .await
        .map_err(|e| ApiError::upstream(e, "Error loading search results."))?;

    let chips = search_chips(&text, &form);
    Ok(Json(SearchPage {
        total_results: response.total_results,
        results_html: response.to_html(DataSourceKind::from_index(&index_name)),
        active_filters_html: chips.to_html(),
        active_filter_count: chips.count(),
    }))
}

#[derive(Debug, Serialize)]
pub struct JournalProfileResponse {
    pub state: JournalProfileState,
    pub summary: ProfileSummary,
    pub charts: Vec<ProfileChart>,
}

pub async fn journal_profile(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<JournalProfileResponse>, ApiError> {
    let query = FilterMap::from_query(query.as_deref().unwrap_or_default());
    let title = query
        .get_str("journal_title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("journal_title is required"))?
        .to_string();

    let mut profile = JournalProfileState::new(query.clone());
    profile.select_journal(
        &title,
        query.get_str("journal_issn").unwrap_or_default(),
        query.get_str("category_level"),
    );
    if let Some(category) = query.get_str("category_id") {
        profile.select_category(category, None);
    }
    if let Some(year) = query.get_str("publication_year") {
        profile.select_year(year);
    }

    let payload = state
        .client
        .journal_timeseries(&profile)
        .await
        .map_err(|e| ApiError::upstream(e, "Error loading journal metrics."))?;

    Ok(Json(JournalProfileResponse {
        summary: ProfileSummary::from_payload(&payload, &profile),
        charts: build_profile_charts(&payload),
        state: profile,
    }))
}
