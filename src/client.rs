//! HTTP client for the portal's aggregation and search endpoints.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Settings;
use crate::filters::{FilterCatalogue, IndicatorRequest, SearchFilters, Suggestion};
use crate::journal::JournalProfileState;
use crate::payload::{JournalPayload, ParseError, TimeSeriesPayload};
use crate::results::SearchResponse;

/// Errors talking to the portal.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error(transparent)]
    Backend(#[from] ParseError),
}

/// Typed access to every endpoint the pages consume.
pub struct PortalClient {
    base_url: String,
    journal_timeseries_path: String,
    csrf_token: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    results: Vec<Suggestion>,
}

impl PortalClient {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            journal_timeseries_path: settings.journal_timeseries_path.clone(),
            csrf_token: settings.csrf_token.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            error!("Portal returned HTTP {}: {}", status, body);
            return Err(ClientError::Status { status, body });
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Filter option catalogue of an indicators data source.
    pub async fn fetch_filters(&self, data_source: &str) -> Result<FilterCatalogue, ClientError> {
        debug!("Fetching filter catalogue for {}", data_source);
        let request = self
            .client
            .get(self.url("/search-gateway/filters/"))
            .query(&[("data_source", data_source)]);
        self.json(request).await
    }

    /// Search-as-you-type suggestions for one field.
    pub async fn search_item(
        &self,
        data_source: &str,
        field_name: &str,
        term: &str,
        category_level: Option<&str>,
    ) -> Result<Vec<Suggestion>, ClientError> {
        let mut query = vec![
            ("field_name", field_name),
            ("data_source", data_source),
            ("q", term),
        ];
        if field_name == "category_id" {
            if let Some(level) = category_level.filter(|l| !l.is_empty()) {
                query.push(("category_level", level));
            }
        }
        let request = self
            .client
            .get(self.url("/search-gateway/search-item/"))
            .query(&query);
        let response: SuggestionResponse = self.json(request).await?;
        Ok(response.results)
    }

    /// Aggregated time series for the filtered request.
    pub async fn indicator_data(
        &self,
        data_source: &str,
        request: &IndicatorRequest,
    ) -> Result<TimeSeriesPayload, ClientError> {
        debug!(
            "Requesting indicator data: source={} unit={} breakdown={:?}",
            data_source, request.study_unit, request.breakdown_variable
        );
        let mut builder = self
            .client
            .post(self.url("/indicators/data/"))
            .query(&[("data_source", data_source)])
            .json(request);
        if let Some(token) = &self.csrf_token {
            builder = builder.header("X-CSRFToken", token);
        }
        let value: Value = self.json(builder).await?;
        Ok(TimeSeriesPayload::from_value(&value)?)
    }

    /// The same breakdown without user filters, used as share baseline.
    pub async fn indicator_baseline(
        &self,
        data_source: &str,
        request: &IndicatorRequest,
    ) -> Result<TimeSeriesPayload, ClientError> {
        self.indicator_data(data_source, &request.baseline()).await
    }

    pub async fn journal_timeseries(
        &self,
        state: &JournalProfileState,
    ) -> Result<JournalPayload, ClientError> {
        debug!("Requesting journal timeseries for {:?}", state.journal_title);
        let request = self
            .client
            .get(self.url(&self.journal_timeseries_path))
            .query(&state.timeseries_query());
        let value: Value = self.json(request).await?;
        Ok(JournalPayload::from_value(&value)?)
    }

    /// Filter catalogue and field metadata of a search index.
    pub async fn search_filters(&self, index_name: &str) -> Result<SearchFilters, ClientError> {
        let request = self
            .client
            .get(self.url("/search/api/filters/"))
            .query(&[("index_name", index_name)]);
        self.json(request).await
    }

    pub async fn search_results(
        &self,
        params: &[(String, String)],
    ) -> Result<SearchResponse, ClientError> {
        let request = self
            .client
            .get(self.url("/search/api/search-results-list/"))
            .query(params);
        let response: SearchResponse = self.json(request).await?;
        if let Some(message) = response.error.as_ref().filter(|m| !m.trim().is_empty()) {
            return Err(ParseError::Backend(message.clone()).into());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let settings = Settings {
            base_url: "http://portal.test/".to_string(),
            ..Settings::default()
        };
        let client = PortalClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://portal.test");
        assert_eq!(
            client.url("/indicators/data/"),
            "http://portal.test/indicators/data/"
        );
        assert_eq!(client.url("x"), "http://portal.test/x");
    }

    #[test]
    fn test_backend_error_display() {
        let err: ClientError = ParseError::Backend("index missing".into()).into();
        assert_eq!(err.to_string(), "backend reported an error: index missing");
        let err = ClientError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }
}
