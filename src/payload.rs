//! Typed views of the aggregation responses.
//!
//! Responses are validated once, here. After [`TimeSeriesPayload::from_value`]
//! every metric vector has exactly one value per year, so chart code can index
//! by year without checking lengths.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::labels::LabelStandardizer;

/// Shape problems in an aggregation response.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("`years` is missing or not an array")]
    YearsNotArray,

    #[error("backend reported an error: {0}")]
    Backend(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Unit the indicators are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyUnit {
    #[default]
    Document,
    Citation,
    Source,
    Journal,
}

impl StudyUnit {
    /// Unknown values fall back to `Document`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "citation" => StudyUnit::Citation,
            "source" => StudyUnit::Source,
            "journal" => StudyUnit::Journal,
            _ => StudyUnit::Document,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyUnit::Document => "document",
            StudyUnit::Citation => "citation",
            StudyUnit::Source => "source",
            StudyUnit::Journal => "journal",
        }
    }

    /// Sources and journals are counted per periodical.
    pub fn is_source(&self) -> bool {
        matches!(self, StudyUnit::Source | StudyUnit::Journal)
    }

    /// Subtitle of the breakdown charts.
    pub fn subtitle(&self) -> &'static str {
        match self {
            StudyUnit::Citation => "Study Unit: Citation",
            _ => "Study Unit: Document",
        }
    }
}

/// One named series, aligned to the payload years.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Shares of the filtered data relative to the unfiltered baseline, in
/// percent per year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelativeMetrics {
    pub enabled: bool,
    pub compared_filters: Vec<String>,
    pub docs_share_pct_per_year: Vec<f64>,
    pub citations_share_pct_per_year: Vec<f64>,
    pub citations_per_doc_share_pct_per_year: Vec<f64>,
    pub cited_docs_share_pct_per_year: Vec<f64>,
    pub pct_docs_with_citations_share_pct_per_year: Vec<f64>,
    pub periodicals_share_pct_per_year: Vec<f64>,
    pub docs_per_source_share_pct_per_year: Vec<f64>,
    pub citations_per_source_share_pct_per_year: Vec<f64>,
    pub cited_docs_per_source_share_pct_per_year: Vec<f64>,
    pub pct_sources_with_cited_docs_share_pct_per_year: Vec<f64>,
}

impl RelativeMetrics {
    fn from_value(value: &Value, len: usize) -> Self {
        let field = |key: &str| numbers(value.get(key), len);
        let compared_filters = value
            .get("compared_filters")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(obj) => obj
                            .get("label")
                            .or_else(|| obj.get("key"))
                            .and_then(scalar),
                        other => scalar(other),
                    })
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            enabled: value.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            compared_filters,
            docs_share_pct_per_year: field("docs_share_pct_per_year"),
            citations_share_pct_per_year: field("citations_share_pct_per_year"),
            citations_per_doc_share_pct_per_year: field("citations_per_doc_share_pct_per_year"),
            cited_docs_share_pct_per_year: field("cited_docs_share_pct_per_year"),
            pct_docs_with_citations_share_pct_per_year: field(
                "pct_docs_with_citations_share_pct_per_year",
            ),
            periodicals_share_pct_per_year: field("periodicals_share_pct_per_year"),
            docs_per_source_share_pct_per_year: field("docs_per_source_share_pct_per_year"),
            citations_per_source_share_pct_per_year: field(
                "citations_per_source_share_pct_per_year",
            ),
            cited_docs_per_source_share_pct_per_year: field(
                "cited_docs_per_source_share_pct_per_year",
            ),
            pct_sources_with_cited_docs_share_pct_per_year: field(
                "pct_sources_with_cited_docs_share_pct_per_year",
            ),
        }
    }

    /// Compare a filtered payload with its unfiltered baseline year by year.
    ///
    /// Baseline values are matched on the year label, not on position.
    pub fn compute(
        filtered: &TimeSeriesPayload,
        baseline: &TimeSeriesPayload,
        study_unit: StudyUnit,
        compared_filters: Vec<String>,
    ) -> Self {
        if filtered.years.is_empty() {
            return Self::default();
        }
        let years = &filtered.years;
        let base = |values: &[f64]| align_series_to_years(years, &baseline.years, values);

        let filtered_cpd =
            citations_per_document(&filtered.total_citations_per_year, &filtered.ndocs_per_year);
        let baseline_cpd = citations_per_document(
            &base(&baseline.total_citations_per_year),
            &base(&baseline.ndocs_per_year),
        );

        let mut metrics = Self {
            enabled: true,
            compared_filters,
            docs_share_pct_per_year: relative_percent(
                &filtered.ndocs_per_year,
                &base(&baseline.ndocs_per_year),
            ),
            citations_share_pct_per_year: relative_percent(
                &filtered.total_citations_per_year,
                &base(&baseline.total_citations_per_year),
            ),
            citations_per_doc_share_pct_per_year: relative_percent(&filtered_cpd, &baseline_cpd),
            cited_docs_share_pct_per_year: relative_percent(
                &filtered.docs_with_citations_per_year,
                &base(&baseline.docs_with_citations_per_year),
            ),
            pct_docs_with_citations_share_pct_per_year: relative_percent(
                &filtered.percent_docs_with_citations_per_year,
                &base(&baseline.percent_docs_with_citations_per_year),
            ),
            ..Self::default()
        };

        if study_unit.is_source() {
            metrics.periodicals_share_pct_per_year = relative_percent(
                &filtered.nperiodicals_per_year,
                &base(&baseline.nperiodicals_per_year),
            );
            metrics.docs_per_source_share_pct_per_year = relative_percent(
                &filtered.docs_per_periodical_per_year,
                &base(&baseline.docs_per_periodical_per_year),
            );
            metrics.citations_per_source_share_pct_per_year = relative_percent(
                &filtered.citations_per_periodical_per_year,
                &base(&baseline.citations_per_periodical_per_year),
            );
            metrics.cited_docs_per_source_share_pct_per_year = relative_percent(
                &filtered.cited_docs_per_periodical_per_year,
                &base(&baseline.cited_docs_per_periodical_per_year),
            );
            metrics.pct_sources_with_cited_docs_share_pct_per_year = relative_percent(
                &filtered.percent_periodicals_with_cited_docs_per_year,
                &base(&baseline.percent_periodicals_with_cited_docs_per_year),
            );
        } else {
            let len = years.len();
            metrics.periodicals_share_pct_per_year = vec![0.0; len];
            metrics.docs_per_source_share_pct_per_year = vec![0.0; len];
            metrics.citations_per_source_share_pct_per_year = vec![0.0; len];
            metrics.cited_docs_per_source_share_pct_per_year = vec![0.0; len];
            metrics.pct_sources_with_cited_docs_share_pct_per_year = vec![0.0; len];
        }

        metrics
    }

    /// Shares are shown only when enabled and at least one filter was compared.
    pub fn is_visible(&self) -> bool {
        self.enabled && !self.compared_filters.is_empty()
    }
}

/// Indicator payload for the charts page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeriesPayload {
    pub years: Vec<String>,
    pub series: Vec<Series>,
    pub breakdown_variable: Option<String>,
    pub breakdown_keys: Vec<String>,
    pub ndocs_per_year: Vec<f64>,
    pub total_citations_per_year: Vec<f64>,
    pub docs_with_citations_per_year: Vec<f64>,
    pub percent_docs_with_citations_per_year: Vec<f64>,
    pub nperiodicals_per_year: Vec<f64>,
    pub periodicals_with_cited_docs_per_year: Vec<f64>,
    pub docs_per_periodical_per_year: Vec<f64>,
    pub citations_per_periodical_per_year: Vec<f64>,
    pub cited_docs_per_periodical_per_year: Vec<f64>,
    pub percent_periodicals_with_cited_docs_per_year: Vec<f64>,
    pub relative_metrics: RelativeMetrics,
    /// Set once breakdown labels have been replaced with display names.
    #[serde(skip)]
    pub labels_standardized: bool,
}

impl TimeSeriesPayload {
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Validate a response and align every vector to `years`.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let obj = value.as_object().ok_or(ParseError::NotAnObject)?;
        if let Some(message) = backend_error(value) {
            return Err(ParseError::Backend(message));
        }

        let years: Vec<String> = obj
            .get("years")
            .and_then(Value::as_array)
            .ok_or(ParseError::YearsNotArray)?
            .iter()
            .map(|y| scalar(y).unwrap_or_default())
            .collect();
        let len = years.len();

        let series: Vec<Series> = obj
            .get("series")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let name = item.get("name").and_then(scalar)?;
                        Some(Series::new(name, numbers(item.get("data"), len)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let breakdown_variable = obj
            .get("breakdown_variable")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let breakdown_keys = obj
            .get("breakdown_keys")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(scalar).collect())
            .unwrap_or_default();

        let field = |key: &str| numbers(obj.get(key), len);

        let relative_metrics = obj
            .get("relative_metrics")
            .filter(|v| v.is_object())
            .map(|v| RelativeMetrics::from_value(v, len))
            .unwrap_or_default();

        debug!(
            "Parsed indicator payload: {} years, {} series, breakdown {:?}",
            len,
            series.len(),
            breakdown_variable
        );

        Ok(Self {
            ndocs_per_year: field("ndocs_per_year"),
            total_citations_per_year: field("total_citations_per_year"),
            docs_with_citations_per_year: field("docs_with_citations_per_year"),
            percent_docs_with_citations_per_year: field("percent_docs_with_citations_per_year"),
            nperiodicals_per_year: field("nperiodicals_per_year"),
            periodicals_with_cited_docs_per_year: field("periodicals_with_cited_docs_per_year"),
            docs_per_periodical_per_year: field("docs_per_periodical_per_year"),
            citations_per_periodical_per_year: field("citations_per_periodical_per_year"),
            cited_docs_per_periodical_per_year: field("cited_docs_per_periodical_per_year"),
            percent_periodicals_with_cited_docs_per_year: field(
                "percent_periodicals_with_cited_docs_per_year",
            ),
            years,
            series,
            breakdown_variable,
            breakdown_keys,
            relative_metrics,
            labels_standardized: false,
        })
    }

    /// Breakdown variable without its `.enum` suffix.
    pub fn breakdown_field(&self) -> Option<&str> {
        self.breakdown_variable
            .as_deref()
            .map(|v| v.strip_suffix(".enum").unwrap_or(v))
    }

    pub fn has_breakdown(&self) -> bool {
        self.breakdown_variable.is_some()
    }
}

/// Replace country and language codes in breakdown keys and series names with
/// display names. Metric suffixes such as `" (Documents)"` are kept. Applying
/// it twice is a no-op.
pub fn friendly_breakdown_labels(payload: &mut TimeSeriesPayload, labels: &LabelStandardizer) {
    if payload.labels_standardized {
        return;
    }
    payload.labels_standardized = true;
    let field = match payload.breakdown_field() {
        Some(field @ ("country" | "document_language")) => field.to_string(),
        _ => return,
    };

    for key in &mut payload.breakdown_keys {
        *key = labels.standardize(&field, key);
    }
    for series in &mut payload.series {
        series.name = labels.standardize(&field, &series.name);
    }
}

/// Per-year snapshot of one journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JournalSnapshot {
    pub publication_year: Option<i32>,
    pub journal_publications_count: Option<f64>,
    pub journal_citations_total: Option<f64>,
    pub journal_citations_mean: Option<f64>,
    pub journal_impact_normalized: Option<f64>,
    pub top_10pct_all_time_publications_share_pct: Option<f64>,
    pub country: Option<String>,
    pub publisher_name: Option<String>,
    pub collection: Option<String>,
    pub is_scielo: bool,
    pub is_scopus: bool,
    pub is_wos: bool,
    pub is_doaj: bool,
    pub is_openalex: bool,
    pub is_journal_multilingual: bool,
}

impl JournalSnapshot {
    fn from_value(value: &Value) -> Self {
        let num = |key: &str| value.get(key).and_then(optional_number);
        let text = |key: &str| {
            value
                .get(key)
                .and_then(scalar)
                .filter(|s| !s.trim().is_empty())
        };
        let flag = |key: &str| value.get(key).map(truthy).unwrap_or(false);
        Self {
            publication_year: num("publication_year").map(|y| y as i32),
            journal_publications_count: num("journal_publications_count"),
            journal_citations_total: num("journal_citations_total"),
            journal_citations_mean: num("journal_citations_mean"),
            journal_impact_normalized: num("journal_impact_normalized"),
            top_10pct_all_time_publications_share_pct: num(
                "top_10pct_all_time_publications_share_pct",
            ),
            country: text("country"),
            publisher_name: text("publisher_name"),
            collection: text("collection"),
            is_scielo: flag("is_scielo"),
            is_scopus: flag("is_scopus"),
            is_wos: flag("is_wos"),
            is_doaj: flag("is_doaj"),
            is_openalex: flag("is_openalex"),
            is_journal_multilingual: flag("is_journal_multilingual"),
        }
    }
}

/// Aggregates of one category for the journal radar charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorySpoke {
    pub category: String,
    pub publications_total: f64,
    pub citations_total: f64,
    pub citations_mean: f64,
}

/// Journal profile payload: annual snapshots plus per-year metric arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JournalPayload {
    pub journal_title: Option<String>,
    pub journal_issn: Option<String>,
    pub journal_id: Option<String>,
    pub publisher_name: Option<String>,
    pub country: Option<String>,
    pub collection: Option<String>,
    pub years: Vec<String>,
    pub journal_publications_count_per_year: Vec<f64>,
    pub journal_citations_total_per_year: Vec<f64>,
    pub journal_citations_mean_per_year: Vec<f64>,
    pub journal_citations_mean_window_2y_per_year: Vec<f64>,
    pub journal_citations_mean_window_3y_per_year: Vec<f64>,
    pub journal_citations_mean_window_5y_per_year: Vec<f64>,
    pub journal_impact_normalized_per_year: Vec<f64>,
    pub journal_impact_normalized_window_2y_per_year: Vec<f64>,
    pub journal_impact_normalized_window_3y_per_year: Vec<f64>,
    pub journal_impact_normalized_window_5y_per_year: Vec<f64>,
    pub top_1pct_all_time_publications_share_pct_per_year: Vec<f64>,
    pub top_5pct_all_time_publications_share_pct_per_year: Vec<f64>,
    pub top_10pct_all_time_publications_share_pct_per_year: Vec<f64>,
    pub top_50pct_all_time_publications_share_pct_per_year: Vec<f64>,
    pub latest_year: Option<i32>,
    pub latest_year_metrics: Option<JournalSnapshot>,
    pub annual_snapshots: Vec<JournalSnapshot>,
    pub available_categories: Vec<String>,
    pub selected_category_id: Option<String>,
    pub selected_category_level: Option<String>,
    pub category_publications_spider: Vec<CategorySpoke>,
}

impl JournalPayload {
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let obj = value.as_object().ok_or(ParseError::NotAnObject)?;
        if let Some(message) = backend_error(value) {
            return Err(ParseError::Backend(message));
        }
        let years: Vec<String> = obj
            .get("years")
            .and_then(Value::as_array)
            .ok_or(ParseError::YearsNotArray)?
            .iter()
            .map(|y| scalar(y).unwrap_or_default())
            .collect();
        let len = years.len();
        let field = |key: &str| numbers(obj.get(key), len);
        let text = |key: &str| obj.get(key).and_then(scalar).filter(|s| !s.is_empty());

        let annual_snapshots = obj
            .get("annual_snapshots")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(JournalSnapshot::from_value).collect())
            .unwrap_or_default();
        let latest_year_metrics = obj
            .get("latest_year_metrics")
            .filter(|v| v.as_object().map(|o| !o.is_empty()).unwrap_or(false))
            .map(JournalSnapshot::from_value);

        let category_publications_spider = obj
            .get("category_publications_spider")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let category = item.get("category").and_then(scalar)?;
                        Some(CategorySpoke {
                            category,
                            publications_total: item.get("publications_total").map(number).unwrap_or(0.0),
                            citations_total: item.get("citations_total").map(number).unwrap_or(0.0),
                            citations_mean: item.get("citations_mean").map(number).unwrap_or(0.0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            journal_title: text("journal_title"),
            journal_issn: text("journal_issn"),
            journal_id: text("journal_id"),
            publisher_name: text("publisher_name"),
            country: text("country"),
            collection: text("collection"),
            journal_publications_count_per_year: field("journal_publications_count_per_year"),
            journal_citations_total_per_year: field("journal_citations_total_per_year"),
            journal_citations_mean_per_year: field("journal_citations_mean_per_year"),
            journal_citations_mean_window_2y_per_year: field(
                "journal_citations_mean_window_2y_per_year",
            ),
            journal_citations_mean_window_3y_per_year: field(
                "journal_citations_mean_window_3y_per_year",
            ),
            journal_citations_mean_window_5y_per_year: field(
                "journal_citations_mean_window_5y_per_year",
            ),
            journal_impact_normalized_per_year: field("journal_impact_normalized_per_year"),
            journal_impact_normalized_window_2y_per_year: field(
                "journal_impact_normalized_window_2y_per_year",
            ),
            journal_impact_normalized_window_3y_per_year: field(
                "journal_impact_normalized_window_3y_per_year",
            ),
            journal_impact_normalized_window_5y_per_year: field(
                "journal_impact_normalized_window_5y_per_year",
            ),
            top_1pct_all_time_publications_share_pct_per_year: field(
                "top_1pct_all_time_publications_share_pct_per_year",
            ),
            top_5pct_all_time_publications_share_pct_per_year: field(
                "top_5pct_all_time_publications_share_pct_per_year",
            ),
            top_10pct_all_time_publications_share_pct_per_year: field(
                "top_10pct_all_time_publications_share_pct_per_year",
            ),
            top_50pct_all_time_publications_share_pct_per_year: field(
                "top_50pct_all_time_publications_share_pct_per_year",
            ),
            latest_year: obj
                .get("latest_year")
                .and_then(optional_number)
                .map(|y| y as i32),
            latest_year_metrics,
            annual_snapshots,
            available_categories: obj
                .get("available_categories")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(scalar).collect())
                .unwrap_or_default(),
            selected_category_id: text("selected_category_id"),
            selected_category_level: text("selected_category_level"),
            category_publications_spider,
            years,
        })
    }
}

/// Reorder `values` (positional to `source_years`) onto `reference_years`;
/// years missing from the source get zero.
pub fn align_series_to_years(
    reference_years: &[String],
    source_years: &[String],
    values: &[f64],
) -> Vec<f64> {
    reference_years
        .iter()
        .map(|year| {
            source_years
                .iter()
                .position(|y| y == year)
                .and_then(|idx| values.get(idx).copied())
                .unwrap_or(0.0)
        })
        .collect()
}

/// `filtered / baseline * 100` per position, two decimals; a non-positive
/// baseline gives zero.
pub fn relative_percent(filtered: &[f64], baseline: &[f64]) -> Vec<f64> {
    filtered
        .iter()
        .zip(baseline)
        .map(|(&f, &b)| if b <= 0.0 { 0.0 } else { round_to(f / b * 100.0, 2) })
        .collect()
}

/// Citations divided by documents per position, four decimals.
pub fn citations_per_document(citations: &[f64], docs: &[f64]) -> Vec<f64> {
    citations
        .iter()
        .zip(docs)
        .map(|(&c, &d)| if d == 0.0 { 0.0 } else { round_to(c / d, 4) })
        .collect()
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn backend_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn optional_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Bool(true) => 1.0,
        other => optional_number(other).unwrap_or(0.0),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

/// Numeric vector of exactly `len` values: nulls and junk become zero, short
/// input is padded, long input truncated.
fn numbers(value: Option<&Value>, len: usize) -> Vec<f64> {
    let mut out: Vec<f64> = match value {
        Some(Value::Array(items)) => {
            if items.len() != len {
                debug!("Aligning vector of {} values to {} years", items.len(), len);
            }
            items.iter().take(len).map(number).collect()
        }
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!("Expected an array of numbers, got {}", other);
            Vec::new()
        }
    };
    out.resize(len, 0.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_years_must_be_an_array() {
        let err = TimeSeriesPayload::from_value(&json!({"years": "2020"})).unwrap_err();
        assert!(matches!(err, ParseError::YearsNotArray));
        let err = TimeSeriesPayload::from_value(&json!({"series": []})).unwrap_err();
        assert!(matches!(err, ParseError::YearsNotArray));
        let err = TimeSeriesPayload::from_value(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ParseError::NotAnObject));
    }

    #[test]
    fn test_backend_error_field() {
        let err = TimeSeriesPayload::from_value(&json!({"error": "index down", "years": []}))
            .unwrap_err();
        assert_eq!(err.to_string(), "backend reported an error: index down");

        let ok = TimeSeriesPayload::from_value(&json!({"error": null, "years": []}));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_vectors_aligned_to_years() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2019", 2020, "2021"],
            "ndocs_per_year": [1, null, "3", 99],
            "total_citations_per_year": [5],
            "series": [{"name": "BR (Documents)", "data": [1]}, {"data": [2]}],
        }))
        .unwrap();

        assert_eq!(payload.years, vec!["2019", "2020", "2021"]);
        assert_eq!(payload.ndocs_per_year, vec![1.0, 0.0, 3.0]);
        assert_eq!(payload.total_citations_per_year, vec![5.0, 0.0, 0.0]);
        assert_eq!(payload.nperiodicals_per_year, vec![0.0; 3]);
        assert_eq!(payload.series.len(), 1);
        assert_eq!(payload.series[0].data, vec![1.0, 0.0, 0.0]);
        assert!(!payload.relative_metrics.enabled);
    }

    #[test]
    fn test_relative_metrics_parsed() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020", "2021"],
            "relative_metrics": {
                "enabled": true,
                "compared_filters": ["country", {"label": "Language"}],
                "docs_share_pct_per_year": [12.5],
            },
        }))
        .unwrap();
        let rm = &payload.relative_metrics;
        assert!(rm.is_visible());
        assert_eq!(rm.compared_filters, vec!["country", "Language"]);
        assert_eq!(rm.docs_share_pct_per_year, vec![12.5, 0.0]);
        assert_eq!(rm.periodicals_share_pct_per_year, vec![0.0, 0.0]);
    }

    #[test]
    fn test_breakdown_field_strips_enum() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": [],
            "breakdown_variable": "country.enum",
        }))
        .unwrap();
        assert_eq!(payload.breakdown_field(), Some("country"));
        assert!(payload.has_breakdown());
    }

    #[test]
    fn test_friendly_labels_once() {
        let mut payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020"],
            "breakdown_variable": "country",
            "breakdown_keys": ["BR", "pt"],
            "series": [{"name": "BR (Documents)", "data": [3]}],
        }))
        .unwrap();
        let labels = LabelStandardizer::default();
        friendly_breakdown_labels(&mut payload, &labels);
        assert_eq!(payload.breakdown_keys, vec!["Brazil", "Portugal"]);
        assert_eq!(payload.series[0].name, "Brazil (Documents)");

        friendly_breakdown_labels(&mut payload, &labels);
        assert_eq!(payload.series[0].name, "Brazil (Documents)");
    }

    #[test]
    fn test_friendly_labels_skip_other_variables() {
        let mut payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020"],
            "breakdown_variable": "publisher",
            "series": [{"name": "BR (Documents)", "data": [3]}],
        }))
        .unwrap();
        friendly_breakdown_labels(&mut payload, &LabelStandardizer::default());
        assert_eq!(payload.series[0].name, "BR (Documents)");
    }

    #[test]
    fn test_align_series_to_years() {
        let reference = vec!["2020".to_string(), "2021".to_string(), "2022".to_string()];
        let source = vec!["2022".to_string(), "2020".to_string()];
        assert_eq!(
            align_series_to_years(&reference, &source, &[7.0, 3.0]),
            vec![3.0, 0.0, 7.0]
        );
        assert_eq!(align_series_to_years(&reference, &[], &[]), vec![0.0; 3]);
    }

    #[test]
    fn test_relative_percent_zero_baseline() {
        assert_eq!(
            relative_percent(&[1.0, 5.0, 2.0], &[3.0, 0.0, 8.0]),
            vec![33.33, 0.0, 25.0]
        );
        assert_eq!(citations_per_document(&[10.0, 4.0], &[3.0, 0.0]), vec![3.3333, 0.0]);
    }

    #[test]
    fn test_compute_relative_metrics() {
        let filtered = TimeSeriesPayload::from_value(&json!({
            "years": ["2020", "2021"],
            "ndocs_per_year": [5, 0],
            "total_citations_per_year": [10, 0],
        }))
        .unwrap();
        let baseline = TimeSeriesPayload::from_value(&json!({
            "years": ["2019", "2020", "2021"],
            "ndocs_per_year": [100, 20, 40],
            "total_citations_per_year": [0, 80, 40],
        }))
        .unwrap();

        let rm = RelativeMetrics::compute(
            &filtered,
            &baseline,
            StudyUnit::Document,
            vec!["country".into()],
        );
        assert!(rm.is_visible());
        assert_eq!(rm.docs_share_pct_per_year, vec![25.0, 0.0]);
        assert_eq!(rm.citations_share_pct_per_year, vec![12.5, 0.0]);
        // 2.0 citations per doc against 4.0 in the baseline
        assert_eq!(rm.citations_per_doc_share_pct_per_year, vec![50.0, 0.0]);

        let empty = RelativeMetrics::compute(
            &TimeSeriesPayload::default(),
            &baseline,
            StudyUnit::Document,
            Vec::new(),
        );
        assert!(!empty.enabled);
    }

    #[test]
    fn test_journal_payload() {
        let payload = JournalPayload::from_value(&json!({
            "journal_title": "Rev. Saúde Pública",
            "journal_issn": "0034-8910",
            "years": ["2019", "2020"],
            "journal_publications_count_per_year": [120, 140],
            "latest_year": 2020,
            "latest_year_metrics": {"publication_year": 2020, "is_scielo": true},
            "annual_snapshots": [
                {"publication_year": 2019, "journal_citations_mean": "1.5", "is_wos": 1},
                {"publication_year": 2020}
            ],
            "category_publications_spider": [
                {"category": "Medicine", "publications_total": 40, "citations_mean": null},
                {"publications_total": 3}
            ],
        }))
        .unwrap();

        assert_eq!(payload.journal_publications_count_per_year, vec![120.0, 140.0]);
        assert_eq!(payload.journal_citations_total_per_year, vec![0.0, 0.0]);
        assert_eq!(payload.latest_year, Some(2020));
        assert!(payload.latest_year_metrics.as_ref().unwrap().is_scielo);
        assert_eq!(payload.annual_snapshots[0].journal_citations_mean, Some(1.5));
        assert!(payload.annual_snapshots[0].is_wos);
        assert_eq!(payload.annual_snapshots[1].journal_citations_mean, None);
        assert_eq!(payload.category_publications_spider.len(), 1);
        assert_eq!(payload.category_publications_spider[0].citations_mean, 0.0);
    }

    #[test]
    fn test_study_unit() {
        assert_eq!(StudyUnit::parse("Journal"), StudyUnit::Journal);
        assert_eq!(StudyUnit::parse("bogus"), StudyUnit::Document);
        assert!(StudyUnit::Source.is_source());
        assert_eq!(StudyUnit::Citation.subtitle(), "Study Unit: Citation");
    }
}
