//! Indicator chart builders.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::catalogue::Metric;
use super::{
    axis_tooltip, grid, legend, toolbox, tooltip, Axis, ChartOptions, DataPoint, Length,
    SeriesOption, ShareDatum, Title,
};
use crate::filters::LabelLookup;
use crate::payload::{round_to, Series, StudyUnit, TimeSeriesPayload};

/// Subtitle of the share section.
pub const SHARE_SUBTITLE: &str = "Per year, filtered vs total baseline";

/// Presentation options for [`build_chart`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartRequest {
    pub title: String,
    pub subtitle: Option<String>,
    /// Plot the top-level totals even when the payload has a breakdown.
    pub disable_breakdown: bool,
    /// Label the value axis as a percentage.
    pub force_percent_axis: bool,
    /// Container width; titles are wrapped to fit when set.
    pub width_px: Option<u32>,
}

impl ChartRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Default title of `metric`; share metrics get the share-section setup.
    pub fn for_metric(metric: Metric) -> Self {
        let request = Self::new(metric.title());
        if metric.is_share() {
            request
                .with_subtitle(SHARE_SUBTITLE)
                .without_breakdown()
                .percent_axis()
        } else {
            request
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn without_breakdown(mut self) -> Self {
        self.disable_breakdown = true;
        self
    }

    pub fn percent_axis(mut self) -> Self {
        self.force_percent_axis = true;
        self
    }

    pub fn with_width(mut self, width_px: Option<u32>) -> Self {
        self.width_px = width_px;
        self
    }
}

/// Build the chart for one metric, or `None` when every value is zero.
pub fn build_chart(
    payload: &TimeSeriesPayload,
    metric: Metric,
    request: &ChartRequest,
) -> Option<ChartOptions> {
    let series: Vec<SeriesOption> =
        if payload.has_breakdown() && !request.disable_breakdown && !metric.is_share() {
            breakdown_series(payload, metric)
                .into_iter()
                .map(|s| SeriesOption::bar(s.name, &s.data).stacked())
                .collect()
        } else {
            vec![SeriesOption::bar(
                metric.spec().series_name,
                &metric.values(payload),
            )]
        };

    let names = series.iter().filter_map(|s| s.name.clone()).collect();
    let options = ChartOptions {
        title: Title::new(request.title.as_str()).with_subtext(request.subtitle.as_deref()),
        tooltip: Some(axis_tooltip()),
        grid: Some(grid()),
        toolbox: Some(toolbox(&["bar", "line"])),
        legend: legend(names),
        x_axis: Some(Axis::category(&payload.years)),
        y_axis: vec![if request.force_percent_axis {
            Axis::percent()
        } else {
            Axis::value()
        }],
        series,
        ..ChartOptions::titled("")
    };
    finish(options, request.width_px, metric.key())
}

/// Breakdown series carrying `metric`, suffix stripped, largest total first.
fn breakdown_series(payload: &TimeSeriesPayload, metric: Metric) -> Vec<Series> {
    let mut series = match metric {
        Metric::CitationsPerDocument => citations_per_document_series(&payload.series),
        _ => {
            let Some(suffix) = metric.spec().suffix else {
                return Vec::new();
            };
            let marker = format!(" ({})", suffix);
            payload
                .series
                .iter()
                .filter_map(|s| {
                    s.name
                        .strip_suffix(&marker)
                        .map(|category| Series::new(category, s.data.clone()))
                })
                .collect()
        }
    };
    sort_by_total(&mut series);
    series
}

/// Pair each `(Documents)` series with the `(Citations)` series of the same
/// category and divide per year.
fn citations_per_document_series(series: &[Series]) -> Vec<Series> {
    let citations: HashMap<&str, &Series> = series
        .iter()
        .filter_map(|s| s.name.strip_suffix(" (Citations)").map(|c| (c, s)))
        .collect();

    series
        .iter()
        .filter_map(|docs| {
            let category = docs.name.strip_suffix(" (Documents)")?;
            let partner = citations.get(category);
            let data = docs
                .data
                .iter()
                .enumerate()
                .map(|(i, &ndocs)| {
                    let cites = partner.and_then(|p| p.data.get(i)).copied().unwrap_or(0.0);
                    if ndocs > 0.0 {
                        round_to(cites / ndocs, 2)
                    } else {
                        0.0
                    }
                })
                .collect();
            Some(Series::new(category, data))
        })
        .collect()
}

/// Descending by total; equal totals keep their original order.
fn sort_by_total(series: &mut [Series]) {
    series.sort_by(|a, b| b.total().partial_cmp(&a.total()).unwrap_or(Ordering::Equal));
}

/// Label of the breakdown variable: the form label when known, otherwise
/// the key with underscores as spaces.
pub fn breakdown_label(payload: &TimeSeriesPayload, lookup: &dyn LabelLookup) -> String {
    let Some(variable) = payload.breakdown_variable.as_deref() else {
        return String::new();
    };
    lookup
        .label_for(variable)
        .or_else(|| payload.breakdown_field().and_then(|f| lookup.label_for(f)))
        .unwrap_or_else(|| variable.replace('_', " "))
}

/// Main chart of the indicators page: every breakdown series stacked, or the
/// yearly totals of the study unit.
pub fn build_main_chart(
    payload: &TimeSeriesPayload,
    study_unit: StudyUnit,
    breakdown: &str,
    width_px: Option<u32>,
) -> Option<ChartOptions> {
    let subtitle = Some(study_unit.subtitle());

    let options = if payload.has_breakdown() {
        let mut series = payload.series.clone();
        sort_by_total(&mut series);
        let names = series.iter().map(|s| s.name.clone()).collect();
        ChartOptions {
            title: Title::new(format!("Breakdown by {}", breakdown)).with_subtext(subtitle),
            tooltip: Some(axis_tooltip()),
            grid: Some(grid()),
            toolbox: Some(toolbox(&["line", "bar", "tiled"])),
            legend: legend(names),
            x_axis: Some(Axis::category(&payload.years)),
            y_axis: vec![Axis::value()],
            series: series
                .iter()
                .map(|s| SeriesOption::bar(s.name.as_str(), &s.data).stacked())
                .collect(),
            ..ChartOptions::titled("")
        }
    } else {
        let (title, metric) = match study_unit {
            StudyUnit::Citation => ("Number of Citations per Year", Metric::Citations),
            _ => ("Number of Documents per Year", Metric::Documents),
        };
        yearly_totals_chart(
            title,
            subtitle,
            SeriesOption::bar(metric.spec().series_name, &metric.values(payload)),
            &payload.years,
            Axis::value(),
        )
    };
    finish(options, width_px, "main")
}

/// Percentages within the filtered data: each category's share of the year
/// total, or each year's share of the whole period without breakdown.
pub fn build_within_percentage_chart(
    payload: &TimeSeriesPayload,
    study_unit: StudyUnit,
    breakdown: &str,
    width_px: Option<u32>,
) -> Option<ChartOptions> {
    let subtitle = Some(study_unit.subtitle());

    let options = if payload.has_breakdown() {
        let mut series = payload.series.clone();
        sort_by_total(&mut series);
        let year_totals: Vec<f64> = (0..payload.years.len())
            .map(|i| series.iter().filter_map(|s| s.data.get(i)).sum())
            .collect();
        let names = series.iter().map(|s| s.name.clone()).collect();
        ChartOptions {
            title: Title::new(format!(
                "Breakdown by {} (% within filtered data)",
                breakdown
            ))
            .with_subtext(subtitle),
            tooltip: Some(axis_tooltip()),
            grid: Some(grid()),
            toolbox: Some(toolbox(&["bar", "tiled"])),
            legend: legend(names),
            x_axis: Some(Axis::category(&payload.years)),
            y_axis: vec![Axis::percent()],
            series: series
                .iter()
                .map(|s| {
                    let pct: Vec<f64> = s
                        .data
                        .iter()
                        .zip(&year_totals)
                        .map(|(&v, &total)| percent_of(v, total))
                        .collect();
                    SeriesOption::bar(s.name.as_str(), &pct)
                        .stacked()
                        .focus_series()
                })
                .collect(),
            ..ChartOptions::titled("")
        }
    } else {
        let (title, metric) = match study_unit {
            StudyUnit::Citation => ("Percentage of Citations per Year", Metric::Citations),
            _ => ("Percentage of Documents per Year", Metric::Documents),
        };
        let values = metric.values(payload);
        let total: f64 = values.iter().sum();
        let pct: Vec<f64> = values.iter().map(|&v| percent_of(v, total)).collect();
        yearly_totals_chart(
            title,
            subtitle,
            SeriesOption::bar(metric.spec().series_name, &pct),
            &payload.years,
            Axis::percent(),
        )
    };
    finish(options, width_px, "within-percentage")
}

/// Breakdown values as a percentage of the same category in an unfiltered
/// baseline. Categories are matched by series name and years by label; a
/// zero baseline gives zero. Each point keeps both raw values.
pub fn build_baseline_share_chart(
    filtered: &TimeSeriesPayload,
    baseline: &TimeSeriesPayload,
    study_unit: StudyUnit,
    breakdown: &str,
    width_px: Option<u32>,
) -> Option<ChartOptions> {
    if !filtered.has_breakdown() {
        return None;
    }

    let mut base_by_name: HashMap<&str, HashMap<&str, f64>> = HashMap::new();
    for series in &baseline.series {
        let by_year = base_by_name.entry(series.name.as_str()).or_default();
        for (year, value) in baseline.years.iter().zip(&series.data) {
            by_year.insert(year.as_str(), *value);
        }
    }

    let mut series = filtered.series.clone();
    sort_by_total(&mut series);
    let names = series.iter().map(|s| s.name.clone()).collect();

    let series: Vec<SeriesOption> = series
        .iter()
        .map(|s| {
            let by_year = base_by_name.get(s.name.as_str());
            let data = filtered
                .years
                .iter()
                .zip(&s.data)
                .map(|(year, &value)| {
                    let base = by_year
                        .and_then(|m| m.get(year.as_str()))
                        .copied()
                        .unwrap_or(0.0);
                    DataPoint::Share(ShareDatum {
                        value: percent_of(value, base),
                        filtered: value,
                        baseline: base,
                    })
                })
                .collect();
            SeriesOption {
                data,
                ..SeriesOption::bar(s.name.as_str(), &[]).stacked().focus_series()
            }
        })
        .collect();

    let options = ChartOptions {
        title: Title::new(format!(
            "Breakdown by {} (% relative to unfiltered data)",
            breakdown
        ))
        .with_subtext(Some(study_unit.subtitle())),
        tooltip: Some(axis_tooltip()),
        grid: Some(grid()),
        toolbox: Some(toolbox(&["bar", "tiled"])),
        legend: legend(names),
        x_axis: Some(Axis::category(&filtered.years)),
        y_axis: vec![Axis::percent()],
        series,
        ..ChartOptions::titled("")
    };
    finish(options, width_px, "baseline-share")
}

fn yearly_totals_chart(
    title: &str,
    subtitle: Option<&str>,
    series: SeriesOption,
    years: &[String],
    y_axis: Axis,
) -> ChartOptions {
    let mut chart_grid = grid();
    chart_grid.bottom = Length::Percent("10%".to_string());
    ChartOptions {
        title: Title::new(title).with_subtext(subtitle),
        tooltip: Some(tooltip(None)),
        grid: Some(chart_grid),
        toolbox: Some(toolbox(&["line", "bar", "tiled"])),
        x_axis: Some(Axis::category(years)),
        y_axis: vec![y_axis],
        series: vec![series],
        ..ChartOptions::titled("")
    }
}

fn percent_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        round_to(value / total * 100.0, 2)
    }
}

fn finish(mut options: ChartOptions, width_px: Option<u32>, what: &str) -> Option<ChartOptions> {
    if options.is_all_zero() {
        debug!("Suppressing all-zero {} chart", what);
        return None;
    }
    if let Some(width) = width_px {
        options.wrap_titles(width);
    }
    Some(options)
}

/// One chart container of the indicators page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlot {
    /// Id of the chart element; its wrapper is `<container>-div`.
    pub container: String,
    pub metric: String,
    /// `None` hides the wrapper and disposes any previous chart.
    pub options: Option<ChartOptions>,
}

impl ChartSlot {
    pub fn wrapper_id(&self) -> String {
        format!("{}-div", self.container)
    }
}

/// All charts of the indicators page for one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSet {
    pub primary: Vec<ChartSlot>,
    pub shares: Vec<ChartSlot>,
    /// The share section is shown.
    pub shares_visible: bool,
}

impl ChartSet {
    pub fn slots(&self) -> impl Iterator<Item = &ChartSlot> {
        self.primary.iter().chain(self.shares.iter())
    }

    pub fn visible(&self) -> impl Iterator<Item = &ChartSlot> {
        self.slots().filter(|s| s.options.is_some())
    }
}

const DOCUMENT_CHARTS: &[(&str, Metric)] = &[
    ("docs-chart", Metric::Documents),
    ("citations-chart", Metric::Citations),
    ("citations-per-doc-chart", Metric::CitationsPerDocument),
    ("cited-docs-chart", Metric::CitedDocuments),
    ("pct-cited-docs-chart", Metric::PercentDocsWithCitations),
];

const SOURCE_CHARTS: &[(&str, Metric)] = &[
    ("periodicals-chart", Metric::Periodicals),
    ("docs-chart", Metric::DocumentsPerPeriodical),
    ("citations-chart", Metric::CitationsPerPeriodical),
    ("citations-per-doc-chart", Metric::CitedDocumentsPerPeriodical),
    ("pct-cited-docs-chart", Metric::PercentPeriodicalsWithCitedDocs),
];

const DOCUMENT_SHARE_CHARTS: &[(&str, Metric)] = &[
    ("docs-share-chart", Metric::DocumentsShare),
    ("citations-share-chart", Metric::CitationsShare),
    ("citations-per-doc-share-chart", Metric::CitationsPerDocumentShare),
    ("cited-docs-share-chart", Metric::CitedDocumentsShare),
    ("pct-cited-docs-share-chart", Metric::PercentDocsWithCitationsShare),
];

const SOURCE_SHARE_CHARTS: &[(&str, Metric)] = &[
    ("periodicals-share-chart", Metric::PeriodicalsShare),
    ("docs-share-chart", Metric::DocumentsPerSourceShare),
    ("citations-share-chart", Metric::CitationsPerSourceShare),
    ("citations-per-doc-share-chart", Metric::CitedDocumentsPerSourceShare),
    ("pct-cited-docs-share-chart", Metric::PercentSourcesWithCitedDocsShare),
];

/// Build every chart of the indicators page.
///
/// `breakdown_text` is the visible label of the selected breakdown option.
pub fn build_chart_set(
    payload: &TimeSeriesPayload,
    study_unit: StudyUnit,
    breakdown_text: Option<&str>,
    width_px: Option<u32>,
) -> ChartSet {
    let subtitle = breakdown_text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("per Year by {}", t));

    let (primary, shares) = if study_unit.is_source() {
        (SOURCE_CHARTS, SOURCE_SHARE_CHARTS)
    } else {
        (DOCUMENT_CHARTS, DOCUMENT_SHARE_CHARTS)
    };

    let primary = primary
        .iter()
        .map(|&(container, metric)| {
            let mut request = ChartRequest::new(metric.title()).with_width(width_px);
            request.subtitle = subtitle.clone();
            slot(container, metric, build_chart(payload, metric, &request))
        })
        .collect();

    let shares_enabled = payload.relative_metrics.is_visible();
    let shares: Vec<ChartSlot> = if shares_enabled {
        shares
            .iter()
            .map(|&(container, metric)| {
                let request = ChartRequest::for_metric(metric).with_width(width_px);
                slot(container, metric, build_chart(payload, metric, &request))
            })
            .collect()
    } else {
        shares.iter().map(|&(c, m)| slot(c, m, None)).collect()
    };
    let shares_visible = shares.iter().any(|s| s.options.is_some());

    ChartSet {
        primary,
        shares,
        shares_visible,
    }
}

fn slot(container: &str, metric: Metric, options: Option<ChartOptions>) -> ChartSlot {
    ChartSlot {
        container: container.to_string(),
        metric: metric.key().to_string(),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn breakdown_payload() -> TimeSeriesPayload {
        TimeSeriesPayload::from_value(&json!({
            "years": ["2020", "2021"],
            "breakdown_variable": "country",
            "series": [
                {"name": "PT (Documents)", "data": [1, 1]},
                {"name": "BR (Documents)", "data": [5, 4]},
                {"name": "AR (Documents)", "data": [2, 0]},
                {"name": "ES (Documents)", "data": [0, 2]},
                {"name": "PT (Citations)", "data": [3, 0]},
                {"name": "BR (Citations)", "data": [10, 0]},
                {"name": "AR (Cited Documents)", "data": [1, 0]},
            ],
            "ndocs_per_year": [8, 7],
        }))
        .unwrap()
    }

    fn names(options: &ChartOptions) -> Vec<String> {
        options.series.iter().filter_map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_breakdown_sorted_and_stacked() {
        let options = build_chart(
            &breakdown_payload(),
            Metric::Documents,
            &ChartRequest::new("Total Documents"),
        )
        .unwrap();

        // PT, AR and ES tie on 2 and keep their payload order.
        assert_eq!(names(&options), vec!["BR", "PT", "AR", "ES"]);
        assert!(options.series.iter().all(|s| s.stack.as_deref() == Some("total")));
        assert!(options.series.iter().all(|s| s.data.len() == 2));
        assert_eq!(options.legend.unwrap().data, vec!["BR", "PT", "AR", "ES"]);
    }

    #[test]
    fn test_citations_per_document_pairs_series() {
        let options = build_chart(
            &breakdown_payload(),
            Metric::CitationsPerDocument,
            &ChartRequest::new("Citations per Document"),
        )
        .unwrap();
        let by_name: HashMap<String, Vec<f64>> = options
            .series
            .iter()
            .map(|s| (s.name.clone().unwrap(), s.values()))
            .collect();
        assert_eq!(by_name["BR"], vec![2.0, 0.0]);
        assert_eq!(by_name["PT"], vec![3.0, 0.0]);
        // no citations series and a zero-document year
        assert_eq!(by_name["ES"], vec![0.0, 0.0]);
    }

    #[test]
    fn test_without_breakdown_uses_top_level_array() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2019", "2020", "2021"],
            "ndocs_per_year": [4, 0],
            "total_citations_per_year": [2, 0, 0],
        }))
        .unwrap();

        let docs = build_chart(&payload, Metric::Documents, &ChartRequest::new("t")).unwrap();
        assert_eq!(docs.series.len(), 1);
        assert_eq!(docs.series[0].values(), vec![4.0, 0.0, 0.0]);

        let cpd = build_chart(&payload, Metric::CitationsPerDocument, &ChartRequest::new("t"))
            .unwrap();
        assert_eq!(cpd.series[0].values(), vec![0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_disable_breakdown_plots_totals() {
        let request = ChartRequest::new("t").without_breakdown();
        let options = build_chart(&breakdown_payload(), Metric::Documents, &request).unwrap();
        assert_eq!(names(&options), vec!["Documents"]);
        assert_eq!(options.series[0].values(), vec![8.0, 7.0]);
    }

    #[test]
    fn test_all_zero_chart_suppressed() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020"],
            "ndocs_per_year": [0],
        }))
        .unwrap();
        assert!(build_chart(&payload, Metric::Documents, &ChartRequest::new("t")).is_none());
        assert!(build_chart(&payload, Metric::Periodicals, &ChartRequest::new("t")).is_none());
    }

    #[test]
    fn test_share_metric_forces_percent_axis() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020"],
            "breakdown_variable": "country",
            "relative_metrics": {"enabled": true, "docs_share_pct_per_year": [12.5]},
        }))
        .unwrap();
        let options = build_chart(
            &payload,
            Metric::DocumentsShare,
            &ChartRequest::for_metric(Metric::DocumentsShare),
        )
        .unwrap();
        assert_eq!(options.y_axis[0], Axis::percent());
        assert_eq!(options.series[0].values(), vec![12.5]);
        assert_eq!(options.title.subtext.as_deref(), Some(SHARE_SUBTITLE));
    }

    #[test]
    fn test_baseline_share_chart() {
        let filtered = breakdown_payload();
        let baseline = TimeSeriesPayload::from_value(&json!({
            "years": ["2021", "2020"],
            "breakdown_variable": "country",
            "series": [
                {"name": "BR (Documents)", "data": [8, 10]},
                {"name": "PT (Documents)", "data": [0, 4]},
            ],
        }))
        .unwrap();

        let options =
            build_baseline_share_chart(&filtered, &baseline, StudyUnit::Document, "Country", None)
                .unwrap();
        assert_eq!(
            options.title.text,
            "Breakdown by Country (% relative to unfiltered data)"
        );
        assert_eq!(options.series[0].name.as_deref(), Some("BR (Citations)"));
        let br = options
            .series
            .iter()
            .find(|s| s.name.as_deref() == Some("BR (Documents)"))
            .unwrap();
        assert_eq!(
            br.data[0],
            DataPoint::Share(ShareDatum {
                value: 50.0,
                filtered: 5.0,
                baseline: 10.0
            })
        );
        assert_eq!(br.values(), vec![50.0, 50.0]);

        let pt = options
            .series
            .iter()
            .find(|s| s.name.as_deref() == Some("PT (Documents)"))
            .unwrap();
        assert_eq!(pt.values(), vec![25.0, 0.0]);

        let no_breakdown = TimeSeriesPayload::default();
        assert!(build_baseline_share_chart(
            &no_breakdown,
            &baseline,
            StudyUnit::Document,
            "",
            None
        )
        .is_none());
    }

    #[test]
    fn test_within_percentage_chart() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020", "2021"],
            "breakdown_variable": "country",
            "series": [
                {"name": "A", "data": [1, 0]},
                {"name": "B", "data": [3, 0]},
            ],
        }))
        .unwrap();
        let options =
            build_within_percentage_chart(&payload, StudyUnit::Document, "Country", None).unwrap();
        assert_eq!(names(&options), vec!["B", "A"]);
        assert_eq!(options.series[0].values(), vec![75.0, 0.0]);
        assert_eq!(options.series[1].values(), vec![25.0, 0.0]);

        let totals = TimeSeriesPayload::from_value(&json!({
            "years": ["2020", "2021", "2022"],
            "total_citations_per_year": [1, 1, 1],
        }))
        .unwrap();
        let options =
            build_within_percentage_chart(&totals, StudyUnit::Citation, "", None).unwrap();
        assert_eq!(options.title.text, "Percentage of Citations per Year");
        assert_eq!(options.series[0].values(), vec![33.33, 33.33, 33.33]);
    }

    #[test]
    fn test_main_chart_titles() {
        let options =
            build_main_chart(&breakdown_payload(), StudyUnit::Citation, "Country", None).unwrap();
        assert_eq!(options.title.text, "Breakdown by Country");
        assert_eq!(options.title.subtext.as_deref(), Some("Study Unit: Citation"));
        assert_eq!(options.series[0].name.as_deref(), Some("BR (Citations)"));

        let totals = TimeSeriesPayload::from_value(&json!({
            "years": ["2020"],
            "ndocs_per_year": [3],
        }))
        .unwrap();
        let options = build_main_chart(&totals, StudyUnit::Document, "", None).unwrap();
        assert_eq!(options.title.text, "Number of Documents per Year");
        assert_eq!(options.grid.unwrap().bottom, Length::Percent("10%".into()));
    }

    #[test]
    fn test_breakdown_label_fallback() {
        let mut payload = breakdown_payload();
        payload.breakdown_variable = Some("document_language.enum".into());
        let mut labels: HashMap<String, String> = HashMap::new();
        assert_eq!(breakdown_label(&payload, &labels), "document language.enum");
        labels.insert("document_language".to_string(), "Language".to_string());
        assert_eq!(breakdown_label(&payload, &labels), "Language");
    }

    #[test]
    fn test_chart_set_document_unit() {
        let set = build_chart_set(&breakdown_payload(), StudyUnit::Document, Some("Country"), None);
        let containers: Vec<&str> = set.primary.iter().map(|s| s.container.as_str()).collect();
        assert_eq!(
            containers,
            vec![
                "docs-chart",
                "citations-chart",
                "citations-per-doc-chart",
                "cited-docs-chart",
                "pct-cited-docs-chart"
            ]
        );
        let docs = set.primary[0].options.as_ref().unwrap();
        assert_eq!(docs.title.subtext.as_deref(), Some("per Year by Country"));
        // no percent series in the payload
        assert!(set.primary[4].options.is_none());
        assert!(!set.shares_visible);
        assert!(set.shares.iter().all(|s| s.options.is_none()));
        assert_eq!(set.primary[0].wrapper_id(), "docs-chart-div");
    }

    #[test]
    fn test_chart_set_source_unit_with_shares() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020"],
            "nperiodicals_per_year": [12],
            "relative_metrics": {
                "enabled": true,
                "compared_filters": ["country"],
                "periodicals_share_pct_per_year": [30],
            },
        }))
        .unwrap();
        let set = build_chart_set(&payload, StudyUnit::Journal, None, None);
        assert_eq!(set.primary[0].container, "periodicals-chart");
        assert_eq!(set.primary[0].metric, "Periodicals");
        assert!(set.primary[0].options.as_ref().unwrap().title.subtext.is_none());
        assert!(set.shares_visible);
        assert_eq!(set.shares[0].container, "periodicals-share-chart");
        assert!(set.shares[0].options.is_some());
        assert!(set.shares[1].options.is_none());
        assert_eq!(set.visible().count(), 2);
    }

    #[test]
    fn test_narrow_container_wraps_title() {
        let request = ChartRequest::new("% Documents With ≥1 Citation Share (%) per Year")
            .with_width(Some(200));
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020"],
            "ndocs_per_year": [1],
        }))
        .unwrap();
        let options = build_chart(&payload, Metric::Documents, &request).unwrap();
        assert!(options.title.text.contains('\n'));
        assert!(options.title.text.lines().all(|l| l.chars().count() <= 20));
    }
}
