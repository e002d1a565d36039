//! Indicators page pipeline: fetch, relabel, compare with the baseline and
//! build every chart plus the applied-filters panel.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::charts::{
    breakdown_label, build_baseline_share_chart, build_chart_set, build_main_chart,
    build_within_percentage_chart, ChartOptions, ChartSet,
};
use crate::client::{ClientError, PortalClient};
use crate::filters::{
    has_other_filters, indicator_field_labels, is_user_filter, render_applied, AppliedFilters,
    FilterMap, IndicatorRequest,
};
use crate::labels::LabelStandardizer;
use crate::payload::{friendly_breakdown_labels, RelativeMetrics, StudyUnit, TimeSeriesPayload};

/// Everything the indicators page renders after one submit.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorCharts {
    pub charts: ChartSet,
    pub main_chart: Option<ChartOptions>,
    pub within_chart: Option<ChartOptions>,
    /// Share of the unfiltered data; only with a breakdown and user filters.
    pub outer_chart: Option<ChartOptions>,
    pub breakdown_label: String,
    pub applied_filters: AppliedFilters,
    pub applied_filters_html: String,
}

/// Options of one indicators load.
#[derive(Debug, Clone, Default)]
pub struct IndicatorQuery {
    pub data_source: String,
    pub filters: FilterMap,
    /// Visible text of the selected breakdown option.
    pub breakdown_label: Option<String>,
    pub width_px: Option<u32>,
}

pub async fn load_indicator_charts(
    client: &PortalClient,
    labels: &LabelStandardizer,
    query: &IndicatorQuery,
) -> Result<IndicatorCharts, ClientError> {
    let filters = &query.filters;
    let study_unit = StudyUnit::parse(filters.get_str("study_unit").unwrap_or_default());
    let request = IndicatorRequest::new(study_unit.as_str(), filters.clone());

    let payload = client.indicator_data(&query.data_source, &request).await?;

    let baseline = if has_other_filters(filters)
        && (payload.has_breakdown() || !payload.relative_metrics.enabled)
    {
        match client.indicator_baseline(&query.data_source, &request).await {
            Ok(baseline) => Some(baseline),
            Err(e) => {
                warn!("Baseline request failed, skipping share charts: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(assemble(payload, baseline, study_unit, labels, query))
}

/// Build the page from a payload and its optional unfiltered baseline.
pub fn assemble(
    mut payload: TimeSeriesPayload,
    mut baseline: Option<TimeSeriesPayload>,
    study_unit: StudyUnit,
    labels: &LabelStandardizer,
    query: &IndicatorQuery,
) -> IndicatorCharts {
    friendly_breakdown_labels(&mut payload, labels);
    if let Some(baseline) = baseline.as_mut() {
        friendly_breakdown_labels(baseline, labels);
    }

    let field_labels = indicator_field_labels(&query.data_source);
    let applied = render_applied(&query.filters, &field_labels, labels);

    if let Some(baseline) = &baseline {
        let compared: Vec<String> = applied
            .groups
            .iter()
            .filter(|g| is_user_filter(&g.key))
            .map(|g| g.label.clone())
            .collect();
        if !payload.relative_metrics.enabled && !compared.is_empty() {
            debug!("Computing relative metrics against the baseline");
            payload.relative_metrics =
                RelativeMetrics::compute(&payload, baseline, study_unit, compared);
        }
    }

    let mut lookup: HashMap<String, String> = HashMap::new();
    if let (Some(variable), Some(label)) = (
        payload.breakdown_variable.clone(),
        query
            .breakdown_label
            .clone()
            .filter(|l| !l.trim().is_empty()),
    ) {
        lookup.insert(variable, label);
    }
    let breakdown = breakdown_label(&payload, &lookup);
    let width = query.width_px;

    let outer_chart = baseline.as_ref().and_then(|baseline| {
        build_baseline_share_chart(&payload, baseline, study_unit, &breakdown, width)
    });
    let charts = build_chart_set(
        &payload,
        study_unit,
        Some(breakdown.as_str()).filter(|b| !b.is_empty()),
        width,
    );

    IndicatorCharts {
        charts,
        main_chart: build_main_chart(&payload, study_unit, &breakdown, width),
        within_chart: build_within_percentage_chart(&payload, study_unit, &breakdown, width),
        outer_chart,
        breakdown_label: breakdown,
        applied_filters_html: applied.to_html(),
        applied_filters: applied,
    }
}
