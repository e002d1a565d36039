//! Charts of the journal profile panel.

use serde::Serialize;
use serde_json::json;

use super::{
    Axis, ChartOptions, DataPoint, DataView, Graphic, Grid, Legend, Length, MagicType, Radar,
    RadarDatum, RadarIndicator, SeriesOption, Title, Toggle, Toolbox, ToolboxFeature, Tooltip,
};
use crate::payload::JournalPayload;

/// Category aggregate plotted by a radar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarMetric {
    Publications,
    TotalCitations,
    MeanCitations,
}

impl RadarMetric {
    pub fn label(&self) -> &'static str {
        match self {
            RadarMetric::Publications => "Publications",
            RadarMetric::TotalCitations => "Total Citations",
            RadarMetric::MeanCitations => "Mean Citations",
        }
    }

    /// Element id of the radar on the profile panel.
    pub fn container(&self) -> &'static str {
        match self {
            RadarMetric::Publications => "journal-profile-category-radar",
            RadarMetric::TotalCitations => "journal-profile-category-citations-total-radar",
            RadarMetric::MeanCitations => "journal-profile-category-citations-mean-radar",
        }
    }
}

fn profile_tooltip() -> Tooltip {
    Tooltip {
        trigger: Some("axis".to_string()),
        axis_pointer: None,
        confine: None,
        enterable: None,
        extra_css_text: None,
    }
}

fn profile_toolbox() -> Toolbox {
    Toolbox {
        orient: None,
        feature: ToolboxFeature {
            magic_type: MagicType {
                types: vec!["line".to_string(), "bar".to_string()],
            },
            data_view: DataView {
                show: true,
                title: None,
                read_only: true,
                lang: Vec::new(),
            },
            save_as_image: Toggle { show: true },
            restore: Toggle { show: true },
            data_zoom: None,
        },
    }
}

fn profile_grid(bottom: u32) -> Grid {
    Grid {
        top: Length::Px(60),
        left: Length::Px(10),
        right: Length::Px(10),
        bottom: Length::Px(bottom),
        contain_label: true,
    }
}

fn profile_legend(names: &[&str]) -> Option<Legend> {
    Some(Legend {
        kind: None,
        data: names.iter().map(|n| n.to_string()).collect(),
        orient: None,
        bottom: 0,
    })
}

fn line_chart(
    title: &str,
    years: &[String],
    y_axis: Axis,
    grid_bottom: u32,
    lines: Vec<(&str, &[f64])>,
) -> ChartOptions {
    let names: Vec<&str> = lines.iter().map(|(name, _)| *name).collect();
    ChartOptions {
        title: Title::new(title),
        tooltip: Some(profile_tooltip()),
        grid: Some(profile_grid(grid_bottom)),
        toolbox: Some(profile_toolbox()),
        legend: profile_legend(&names),
        x_axis: Some(Axis::category(years)),
        y_axis: vec![y_axis],
        series: lines
            .into_iter()
            .map(|(name, values)| SeriesOption::line(name, values))
            .collect(),
        ..ChartOptions::titled("")
    }
}

/// Publications (bars, left axis) against total citations (line, right axis).
pub fn build_output_chart(payload: &JournalPayload) -> ChartOptions {
    let mut citations = SeriesOption::line(
        "Total Citations",
        &payload.journal_citations_total_per_year,
    );
    citations.y_axis_index = Some(1);

    ChartOptions {
        title: Title::new("Publications and Total Citations per Year"),
        tooltip: Some(profile_tooltip()),
        grid: Some(profile_grid(60)),
        toolbox: Some(profile_toolbox()),
        legend: profile_legend(&["Publications", "Total Citations"]),
        x_axis: Some(Axis::category(&payload.years)),
        y_axis: vec![
            Axis::value().named("Publications"),
            Axis::value().named("Citations"),
        ],
        series: vec![
            SeriesOption::bar(
                "Publications",
                &payload.journal_publications_count_per_year,
            ),
            citations,
        ],
        ..ChartOptions::titled("")
    }
}

/// Normalized cohort impact over several windows plus mean citations.
pub fn build_impact_chart(payload: &JournalPayload) -> ChartOptions {
    line_chart(
        "Cohort Impact and Mean Citations per Year",
        &payload.years,
        Axis::value(),
        80,
        vec![
            (
                "Cohort Impact (Total)",
                &payload.journal_impact_normalized_per_year,
            ),
            (
                "Cohort Impact (2 years)",
                &payload.journal_impact_normalized_window_2y_per_year,
            ),
            (
                "Cohort Impact (3 years)",
                &payload.journal_impact_normalized_window_3y_per_year,
            ),
            (
                "Cohort Impact (5 years)",
                &payload.journal_impact_normalized_window_5y_per_year,
            ),
            ("Mean Citations", &payload.journal_citations_mean_per_year),
        ],
    )
}

/// Share of publications in the all-time top percentiles.
pub fn build_top_share_chart(payload: &JournalPayload) -> ChartOptions {
    line_chart(
        "Top Publications Share (%) per Year",
        &payload.years,
        Axis::value().named("%"),
        60,
        vec![
            (
                "Top 1%",
                &payload.top_1pct_all_time_publications_share_pct_per_year,
            ),
            (
                "Top 5%",
                &payload.top_5pct_all_time_publications_share_pct_per_year,
            ),
            (
                "Top 10%",
                &payload.top_10pct_all_time_publications_share_pct_per_year,
            ),
            (
                "Top 50%",
                &payload.top_50pct_all_time_publications_share_pct_per_year,
            ),
        ],
    )
}

/// Radar of one aggregate across the journal's categories. Without category
/// data the chart only shows a centered message.
pub fn build_category_radar(payload: &JournalPayload, metric: RadarMetric) -> ChartOptions {
    let mut options = ChartOptions::titled(format!("{} by Category", metric.label()));
    let spokes = &payload.category_publications_spider;

    if spokes.is_empty() {
        options.graphic = Some(Graphic::message("No category data available"));
        return options;
    }

    let values: Vec<f64> = spokes
        .iter()
        .map(|spoke| match metric {
            RadarMetric::Publications => spoke.publications_total,
            RadarMetric::TotalCitations => spoke.citations_total,
            RadarMetric::MeanCitations => spoke.citations_mean,
        })
        .collect();
    let max = values.iter().copied().fold(1.0_f64, f64::max);

    options.tooltip = Some(Tooltip {
        trigger: Some("item".to_string()),
        ..profile_tooltip()
    });
    options.radar = Some(Radar {
        radius: "65%".to_string(),
        indicator: spokes
            .iter()
            .map(|spoke| RadarIndicator {
                name: spoke.category.clone(),
                max,
            })
            .collect(),
    });
    options.series = vec![SeriesOption {
        name: None,
        kind: "radar".to_string(),
        stack: None,
        y_axis_index: None,
        smooth: None,
        emphasis: None,
        data: vec![DataPoint::Radar(RadarDatum {
            value: values,
            name: metric.label().to_string(),
            area_style: json!({"opacity": 0.2}),
            line_style: json!({"width": 2}),
        })],
    }];
    options
}

/// Every chart of the profile panel keyed by element id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileChart {
    pub container: String,
    pub options: ChartOptions,
}

pub fn build_profile_charts(payload: &JournalPayload) -> Vec<ProfileChart> {
    let mut charts = vec![
        ProfileChart {
            container: "journal-profile-output-chart".to_string(),
            options: build_output_chart(payload),
        },
        ProfileChart {
            container: "journal-profile-impact-chart".to_string(),
            options: build_impact_chart(payload),
        },
        ProfileChart {
            container: "journal-profile-top-share-chart".to_string(),
            options: build_top_share_chart(payload),
        },
    ];
    for metric in [
        RadarMetric::Publications,
        RadarMetric::TotalCitations,
        RadarMetric::MeanCitations,
    ] {
        charts.push(ProfileChart {
            container: metric.container().to_string(),
            options: build_category_radar(payload, metric),
        });
    }
    charts
}
