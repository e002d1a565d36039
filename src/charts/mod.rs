//! Declarative chart options for an ECharts-style renderer.
//!
//! Every builder returns a fresh, self-contained [`ChartOptions`] value; the
//! page serializes it and hands it to `setOption`. Nothing here touches the
//! DOM and nothing is shared between calls.

pub mod builder;
pub mod catalogue;
pub mod journal;
pub mod wrap;

pub use builder::{
    breakdown_label, build_baseline_share_chart, build_chart, build_chart_set, build_main_chart,
    build_within_percentage_chart, ChartRequest, ChartSet, ChartSlot,
};
pub use catalogue::{Metric, MetricSpec, CATALOGUE};
pub use journal::{
    build_category_radar, build_impact_chart, build_output_chart, build_profile_charts,
    build_top_share_chart, ProfileChart, RadarMetric,
};
pub use wrap::{char_budget, wrap_text};

use serde::Serialize;

/// Root options object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<Tooltip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolbox: Option<Toolbox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub y_axis: Vec<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radar: Option<Radar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphic: Option<Graphic>,
    pub series: Vec<SeriesOption>,
}

impl ChartOptions {
    /// Empty options with only a title.
    pub fn titled(text: impl Into<String>) -> Self {
        Self {
            title: Title::new(text),
            tooltip: None,
            grid: None,
            toolbox: None,
            legend: None,
            x_axis: None,
            y_axis: Vec::new(),
            radar: None,
            graphic: None,
            series: Vec::new(),
        }
    }

    /// True when every plotted value is exactly zero (or nothing is plotted).
    pub fn is_all_zero(&self) -> bool {
        self.series
            .iter()
            .flat_map(|s| s.data.iter())
            .all(|point| point.values().iter().all(|v| *v == 0.0))
    }

    /// Soft-wrap title and subtitle to fit a container `width_px` wide.
    pub fn wrap_titles(&mut self, width_px: u32) {
        self.title.text = wrap_text(&self.title.text, char_budget(width_px, wrap::TITLE_CHAR_PX));
        if let Some(subtext) = &self.title.subtext {
            self.title.subtext = Some(wrap_text(
                subtext,
                char_budget(width_px, wrap::SUBTITLE_CHAR_PX),
            ));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subtext: None,
        }
    }

    /// Blank subtitles are dropped.
    pub fn with_subtext(mut self, subtext: Option<&str>) -> Self {
        self.subtext = subtext
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_pointer: Option<AxisPointer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confine: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enterable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_css_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisPointer {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Confined, enterable and scrollable tooltip.
pub fn tooltip(trigger: Option<&str>) -> Tooltip {
    Tooltip {
        trigger: trigger.map(str::to_string),
        axis_pointer: None,
        confine: Some(true),
        enterable: Some(true),
        extra_css_text: Some("max-height:50vh; overflow-y:auto;".to_string()),
    }
}

/// Axis tooltip with a shadow pointer, used by the bar charts.
pub fn axis_tooltip() -> Tooltip {
    Tooltip {
        axis_pointer: Some(AxisPointer {
            kind: "shadow".to_string(),
        }),
        ..tooltip(Some("axis"))
    }
}

/// Grid offsets in pixels or as a percentage string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Length {
    Px(u32),
    Percent(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub top: Length,
    pub left: Length,
    pub right: Length,
    pub bottom: Length,
    pub contain_label: bool,
}

/// Room for the title block above and the legend on the right.
pub fn grid() -> Grid {
    Grid {
        top: Length::Px(110),
        left: Length::Px(0),
        right: Length::Px(200),
        bottom: Length::Px(40),
        contain_label: true,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toolbox {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orient: Option<String>,
    pub feature: ToolboxFeature,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxFeature {
    pub magic_type: MagicType,
    pub data_view: DataView,
    pub save_as_image: Toggle,
    pub restore: Toggle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_zoom: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagicType {
    #[serde(rename = "type")]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataView {
    pub show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lang: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toggle {
    pub show: bool,
}

/// Vertical toolbox with type switching, data view, export, restore and zoom.
pub fn toolbox(magic_types: &[&str]) -> Toolbox {
    Toolbox {
        orient: Some("vertical".to_string()),
        feature: ToolboxFeature {
            magic_type: MagicType {
                types: magic_types.iter().map(|t| t.to_string()).collect(),
            },
            data_view: DataView {
                show: true,
                title: Some("Data".to_string()),
                read_only: true,
                lang: vec![String::new(), "Close".to_string()],
            },
            save_as_image: Toggle { show: true },
            restore: Toggle { show: true },
            data_zoom: Some(serde_json::Map::new()),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub data: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orient: Option<String>,
    pub bottom: u32,
}

/// Scrolling legend along the bottom; `None` when there is nothing to list.
pub fn legend(keys: Vec<String>) -> Option<Legend> {
    if keys.is_empty() {
        return None;
    }
    Some(Legend {
        kind: Some("scroll".to_string()),
        data: keys,
        orient: Some("horizontal".to_string()),
        bottom: 0,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_label: Option<AxisLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLabel {
    pub formatter: String,
}

impl Axis {
    pub fn category(labels: &[String]) -> Self {
        Self {
            kind: "category".to_string(),
            data: Some(labels.to_vec()),
            name: None,
            axis_label: None,
        }
    }

    pub fn value() -> Self {
        Self {
            kind: "value".to_string(),
            data: None,
            name: None,
            axis_label: None,
        }
    }

    /// Value axis labelled `"{value} %"`.
    pub fn percent() -> Self {
        Self {
            axis_label: Some(AxisLabel {
                formatter: "{value} %".to_string(),
            }),
            ..Self::value()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Emphasis>,
    pub data: Vec<DataPoint>,
}

impl SeriesOption {
    pub fn bar(name: impl Into<String>, values: &[f64]) -> Self {
        Self::of_kind("bar", name, values)
    }

    /// Smoothed line.
    pub fn line(name: impl Into<String>, values: &[f64]) -> Self {
        Self {
            smooth: Some(true),
            ..Self::of_kind("line", name, values)
        }
    }

    fn of_kind(kind: &str, name: impl Into<String>, values: &[f64]) -> Self {
        Self {
            name: Some(name.into()),
            kind: kind.to_string(),
            stack: None,
            y_axis_index: None,
            smooth: None,
            emphasis: None,
            data: values.iter().copied().map(DataPoint::Value).collect(),
        }
    }

    /// Stack onto the shared `"total"` stack.
    pub fn stacked(mut self) -> Self {
        self.stack = Some("total".to_string());
        self
    }

    /// Highlight the whole series on hover.
    pub fn focus_series(mut self) -> Self {
        self.emphasis = Some(Emphasis {
            focus: "series".to_string(),
        });
        self
    }

    pub fn values(&self) -> Vec<f64> {
        self.data.iter().flat_map(|p| p.values()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emphasis {
    pub focus: String,
}

/// One plotted datum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataPoint {
    Value(f64),
    Share(ShareDatum),
    Radar(RadarDatum),
}

impl DataPoint {
    fn values(&self) -> Vec<f64> {
        match self {
            DataPoint::Value(v) => vec![*v],
            DataPoint::Share(d) => vec![d.value],
            DataPoint::Radar(d) => d.value.clone(),
        }
    }
}

/// Percentage of a baseline, with both raw counts for the tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareDatum {
    pub value: f64,
    pub filtered: f64,
    pub baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarDatum {
    pub value: Vec<f64>,
    pub name: String,
    pub area_style: serde_json::Value,
    pub line_style: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Radar {
    pub radius: String,
    pub indicator: Vec<RadarIndicator>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarIndicator {
    pub name: String,
    pub max: f64,
}

/// Centered text drawn in place of an empty chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphic {
    #[serde(rename = "type")]
    pub kind: String,
    pub left: String,
    pub top: String,
    pub style: GraphicStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicStyle {
    pub text: String,
    pub fill: String,
    pub font_size: u32,
}

impl Graphic {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            left: "center".to_string(),
            top: "middle".to_string(),
            style: GraphicStyle {
                text: text.into(),
                fill: "#667085".to_string(),
                font_size: 14,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_serialize_camel_case_and_skip_empty() {
        let mut options = ChartOptions::titled("Total Documents");
        options.tooltip = Some(axis_tooltip());
        options.grid = Some(grid());
        options.x_axis = Some(Axis::category(&["2020".to_string()]));
        options.y_axis = vec![Axis::percent()];
        options.series = vec![SeriesOption::bar("Documents", &[3.0]).stacked()];

        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["title"], json!({"text": "Total Documents"}));
        assert_eq!(value["tooltip"]["axisPointer"]["type"], "shadow");
        assert_eq!(value["grid"]["containLabel"], true);
        assert_eq!(value["xAxis"]["type"], "category");
        assert_eq!(value["yAxis"][0]["axisLabel"]["formatter"], "{value} %");
        assert_eq!(value["series"][0]["stack"], "total");
        assert_eq!(value["series"][0]["data"], json!([3.0]));
        assert!(value.get("legend").is_none());
        assert!(value.get("radar").is_none());
    }

    #[test]
    fn test_toolbox_features() {
        let value = serde_json::to_value(toolbox(&["line", "bar", "tiled"])).unwrap();
        assert_eq!(value["orient"], "vertical");
        assert_eq!(value["feature"]["magicType"]["type"], json!(["line", "bar", "tiled"]));
        assert_eq!(value["feature"]["dataView"]["lang"], json!(["", "Close"]));
        assert_eq!(value["feature"]["dataZoom"], json!({}));
    }

    #[test]
    fn test_legend_none_when_empty() {
        assert!(legend(Vec::new()).is_none());
        let value = serde_json::to_value(legend(vec!["A".into()])).unwrap();
        assert_eq!(value["type"], "scroll");
        assert_eq!(value["bottom"], 0);
    }

    #[test]
    fn test_all_zero_detection() {
        let mut options = ChartOptions::titled("t");
        assert!(options.is_all_zero());
        options.series = vec![SeriesOption::bar("a", &[0.0, 0.0])];
        assert!(options.is_all_zero());
        options.series.push(SeriesOption::bar("b", &[0.0, 0.5]));
        assert!(!options.is_all_zero());
    }

    #[test]
    fn test_share_datum_serializes_flat() {
        let point = DataPoint::Share(ShareDatum {
            value: 12.5,
            filtered: 5.0,
            baseline: 40.0,
        });
        assert_eq!(
            serde_json::to_value(point).unwrap(),
            json!({"value": 12.5, "filtered": 5.0, "baseline": 40.0})
        );
    }
}
