//! Journal profile: selection state, timeseries query and summary model.

use serde::{Deserialize, Serialize};

use crate::filters::FilterMap;
use crate::payload::{JournalPayload, JournalSnapshot};

pub const DEFAULT_CATEGORY_LEVEL: &str = "field";
pub const DEFAULT_PUBLICATION_YEAR: &str = "2020";

/// Keys of the applied filters that never pass through to the timeseries
/// query; the selection fields are set explicitly instead.
const EXCLUDED_QUERY_KEYS: &[&str] = &[
    "csrfmiddlewaretoken",
    "journal_title",
    "journal_issn",
    "category_id",
    "category_level",
    "publication_year",
    "year",
    "ranking_metric",
    "limit",
];

/// Which journal, category and year the profile panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalProfileState {
    pub journal_title: String,
    pub journal_issn: String,
    pub selected_category_id: String,
    pub selected_category_level: String,
    pub selected_publication_year: String,
    #[serde(skip)]
    pub applied_filters: FilterMap,
}

impl Default for JournalProfileState {
    fn default() -> Self {
        Self {
            journal_title: String::new(),
            journal_issn: String::new(),
            selected_category_id: String::new(),
            selected_category_level: DEFAULT_CATEGORY_LEVEL.to_string(),
            selected_publication_year: DEFAULT_PUBLICATION_YEAR.to_string(),
            applied_filters: FilterMap::new(),
        }
    }
}

impl JournalProfileState {
    pub fn new(applied_filters: FilterMap) -> Self {
        Self {
            applied_filters,
            ..Self::default()
        }
    }

    pub fn has_journal(&self) -> bool {
        !self.journal_title.trim().is_empty()
    }

    /// Switch to another journal. The category is cleared so the backend
    /// picks the journal's default one at `category_level`.
    pub fn select_journal(&mut self, title: &str, issn: &str, category_level: Option<&str>) {
        self.journal_title = title.trim().to_string();
        self.journal_issn = issn.trim().to_string();
        self.selected_category_id.clear();
        if let Some(level) = category_level.map(str::trim).filter(|l| !l.is_empty()) {
            self.selected_category_level = level.to_string();
        }
    }

    pub fn select_category(&mut self, category_id: &str, category_level: Option<&str>) {
        self.selected_category_id = category_id.trim().to_string();
        if let Some(level) = category_level.map(str::trim).filter(|l| !l.is_empty()) {
            self.selected_category_level = level.to_string();
        }
    }

    pub fn select_year(&mut self, year: &str) {
        self.selected_publication_year = year.trim().to_string();
    }

    /// Query pairs for the journal timeseries endpoint.
    pub fn timeseries_query(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .applied_filters
            .iter()
            .filter(|(key, _)| !EXCLUDED_QUERY_KEYS.contains(key))
            .flat_map(|(key, value)| {
                value
                    .values()
                    .into_iter()
                    .filter(|v| !v.trim().is_empty())
                    .map(move |v| (key.to_string(), v.to_string()))
            })
            .collect();

        for (key, value) in [
            ("journal_title", &self.journal_title),
            ("journal_issn", &self.journal_issn),
            ("category_id", &self.selected_category_id),
            ("category_level", &self.selected_category_level),
            ("publication_year", &self.selected_publication_year),
        ] {
            if !value.trim().is_empty() {
                pairs.push((key.to_string(), value.trim().to_string()));
            }
        }
        pairs
    }

    pub fn timeseries_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.timeseries_query())
            .finish()
    }
}

/// One KPI tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub id: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// Index membership badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Header, KPIs and badges of the profile panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub title: String,
    pub subtitle: String,
    pub year_label: String,
    pub kpis: Vec<Kpi>,
    pub badges: Vec<Badge>,
    pub available_categories: Vec<String>,
    pub selected_category_id: Option<String>,
}

impl ProfileSummary {
    pub fn from_payload(payload: &JournalPayload, state: &JournalProfileState) -> Self {
        let selected_year = state.selected_publication_year.trim();
        let empty = JournalSnapshot::default();
        let snapshot = if selected_year.is_empty() {
            payload.latest_year_metrics.as_ref().unwrap_or(&empty)
        } else {
            payload
                .annual_snapshots
                .iter()
                .find(|s| {
                    s.publication_year
                        .map(|y| y.to_string() == selected_year)
                        .unwrap_or(false)
                })
                .unwrap_or(&empty)
        };

        let title = payload
            .journal_title
            .clone()
            .or_else(|| Some(state.journal_title.clone()).filter(|t| !t.trim().is_empty()))
            .unwrap_or_else(|| "Journal profile".to_string());

        let mut parts = Vec::new();
        let issn = payload
            .journal_issn
            .as_deref()
            .or(Some(state.journal_issn.as_str()).filter(|s| !s.trim().is_empty()));
        if let Some(issn) = issn {
            parts.push(format!("ISSN: {issn}"));
        }
        for (snap, fallback) in [
            (&snapshot.country, &payload.country),
            (&snapshot.publisher_name, &payload.publisher_name),
            (&snapshot.collection, &payload.collection),
        ] {
            if let Some(value) = snap.as_ref().or(fallback.as_ref()) {
                parts.push(value.clone());
            }
        }

        let year = snapshot
            .publication_year
            .map(|y| y.to_string())
            .or_else(|| Some(selected_year.to_string()).filter(|y| !y.is_empty()))
            .or_else(|| payload.latest_year.map(|y| y.to_string()));
        let year_label = year
            .map(|y| format!("Publication year: {y}"))
            .unwrap_or_default();

        let kpis = vec![
            Kpi {
                id: "kpi-publications",
                label: "Publications",
                value: format_number(snapshot.journal_publications_count, 0),
            },
            Kpi {
                id: "kpi-total-citations",
                label: "Total Citations",
                value: format_number(snapshot.journal_citations_total, 0),
            },
            Kpi {
                id: "kpi-mean-citations",
                label: "Mean Citations",
                value: format_number(snapshot.journal_citations_mean, 1),
            },
            Kpi {
                id: "kpi-impact",
                label: "Normalized Impact",
                value: format_number(snapshot.journal_impact_normalized, 1),
            },
            Kpi {
                id: "kpi-top10",
                label: "Top 10% Share",
                value: format_percent(snapshot.top_10pct_all_time_publications_share_pct, 1),
            },
        ];

        let badges = vec![
            Badge {
                id: "badge-scielo",
                label: "SciELO",
                active: snapshot.is_scielo,
            },
            Badge {
                id: "badge-scopus",
                label: "Scopus",
                active: snapshot.is_scopus,
            },
            Badge {
                id: "badge-wos",
                label: "WoS",
                active: snapshot.is_wos,
            },
            Badge {
                id: "badge-doaj",
                label: "DOAJ",
                active: snapshot.is_doaj,
            },
            Badge {
                id: "badge-openalex",
                label: "OpenAlex",
                active: snapshot.is_openalex,
            },
            Badge {
                id: "badge-multilingual",
                label: "Multilingual",
                active: snapshot.is_journal_multilingual,
            },
        ];

        Self {
            title,
            subtitle: parts.join(" | "),
            year_label,
            kpis,
            badges,
            available_categories: payload.available_categories.clone(),
            selected_category_id: payload.selected_category_id.clone(),
        }
    }

    pub fn kpi(&self, id: &str) -> Option<&str> {
        self.kpis.iter().find(|k| k.id == id).map(|k| k.value.as_str())
    }
}

/// Fixed decimals; `-` when the value is missing.
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "-".to_string(),
    }
}

pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}%"),
        _ => "-".to_string(),
    }
}

/// Row of the journal ranking table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    #[serde(default)]
    pub journal_title: Option<String>,
    #[serde(default)]
    pub journal_issn: Option<String>,
    #[serde(flatten)]
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

/// Entry of the journal selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JournalOption {
    pub title: String,
    pub issn: String,
}

impl JournalOption {
    /// Select value, `title||issn`.
    pub fn key(&self) -> String {
        format!("{}||{}", self.title, self.issn)
    }

    /// Parse a select value back; `None` without a title.
    pub fn parse(key: &str) -> Option<Self> {
        let (title, issn) = key.split_once("||").unwrap_or((key, ""));
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            issn: issn.trim().to_string(),
        })
    }

    pub fn text(&self) -> String {
        if self.issn.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.issn)
        }
    }
}

/// Unique journals of the ranking rows, in row order.
pub fn collect_journal_options(rows: &[RankingRow]) -> Vec<JournalOption> {
    let mut options: Vec<JournalOption> = Vec::new();
    for row in rows {
        let title = row.journal_title.as_deref().unwrap_or("").trim();
        if title.is_empty() {
            continue;
        }
        let option = JournalOption {
            title: title.to_string(),
            issn: row.journal_issn.as_deref().unwrap_or("").trim().to_string(),
        };
        if !options.contains(&option) {
            options.push(option);
        }
    }
    options
}
