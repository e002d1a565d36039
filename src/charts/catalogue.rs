//! Metric catalogue: one entry per chartable indicator.

use std::borrow::Cow;

use crate::payload::{round_to, TimeSeriesPayload};

/// A chartable indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Documents,
    Citations,
    CitationsPerDocument,
    CitedDocuments,
    PercentDocsWithCitations,
    Periodicals,
    DocumentsPerPeriodical,
    CitationsPerPeriodical,
    CitedDocumentsPerPeriodical,
    PercentPeriodicalsWithCitedDocs,
    DocumentsShare,
    CitationsShare,
    CitationsPerDocumentShare,
    CitedDocumentsShare,
    PercentDocsWithCitationsShare,
    PeriodicalsShare,
    DocumentsPerSourceShare,
    CitationsPerSourceShare,
    CitedDocumentsPerSourceShare,
    PercentSourcesWithCitedDocsShare,
}

/// Static description of a metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub metric: Metric,
    /// Identifier used by the page and the CLI.
    pub key: &'static str,
    /// Suffix of the breakdown series carrying this metric, e.g. `Documents`
    /// for `"Brazil (Documents)"`. Share metrics have none.
    pub suffix: Option<&'static str>,
    /// Series name when plotted without breakdown.
    pub series_name: &'static str,
    /// Default chart title.
    pub title: &'static str,
    /// Values are percentages.
    pub percent: bool,
}

pub const CATALOGUE: &[MetricSpec] = &[
    MetricSpec {
        metric: Metric::Documents,
        key: "Documents",
        suffix: Some("Documents"),
        series_name: "Documents",
        title: "Total Documents",
        percent: false,
    },
    MetricSpec {
        metric: Metric::Citations,
        key: "Citations",
        suffix: Some("Citations"),
        series_name: "Citations",
        title: "Total Citations",
        percent: false,
    },
    MetricSpec {
        metric: Metric::CitationsPerDocument,
        key: "Citations per Document",
        suffix: None,
        series_name: "Citations per Document",
        title: "Citations per Document",
        percent: false,
    },
    MetricSpec {
        metric: Metric::CitedDocuments,
        key: "Cited Documents",
        suffix: Some("Cited Documents"),
        series_name: "Cited Documents",
        title: "Cited Documents (≥1 citation)",
        percent: false,
    },
    MetricSpec {
        metric: Metric::PercentDocsWithCitations,
        key: "Percent Docs With Citations",
        suffix: Some("Percent Docs With Citations"),
        series_name: "% Documents With ≥1 Citation",
        title: "% Documents With ≥1 Citation",
        percent: true,
    },
    MetricSpec {
        metric: Metric::Periodicals,
        key: "Periodicals",
        suffix: Some("Periodicals"),
        series_name: "Unique Sources",
        title: "Unique Sources",
        percent: false,
    },
    MetricSpec {
        metric: Metric::DocumentsPerPeriodical,
        key: "Documents per Periodical",
        suffix: Some("Documents per Periodical"),
        series_name: "Avg Documents per Source",
        title: "Avg Documents per Source",
        percent: false,
    },
    MetricSpec {
        metric: Metric::CitationsPerPeriodical,
        key: "Citations per Periodical",
        suffix: Some("Citations per Periodical"),
        series_name: "Avg Citations per Source",
        title: "Avg Citations per Source",
        percent: false,
    },
    MetricSpec {
        metric: Metric::CitedDocumentsPerPeriodical,
        key: "Cited Documents per Periodical",
        suffix: Some("Cited Documents per Periodical"),
        series_name: "Avg Cited Documents per Source",
        title: "Avg Cited Documents per Source",
        percent: false,
    },
    MetricSpec {
        metric: Metric::PercentPeriodicalsWithCitedDocs,
        key: "Percent Periodicals With Cited Docs",
        suffix: Some("Percent Periodicals With Cited Docs"),
        series_name: "% Sources With ≥1 Cited Document",
        title: "% Sources With ≥1 Cited Document",
        percent: true,
    },
    MetricSpec {
        metric: Metric::DocumentsShare,
        key: "Documents Share",
        suffix: None,
        series_name: "Documents Share",
        title: "Documents Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::CitationsShare,
        key: "Citations Share",
        suffix: None,
        series_name: "Citations Share",
        title: "Citations Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::CitationsPerDocumentShare,
        key: "Citations per Document Share",
        suffix: None,
        series_name: "Citations per Document Share",
        title: "Citations per Document Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::CitedDocumentsShare,
        key: "Cited Documents Share",
        suffix: None,
        series_name: "Cited Documents Share",
        title: "Cited Documents Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::PercentDocsWithCitationsShare,
        key: "Percent Docs With Citations Share",
        suffix: None,
        series_name: "% Documents With ≥1 Citation Share",
        title: "% Documents With ≥1 Citation Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::PeriodicalsShare,
        key: "Periodicals Share",
        suffix: None,
        series_name: "Unique Sources Share",
        title: "Unique Sources Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::DocumentsPerSourceShare,
        key: "Documents per Source Share",
        suffix: None,
        series_name: "Documents per Source Share",
        title: "Documents per Source Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::CitationsPerSourceShare,
        key: "Citations per Source Share",
        suffix: None,
        series_name: "Citations per Source Share",
        title: "Citations per Source Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::CitedDocumentsPerSourceShare,
        key: "Cited Documents per Source Share",
        suffix: None,
        series_name: "Cited Documents per Source Share",
        title: "Cited Documents per Source Share (%)",
        percent: true,
    },
    MetricSpec {
        metric: Metric::PercentSourcesWithCitedDocsShare,
        key: "Percent Sources With Cited Docs Share",
        suffix: None,
        series_name: "% Sources With ≥1 Cited Document Share",
        title: "% Sources With ≥1 Cited Document Share (%)",
        percent: true,
    },
];

impl Metric {
    pub fn spec(&self) -> &'static MetricSpec {
        CATALOGUE
            .iter()
            .find(|spec| spec.metric == *self)
            .unwrap_or(&CATALOGUE[0])
    }

    /// Look a metric up by key, case-insensitively.
    pub fn from_key(key: &str) -> Option<Metric> {
        let key = key.trim();
        CATALOGUE
            .iter()
            .find(|spec| spec.key.eq_ignore_ascii_case(key))
            .map(|spec| spec.metric)
    }

    pub fn key(&self) -> &'static str {
        self.spec().key
    }

    pub fn title(&self) -> &'static str {
        self.spec().title
    }

    /// Share metrics compare filtered data with the unfiltered baseline and
    /// are never broken down.
    pub fn is_share(&self) -> bool {
        matches!(
            self,
            Metric::DocumentsShare
                | Metric::CitationsShare
                | Metric::CitationsPerDocumentShare
                | Metric::CitedDocumentsShare
                | Metric::PercentDocsWithCitationsShare
                | Metric::PeriodicalsShare
                | Metric::DocumentsPerSourceShare
                | Metric::CitationsPerSourceShare
                | Metric::CitedDocumentsPerSourceShare
                | Metric::PercentSourcesWithCitedDocsShare
        )
    }

    /// Per-year values without breakdown.
    pub fn values<'a>(&self, payload: &'a TimeSeriesPayload) -> Cow<'a, [f64]> {
        let rm = &payload.relative_metrics;
        let slice: &'a [f64] = match self {
            Metric::Documents => &payload.ndocs_per_year,
            Metric::Citations => &payload.total_citations_per_year,
            Metric::CitationsPerDocument => {
                return Cow::Owned(
                    payload
                        .total_citations_per_year
                        .iter()
                        .zip(&payload.ndocs_per_year)
                        .map(|(&c, &d)| if d > 0.0 { round_to(c / d, 4) } else { 0.0 })
                        .collect(),
                )
            }
            Metric::CitedDocuments => &payload.docs_with_citations_per_year,
            Metric::PercentDocsWithCitations => &payload.percent_docs_with_citations_per_year,
            Metric::Periodicals => &payload.nperiodicals_per_year,
            Metric::DocumentsPerPeriodical => &payload.docs_per_periodical_per_year,
            Metric::CitationsPerPeriodical => &payload.citations_per_periodical_per_year,
            Metric::CitedDocumentsPerPeriodical => &payload.cited_docs_per_periodical_per_year,
            Metric::PercentPeriodicalsWithCitedDocs => {
                &payload.percent_periodicals_with_cited_docs_per_year
            }
            Metric::DocumentsShare => &rm.docs_share_pct_per_year,
            Metric::CitationsShare => &rm.citations_share_pct_per_year,
            Metric::CitationsPerDocumentShare => &rm.citations_per_doc_share_pct_per_year,
            Metric::CitedDocumentsShare => &rm.cited_docs_share_pct_per_year,
            Metric::PercentDocsWithCitationsShare => {
                &rm.pct_docs_with_citations_share_pct_per_year
            }
            Metric::PeriodicalsShare => &rm.periodicals_share_pct_per_year,
            Metric::DocumentsPerSourceShare => &rm.docs_per_source_share_pct_per_year,
            Metric::CitationsPerSourceShare => &rm.citations_per_source_share_pct_per_year,
            Metric::CitedDocumentsPerSourceShare => &rm.cited_docs_per_source_share_pct_per_year,
            Metric::PercentSourcesWithCitedDocsShare => {
                &rm.pct_sources_with_cited_docs_share_pct_per_year
            }
        };
        if slice.len() == payload.years.len() {
            Cow::Borrowed(slice)
        } else {
            let mut padded = slice.to_vec();
            padded.resize(payload.years.len(), 0.0);
            Cow::Owned(padded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_metric_has_one_entry() {
        for spec in CATALOGUE {
            assert_eq!(
                CATALOGUE.iter().filter(|s| s.metric == spec.metric).count(),
                1
            );
            assert_eq!(spec.metric.spec().key, spec.key);
            assert_eq!(spec.metric.is_share(), spec.key.ends_with("Share"));
        }
    }

    #[test]
    fn test_from_key() {
        assert_eq!(Metric::from_key("documents"), Some(Metric::Documents));
        assert_eq!(
            Metric::from_key("Citations per Document"),
            Some(Metric::CitationsPerDocument)
        );
        assert_eq!(Metric::from_key("nope"), None);
    }

    #[test]
    fn test_values_from_payload() {
        let payload = TimeSeriesPayload::from_value(&json!({
            "years": ["2020", "2021"],
            "ndocs_per_year": [3, 0],
            "total_citations_per_year": [10, 4],
            "relative_metrics": {"enabled": true, "docs_share_pct_per_year": [50]},
        }))
        .unwrap();

        assert_eq!(Metric::Documents.values(&payload).as_ref(), &[3.0, 0.0]);
        assert_eq!(
            Metric::CitationsPerDocument.values(&payload).as_ref(),
            &[3.3333, 0.0]
        );
        assert_eq!(Metric::DocumentsShare.values(&payload).as_ref(), &[50.0, 0.0]);
        assert_eq!(Metric::Periodicals.values(&payload).as_ref(), &[0.0, 0.0]);
    }

    #[test]
    fn test_values_padded_for_hand_built_payload() {
        let payload = TimeSeriesPayload {
            years: vec!["2020".into(), "2021".into()],
            ndocs_per_year: vec![1.0],
            ..Default::default()
        };
        assert_eq!(Metric::Documents.values(&payload).as_ref(), &[1.0, 0.0]);
    }
}
