//! Search result records and their HTML cards.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::templates;

/// Shown when a search returns no records.
pub const NO_RESULTS_MESSAGE: &str = "No results found. Try adjusting your search or filters.";

/// Which card template a data source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Bibliographic,
    SocialProduction,
    Generic,
}

impl DataSourceKind {
    /// Derive the kind from a data source or index name.
    pub fn from_index(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.starts_with("social") || name.contains("soc_prod") {
            DataSourceKind::SocialProduction
        } else if matches!(
            name.as_str(),
            "world" | "brazil" | "scielo" | "openalex_works" | "sources"
        ) || name.starts_with("sci")
            || name.contains("openalex")
        {
            DataSourceKind::Bibliographic
        } else {
            DataSourceKind::Generic
        }
    }
}

/// One search hit. Every field is optional; list fields accept either a
/// single string or an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub institutions: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub year: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub directory_type: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub practice: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub cities: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub states: Vec<String>,
}

fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => vec![s],
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Object(obj) => obj
                    .get("name")
                    .or_else(|| obj.get("display_name"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Render one record with the card template for `kind`.
pub fn render_item(doc: &Document, kind: DataSourceKind) -> String {
    match kind {
        DataSourceKind::Bibliographic => templates::bibliographic_card(doc),
        DataSourceKind::SocialProduction => templates::social_card(doc),
        DataSourceKind::Generic => templates::generic_card(doc),
    }
}

/// Render every record, or the empty-state alert when there are none.
pub fn render_list(docs: &[Document], kind: DataSourceKind) -> String {
    if docs.is_empty() {
        return templates::empty_results(NO_RESULTS_MESSAGE);
    }
    debug!("Rendering {} {:?} result cards", docs.len(), kind);
    docs.iter().map(|doc| render_item(doc, kind)).collect()
}

/// Response of the search results endpoint: either server-rendered HTML or
/// raw records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub results_html: Option<String>,
    #[serde(default)]
    pub results: Vec<Document>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResponse {
    /// Markup for the results container.
    pub fn to_html(&self, kind: DataSourceKind) -> String {
        match self.results_html.as_deref() {
            Some(html) if !html.trim().is_empty() => html.to_string(),
            _ if self.results.is_empty() => templates::empty_results(NO_RESULTS_MESSAGE),
            _ => templates::results_list(self.total_results, &render_list(&self.results, kind)),
        }
    }
}
