//! Filter maps and the form view-model they are collected from.
//!
//! A [`FilterMap`] keeps insertion order so that the applied-filters panel
//! and the query string list fields in the order the form shows them.

pub mod applied;
pub mod catalogue;
pub mod form;

pub use applied::{
    publication_year_summary, render_applied, search_chips, ActiveFilters, AppliedFilters,
    AppliedGroup, LabelLookup,
};
pub use catalogue::{CatalogueOption, FieldMetadata, FilterCatalogue, SearchFilters, Suggestion};
pub use form::{
    build_search_params, has_other_filters, indicator_field_labels, is_user_filter, scope_from_url,
    Control, ControlKind, FilterForm, IndicatorRequest, SelectOption, DEFAULT_PRESERVED_KEYS,
};

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Suffix of keys holding an AND/OR match operator.
pub const OPERATOR_SUFFIX: &str = "_operator";
/// Suffix of keys flagging a negated field.
pub const NOT_SUFFIX: &str = "_bool_not";

/// One filter value: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    Multi(Vec<String>),
}

impl FilterValue {
    /// All values, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::Single(v) => vec![v.as_str()],
            FilterValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            FilterValue::Single(v) => Some(v.as_str()),
            FilterValue::Multi(vs) => vs.first().map(String::as_str),
        }
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        match self {
            FilterValue::Single(_) => 1,
            FilterValue::Multi(vs) => vs.len(),
        }
    }

    /// True when no non-blank value is held.
    pub fn is_blank(&self) -> bool {
        self.values().iter().all(|v| v.trim().is_empty())
    }

    fn push(&mut self, value: String) {
        match self {
            FilterValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = FilterValue::Multi(vec![first, value]);
            }
            FilterValue::Multi(vs) => vs.push(value),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Single(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Multi(values)
    }
}

/// How multiple selected values of one field are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    And,
    Or,
}

impl MatchOperator {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "and" => Some(MatchOperator::And),
            "or" => Some(MatchOperator::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperator::And => "and",
            MatchOperator::Or => "or",
        }
    }

    /// Uppercase badge text.
    pub fn badge(&self) -> &'static str {
        match self {
            MatchOperator::And => "AND",
            MatchOperator::Or => "OR",
        }
    }
}

/// Ordered field key to value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMap {
    entries: Vec<(String, FilterValue)>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL query string, accumulating repeated keys into lists.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut map = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            map.append(key.into_owned(), value.into_owned());
        }
        map
    }

    /// Build from already-decoded pairs, accumulating repeated keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.append(key.into(), value.into());
        }
        map
    }

    /// Set `key`, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Add one value to `key`, turning a single value into a list.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key, FilterValue::Single(value))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First value of `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FilterValue::first)
    }

    /// All values of `key`; empty when absent.
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.get(key).map(FilterValue::values).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when `<key>_bool_not` is set.
    pub fn is_negated(&self, key: &str) -> bool {
        self.get_str(&format!("{}{}", key, NOT_SUFFIX))
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Match operator stored under `<key>_operator`.
    pub fn operator(&self, key: &str) -> Option<MatchOperator> {
        self.get_str(&format!("{}{}", key, OPERATOR_SUFFIX))
            .and_then(MatchOperator::parse)
    }

    /// One `(key, value)` pair per value, list values expanded.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(k, v)| {
                v.values()
                    .into_iter()
                    .map(move |value| (k.clone(), value.to_string()))
            })
            .collect()
    }

    /// Encode as `application/x-www-form-urlencoded`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.to_pairs() {
            serializer.append_pair(&key, &value);
        }
        serializer.finish()
    }
}

impl Serialize for FilterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FilterMapVisitor)
    }
}

struct FilterMapVisitor;

impl<'de> Visitor<'de> for FilterMapVisitor {
    type Value = FilterMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of strings or string lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FilterMap, A::Error> {
        let mut map = FilterMap::new();
        while let Some((key, raw)) = access.next_entry::<String, serde_json::Value>()? {
            let value = match raw {
                serde_json::Value::Null => continue,
                serde_json::Value::Array(items) => FilterValue::Multi(
                    items
                        .into_iter()
                        .filter_map(|item| scalar_to_string(&item))
                        .collect(),
                ),
                other => match scalar_to_string(&other) {
                    Some(s) => FilterValue::Single(s),
                    None => continue,
                },
            };
            map.insert(key, value);
        }
        Ok(map)
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_accumulates_repeated_keys() {
        let mut map = FilterMap::new();
        map.append("country", "BR");
        map.append("document_type", "article");
        map.append("country", "PT");

        assert_eq!(
            map.get("country"),
            Some(&FilterValue::Multi(vec!["BR".into(), "PT".into()]))
        );
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["country", "document_type"]);
    }

    #[test]
    fn test_from_query_decodes_and_groups() {
        let map = FilterMap::from_query("?scope=open%20alex&country=BR&country=PT");
        assert_eq!(map.get_str("scope"), Some("open alex"));
        assert_eq!(map.values("country"), vec!["BR", "PT"]);
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let mut map = FilterMap::new();
        map.insert("zeta", "1");
        map.insert("alpha", vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":"1","alpha":["a","b"]}"#);
    }

    #[test]
    fn test_deserialize_keeps_order_and_stringifies_scalars() {
        let map: FilterMap =
            serde_json::from_str(r#"{"b": 2020, "a": ["x", 1], "skip": null}"#).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get_str("b"), Some("2020"));
        assert_eq!(map.values("a"), vec!["x", "1"]);
    }

    #[test]
    fn test_negation_and_operator_lookup() {
        let mut map = FilterMap::new();
        map.insert("country", "BR");
        map.insert("country_bool_not", "true");
        map.insert("country_operator", "OR");
        assert!(map.is_negated("country"));
        assert!(!map.is_negated("document_language"));
        assert_eq!(map.operator("country"), Some(MatchOperator::Or));
        assert_eq!(map.operator("document_language"), None);
    }

    #[test]
    fn test_query_string_expands_lists() {
        let mut map = FilterMap::new();
        map.insert("q", "a b");
        map.insert("year", vec!["2020".to_string(), "2021".to_string()]);
        assert_eq!(map.to_query_string(), "q=a+b&year=2020&year=2021");
    }
}
