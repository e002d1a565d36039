//! Filter option catalogues returned by the filter endpoints.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One selectable option of a filter field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueOption {
    pub value: String,
    pub label: String,
}

impl CatalogueOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Read an option from any of the shapes the backends send: a bucket
    /// `{key, label}`, `{value, label}`, `{id, text}` or a bare scalar.
    /// Options without a value are dropped.
    pub fn from_json(item: &Value) -> Option<Self> {
        let value = match item {
            Value::Object(obj) => ["value", "key", "id"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(scalar))?,
            other => scalar(other)?,
        };
        if value.is_empty() {
            return None;
        }
        let label = match item {
            Value::Object(obj) => ["label", "text"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(scalar))
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        };
        Some(Self { value, label })
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Field key to options, in the order the backend listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCatalogue {
    fields: Vec<(String, Vec<CatalogueOption>)>,
}

impl FilterCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, options: Vec<CatalogueOption>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = options,
            None => self.fields.push((key, options)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[CatalogueOption]> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CatalogueOption])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FilterCatalogue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, options) in &self.fields {
            map.serialize_entry(key, options)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterCatalogue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CatalogueVisitor)
    }
}

struct CatalogueVisitor;

impl<'de> Visitor<'de> for CatalogueVisitor {
    type Value = FilterCatalogue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of option lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FilterCatalogue, A::Error> {
        let mut catalogue = FilterCatalogue::new();
        while let Some((key, items)) = access.next_entry::<String, Value>()? {
            let Value::Array(items) = items else {
                continue;
            };
            let options = items.iter().filter_map(CatalogueOption::from_json).collect();
            catalogue.insert(key, options);
        }
        Ok(catalogue)
    }
}

/// Presentation hints for a search-page filter field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub class_filter: Option<String>,
    #[serde(default)]
    pub multiple_selection: Option<bool>,
    #[serde(default)]
    pub support_search_as_you_type: Option<bool>,
}

impl FieldMetadata {
    /// Fields allow several values unless explicitly marked otherwise.
    pub fn is_multiple(&self) -> bool {
        self.multiple_selection != Some(false)
    }

    pub fn is_range(&self) -> bool {
        self.class_filter.as_deref() == Some("range")
    }
}

/// Response of the search-page filter endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub filters: FilterCatalogue,
    #[serde(default)]
    pub filter_metadata: HashMap<String, FieldMetadata>,
}

/// One suggestion from the search-as-you-type endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Suggestion {
    pub fn text(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_shapes() {
        assert_eq!(
            CatalogueOption::from_json(&json!({"key": "BR", "label": "br"})),
            Some(CatalogueOption::new("BR", "br"))
        );
        assert_eq!(
            CatalogueOption::from_json(&json!({"value": 2020})),
            Some(CatalogueOption::new("2020", "2020"))
        );
        assert_eq!(
            CatalogueOption::from_json(&json!({"id": "x", "text": "Ex"})),
            Some(CatalogueOption::new("x", "Ex"))
        );
        assert_eq!(
            CatalogueOption::from_json(&json!("pt")),
            Some(CatalogueOption::new("pt", "pt"))
        );
        assert_eq!(CatalogueOption::from_json(&json!({"key": ""})), None);
        assert_eq!(CatalogueOption::from_json(&json!(null)), None);
    }

    #[test]
    fn test_catalogue_keeps_backend_order() {
        let catalogue: FilterCatalogue =
            serde_json::from_str(r#"{"year": [2020, 2021], "country": [{"key": "BR"}], "bad": 3}"#)
                .unwrap();
        let keys: Vec<&str> = catalogue.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["year", "country"]);
        assert_eq!(catalogue.get("year").map(|o| o.len()), Some(2));
    }

    #[test]
    fn test_field_metadata_defaults_to_multiple() {
        let meta = FieldMetadata::default();
        assert!(meta.is_multiple());
        let single: FieldMetadata =
            serde_json::from_value(json!({"multiple_selection": false, "class_filter": "range"}))
                .unwrap();
        assert!(!single.is_multiple());
        assert!(single.is_range());
    }
}
