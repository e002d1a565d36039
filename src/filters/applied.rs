//! Applied-filter summaries for the indicators panel and search chips.

use std::collections::HashMap;

use serde::Serialize;

use super::form::FilterForm;
use super::{FilterMap, MatchOperator, NOT_SUFFIX, OPERATOR_SUFFIX};
use crate::labels::{parse_leading_int, years_to_ranges, FieldKind, LabelStandardizer};
use crate::templates;

/// Keys never listed in the generic loop.
const IGNORED_KEYS: &[&str] = &[
    "breakdown_variable",
    "country_operator",
    "csrfmiddlewaretoken",
    "document_publication_year_end",
    "document_publication_year_start",
    "document_language_operator",
    "ranking_metric",
];

/// Resolves a field key to the label its control shows.
pub trait LabelLookup {
    fn label_for(&self, key: &str) -> Option<String>;
}

impl LabelLookup for FilterForm {
    fn label_for(&self, key: &str) -> Option<String> {
        FilterForm::label_for(self, key).map(str::to_string)
    }
}

impl LabelLookup for HashMap<String, String> {
    fn label_for(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// No labels known; keys are shown as-is.
impl LabelLookup for () {
    fn label_for(&self, _key: &str) -> Option<String> {
        None
    }
}

/// One labelled group of applied values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedGroup {
    pub key: String,
    pub label: String,
    pub values: Vec<String>,
    pub negated: bool,
}

/// AND/OR badge for a multi-valued field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorBadge {
    pub label: String,
    pub operator: MatchOperator,
}

/// Display model of the applied-filters panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedFilters {
    pub title: String,
    pub options_title: String,
    pub groups: Vec<AppliedGroup>,
    pub operators: Vec<OperatorBadge>,
}

impl AppliedFilters {
    /// Nothing to show; the panel stays hidden.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Panel markup, or an empty string when hidden.
    pub fn to_html(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        templates::applied_filters_panel(self)
    }
}

/// Summarize a collected filter map for display.
pub fn render_applied(
    filters: &FilterMap,
    lookup: &dyn LabelLookup,
    labels: &LabelStandardizer,
) -> AppliedFilters {
    let mut groups: Vec<AppliedGroup> = Vec::new();

    for (key, value) in filters.iter() {
        if IGNORED_KEYS.contains(&key) || key.ends_with(NOT_SUFFIX) || key.ends_with(OPERATOR_SUFFIX)
        {
            continue;
        }
        let values: Vec<&str> = value
            .values()
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            continue;
        }

        let label = lookup.label_for(key).unwrap_or_else(|| key.to_string());
        let field = if FieldKind::of(&label) != FieldKind::Other {
            label.as_str()
        } else {
            key
        };
        let display: Vec<String> = values.iter().map(|v| labels.standardize(field, v)).collect();
        let negated = filters.is_negated(key);

        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => {
                group.values.extend(display);
                group.negated |= negated;
            }
            None => groups.push(AppliedGroup {
                key: key.to_string(),
                label,
                values: display,
                negated,
            }),
        }
    }

    let publication_year = labels.tr("Publication Year").into_owned();
    for group in &mut groups {
        if group.label == publication_year {
            group.values = publication_year_summary(&group.values);
        }
    }

    let range = labels.format_year_range(
        filters
            .get_str("document_publication_year_start")
            .unwrap_or(""),
        filters.get_str("document_publication_year_end").unwrap_or(""),
    );
    if !range.is_empty() {
        groups.push(AppliedGroup {
            key: "document_publication_year".to_string(),
            label: publication_year,
            values: vec![range],
            negated: false,
        });
    }

    let mut operators = Vec::new();
    for (key, _) in filters.iter() {
        let Some(field) = key.strip_suffix(OPERATOR_SUFFIX) else {
            continue;
        };
        let Some(operator) = filters.operator(field) else {
            continue;
        };
        let governed = groups.iter().find(|g| g.key == field);
        if governed.map(|g| g.values.len()).unwrap_or(0) > 1 {
            let label = match field {
                "country" => labels.tr("Country").into_owned(),
                "document_language" => labels.tr("Document Language").into_owned(),
                other => lookup
                    .label_for(other)
                    .unwrap_or_else(|| other.replace('_', " ")),
            };
            operators.push(OperatorBadge { label, operator });
        }
    }

    AppliedFilters {
        title: labels.tr("Applied Filters").into_owned(),
        options_title: labels.tr("Search Options").into_owned(),
        groups,
        operators,
    }
}

/// Compress a "Publication Year" group of integer years into ranges; other
/// values are left as they are.
pub fn publication_year_summary(values: &[String]) -> Vec<String> {
    let years: Vec<i32> = values
        .iter()
        .filter_map(|v| parse_leading_int(v))
        .collect();
    if years.is_empty() {
        return values.to_vec();
    }
    vec![years_to_ranges(&years)]
}

/// One removable chip on the search page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub key: String,
    pub label: String,
    pub value: String,
    pub text: String,
}

/// Active search query and filter chips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveFilters {
    pub query: Option<String>,
    pub chips: Vec<FilterChip>,
}

impl ActiveFilters {
    /// Number of active filter values, the query excluded.
    pub fn count(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.chips.is_empty()
    }

    pub fn to_html(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        templates::active_filters(self)
    }
}

/// Chips for the search page: one per selected value, plus the query.
pub fn search_chips(query: &str, form: &FilterForm) -> ActiveFilters {
    let query = query.trim();
    let mut chips = Vec::new();
    for control in form.controls.iter().filter(|c| c.is_select()) {
        for value in control.values() {
            chips.push(FilterChip {
                key: control.name.clone(),
                label: if control.label.is_empty() {
                    control.name.clone()
                } else {
                    control.label.clone()
                },
                value: value.to_string(),
                text: control.option_label(value).to_string(),
            });
        }
    }
    ActiveFilters {
        query: (!query.is_empty()).then(|| query.to_string()),
        chips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::form::{Control, SelectOption};

    fn labels() -> HashMap<String, String> {
        [
            ("country", "Country"),
            ("document_language", "Document Language"),
            ("publication_year", "Publication Year"),
            ("collection", "Collection"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_groups_values_and_standardizes() {
        let mut filters = FilterMap::new();
        filters.insert("csrfmiddlewaretoken", "abc");
        filters.append("country", "BR");
        filters.append("country", "PT");
        filters.insert("collection", "scl");

        let applied = render_applied(&filters, &labels(), &LabelStandardizer::default());
        assert_eq!(applied.groups.len(), 2);
        assert_eq!(applied.groups[0].label, "Country");
        assert_eq!(applied.groups[0].values, vec!["Brazil", "Portugal"]);
        assert_eq!(applied.groups[1].values, vec!["Brazil"]);
    }

    #[test]
    fn test_negated_group() {
        let mut filters = FilterMap::new();
        filters.insert("country", "BR");
        filters.insert("country_bool_not", "true");

        let applied = render_applied(&filters, &labels(), &LabelStandardizer::default());
        assert!(applied.groups[0].negated);
        assert!(applied.to_html().contains(">NOT</span> Brazil"));
    }

    #[test]
    fn test_year_range_and_operators() {
        let mut filters = FilterMap::new();
        filters.append("document_language", "pt");
        filters.append("document_language", "en");
        filters.insert("document_language_operator", "and");
        filters.insert("country", "BR");
        filters.insert("country_operator", "or");
        filters.insert("document_publication_year_start", "2015");
        filters.insert("document_publication_year_end", "2010");

        let applied = render_applied(&filters, &labels(), &LabelStandardizer::default());
        let last = applied.groups.last().unwrap();
        assert_eq!(last.label, "Publication Year");
        assert_eq!(last.values, vec!["2010 to 2015"]);

        assert_eq!(applied.operators.len(), 1);
        assert_eq!(applied.operators[0].label, "Document Language");
        assert_eq!(applied.operators[0].operator, MatchOperator::And);
        assert!(applied.to_html().contains("Search Options"));
    }

    #[test]
    fn test_publication_year_group_compressed() {
        let mut filters = FilterMap::new();
        for y in ["2001", "2002", "2003", "2005"] {
            filters.append("publication_year", y);
        }
        let applied = render_applied(&filters, &labels(), &LabelStandardizer::default());
        assert_eq!(applied.groups[0].values, vec!["2001 to 2003, 2005"]);
    }

    #[test]
    fn test_empty_when_only_ignored_keys() {
        let mut filters = FilterMap::new();
        filters.insert("csrfmiddlewaretoken", "abc");
        filters.insert("breakdown_variable", "country");
        filters.insert("ranking_metric", "x");
        let applied = render_applied(&filters, &(), &LabelStandardizer::default());
        assert!(applied.is_empty());
        assert_eq!(applied.to_html(), "");
    }

    #[test]
    fn test_panel_escapes_values() {
        let mut filters = FilterMap::new();
        filters.insert("publisher", "<b>Acme & Co</b>");
        let html = render_applied(&filters, &(), &LabelStandardizer::default()).to_html();
        assert!(html.contains("&lt;b&gt;Acme &amp; Co&lt;/b&gt;"));
        assert!(!html.contains("<b>Acme"));
    }

    #[test]
    fn test_search_chips() {
        let form = FilterForm::new(vec![
            Control::multi_select(
                "type",
                "Type",
                vec![
                    SelectOption::new("a", "Article"),
                    SelectOption::new("b", "Book"),
                ],
            )
            .with_value(&["a", "b"]),
            Control::select("lang", "", vec![SelectOption::new("pt", "Portuguese")])
                .with_value(&["pt"]),
        ]);
        let active = search_chips(" <q> ", &form);
        assert_eq!(active.count(), 3);
        assert_eq!(active.chips[0].text, "Article");
        assert_eq!(active.chips[2].label, "lang");
        assert_eq!(active.query.as_deref(), Some("<q>"));
        let html = active.to_html();
        assert!(html.contains("&lt;q&gt;"));
        assert!(!html.contains("<q>"));

        assert!(search_chips("", &FilterForm::default()).is_empty());
    }
}
