//! View-model of the filter form.
//!
//! Controls are kept in form order; collecting walks them the same way a
//! browser walks form data, so repeated names accumulate into lists.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalogue::{FieldMetadata, FilterCatalogue, SearchFilters};
use super::{FilterMap, FilterValue, NOT_SUFFIX};
use crate::labels::LabelStandardizer;

/// Controls a reset leaves untouched unless told otherwise.
pub const DEFAULT_PRESERVED_KEYS: &[&str] = &[
    "study_unit",
    "breakdown_variable",
    "country_operator",
    "document_language_operator",
];

/// Publication years from this one on are pre-selected on a fresh form.
pub const DEFAULT_FIRST_YEAR: i32 = 2014;

/// Keys that never count as a user filter when deciding whether the
/// baseline comparison chart applies.
const NON_FILTER_KEYS: &[&str] = &[
    "publication_year",
    "study_unit",
    "breakdown_variable",
    "data_source",
    "country_unit",
    "document_language_operator",
    "country_operator",
    "csrfmiddlewaretoken",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlKind {
    Select {
        options: Vec<SelectOption>,
        selected: Option<String>,
    },
    MultiSelect {
        options: Vec<SelectOption>,
        selected: Vec<String>,
    },
    /// Text, number or date input.
    Input { value: String },
    Hidden { value: String },
}

/// A single named form control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub name: String,
    pub label: String,
    pub kind: ControlKind,
    /// `Some(active)` when the control sits in a group with a NOT toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_toggle: Option<bool>,
    /// Bumped whenever the enhanced select widget must redraw.
    #[serde(skip)]
    pub widget_refreshes: u32,
}

impl Control {
    fn with_kind(name: &str, label: &str, kind: ControlKind) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            label: label.to_string(),
            kind,
            not_toggle: None,
            widget_refreshes: 0,
        }
    }

    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::with_kind(
            name,
            label,
            ControlKind::Select {
                options,
                selected: None,
            },
        )
    }

    pub fn multi_select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::with_kind(
            name,
            label,
            ControlKind::MultiSelect {
                options,
                selected: Vec::new(),
            },
        )
    }

    pub fn input(name: &str, label: &str) -> Self {
        Self::with_kind(
            name,
            label,
            ControlKind::Input {
                value: String::new(),
            },
        )
    }

    pub fn hidden(name: &str, value: &str) -> Self {
        Self::with_kind(
            name,
            "",
            ControlKind::Hidden {
                value: value.to_string(),
            },
        )
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_not_toggle(mut self) -> Self {
        self.not_toggle = Some(false);
        self
    }

    /// Select `values` (or set the input value to the first one).
    pub fn with_value(mut self, values: &[&str]) -> Self {
        self.set_values(values, false);
        self
    }

    /// Submitted values, blanks skipped.
    pub fn values(&self) -> Vec<&str> {
        let values: Vec<&str> = match &self.kind {
            ControlKind::Select { selected, .. } => selected.iter().map(String::as_str).collect(),
            ControlKind::MultiSelect { selected, .. } => {
                selected.iter().map(String::as_str).collect()
            }
            ControlKind::Input { value } | ControlKind::Hidden { value } => vec![value.as_str()],
        };
        values.into_iter().filter(|v| !v.is_empty()).collect()
    }

    pub fn options(&self) -> &[SelectOption] {
        match &self.kind {
            ControlKind::Select { options, .. } | ControlKind::MultiSelect { options, .. } => {
                options
            }
            _ => &[],
        }
    }

    /// Display text of an option value, falling back to the value itself.
    pub fn option_label<'a>(&'a self, value: &'a str) -> &'a str {
        self.options()
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
            .unwrap_or(value)
    }

    pub fn is_select(&self) -> bool {
        matches!(
            self.kind,
            ControlKind::Select { .. } | ControlKind::MultiSelect { .. }
        )
    }

    pub fn is_negated(&self) -> bool {
        self.not_toggle == Some(true)
    }

    fn set_values(&mut self, values: &[&str], add_missing: bool) {
        match &mut self.kind {
            ControlKind::MultiSelect { options, selected } => {
                if add_missing {
                    for value in values {
                        if !options.iter().any(|o| o.value == *value) {
                            options.push(SelectOption::new(*value, *value));
                        }
                    }
                }
                *selected = values.iter().map(|v| v.to_string()).collect();
            }
            ControlKind::Select { options, selected } => {
                let first = values.first().copied().unwrap_or("");
                if add_missing && !first.is_empty() && !options.iter().any(|o| o.value == first)
                {
                    options.push(SelectOption::new(first, first));
                }
                *selected = (!first.is_empty()).then(|| first.to_string());
            }
            ControlKind::Input { value } | ControlKind::Hidden { value } => {
                *value = values.first().map(|v| v.to_string()).unwrap_or_default();
            }
        }
    }

    fn clear(&mut self) {
        match &mut self.kind {
            ControlKind::Select { selected, .. } => *selected = None,
            ControlKind::MultiSelect { selected, .. } => selected.clear(),
            ControlKind::Input { value } => value.clear(),
            ControlKind::Hidden { .. } => return,
        }
        self.widget_refreshes += 1;
    }
}

/// Per-index field layout of the indicators filter menu.
fn indicator_fields(data_source: &str) -> &'static [(&'static str, &'static str)] {
    match data_source {
        "openalex_works" => &[
            ("source_index", "Source Index"),
            ("source_type", "Source Type"),
            ("publication_year", "Publication Year"),
            ("document_type", "Document Type"),
            ("document_language", "Document Language"),
            ("open_access", "Open Access"),
            ("access_type", "Access Type"),
            ("subject_area_level_0", "Subject Area Level 0"),
            ("subject_area_level_1", "Subject Area Level 1"),
            ("subject_area_level_2", "Subject Area Level 2"),
            ("region_world", "Region - World (Author)"),
            ("country", "Country (Author)"),
        ],
        "scielo" => &[
            ("journal", "Journal"),
            ("publication_year", "Publication Year"),
            ("document_type", "Document Type"),
            ("document_language", "Document Language"),
            ("access_type", "Access Type"),
            ("country", "Country (Author)"),
        ],
        "social_production" => &[
            ("publication_year", "Publication Year"),
            ("directory_type", "Directory Type"),
            ("action", "Action"),
            ("classification", "Classification"),
            ("institutions", "Institutions"),
            ("cities", "Cities"),
            ("states", "States"),
            ("practice", "Practice"),
        ],
        _ => &[],
    }
}

/// Field key to menu label for an indicators data source.
pub fn indicator_field_labels(data_source: &str) -> HashMap<String, String> {
    indicator_fields(&data_source.to_lowercase())
        .iter()
        .map(|(key, label)| (key.to_string(), label.to_string()))
        .collect()
}

/// The whole filter form, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterForm {
    pub controls: Vec<Control>,
}

impl FilterForm {
    pub fn new(controls: Vec<Control>) -> Self {
        Self { controls }
    }

    pub fn push(&mut self, control: Control) {
        self.controls.push(control);
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|c| c.name == name)
    }

    /// Human label of a field, if the form shows one.
    pub fn label_for(&self, name: &str) -> Option<&str> {
        self.control(name)
            .map(|c| c.label.as_str())
            .filter(|l| !l.is_empty())
    }

    /// Build the indicators filter menu for a data source from its option
    /// catalogue. Fields missing from the catalogue are left out.
    pub fn for_data_source(
        data_source: &str,
        catalogue: &FilterCatalogue,
        country_unit: Option<&str>,
        labels: &LabelStandardizer,
    ) -> Self {
        let data_source = data_source.to_lowercase();
        let fields = indicator_fields(&data_source);
        let social = data_source == "social_production";
        let mut form = FilterForm::default();

        for (key, label) in fields {
            let Some(items) = catalogue.get(key) else {
                continue;
            };
            if data_source == "openalex_works" && country_unit == Some("BR") && *key == "country"
            {
                continue;
            }

            let mut seen = std::collections::HashSet::new();
            let mut options: Vec<SelectOption> = items
                .iter()
                .filter_map(|item| {
                    let value = if *key == "country" {
                        item.value.to_uppercase()
                    } else {
                        item.value.clone()
                    };
                    if !seen.insert(value.to_lowercase()) {
                        return None;
                    }
                    let label = labels.standardize(key, &value);
                    Some(SelectOption::new(value, label))
                })
                .collect();
            if matches!(*key, "country" | "document_language") {
                sort_by_label(&mut options);
            }

            let defaults: Vec<String> = if *key == "publication_year" {
                options
                    .iter()
                    .filter(|o| {
                        o.value
                            .parse::<i32>()
                            .map(|y| y >= DEFAULT_FIRST_YEAR)
                            .unwrap_or(false)
                    })
                    .map(|o| o.value.clone())
                    .collect()
            } else {
                Vec::new()
            };

            let mut control = Control::multi_select(key, label, options);
            if social {
                control = control.with_id(&format!("{}.enum", key));
            }
            if *key != "publication_year" {
                control = control.with_not_toggle();
            }
            let default_refs: Vec<&str> = defaults.iter().map(String::as_str).collect();
            control.set_values(&default_refs, false);
            form.push(control);

            if matches!(*key, "country" | "document_language") {
                form.push(operator_control(key));
            }
        }

        let breakdown_options = std::iter::once(SelectOption::new("", "Select a variable"))
            .chain(
                fields
                    .iter()
                    .filter(|(key, _)| *key != "publication_year")
                    .filter(|(key, _)| !(data_source == "scielo" && *key == "journal"))
                    .filter(|(key, _)| catalogue.get(key).is_some())
                    .map(|(key, label)| {
                        let value = if social {
                            format!("{}.enum", key)
                        } else {
                            key.to_string()
                        };
                        SelectOption::new(value, *label)
                    }),
            )
            .collect();
        form.push(Control::select(
            "breakdown_variable",
            "Breakdown Variable",
            breakdown_options,
        ));

        debug!(
            "Built filter form for {} with {} controls",
            data_source,
            form.controls.len()
        );
        form
    }

    /// Build the search-page filter form from the filter endpoint response.
    /// Range fields are not rendered as selects.
    pub fn for_search(filters: &SearchFilters) -> Self {
        let mut form = FilterForm::default();
        let default_meta = FieldMetadata::default();
        for (key, items) in filters.filters.iter() {
            let meta = filters.filter_metadata.get(key).unwrap_or(&default_meta);
            if meta.is_range() {
                continue;
            }
            let label = meta.label.as_deref().unwrap_or(key);
            let options = items
                .iter()
                .map(|o| SelectOption::new(o.value.clone(), o.label.clone()))
                .collect();
            let control = if meta.is_multiple() {
                Control::multi_select(key, label, options)
            } else {
                Control::select(key, label, options)
            };
            form.push(control);
        }
        form
    }

    /// Walk the controls in order and gather their non-empty values.
    pub fn collect(&self) -> FilterMap {
        let mut map = FilterMap::new();
        for control in &self.controls {
            if control.name.is_empty() {
                continue;
            }
            for value in control.values() {
                map.append(control.name.clone(), value);
            }
        }
        for control in &self.controls {
            if control.is_negated() && !control.name.is_empty() {
                map.insert(format!("{}{}", control.name, NOT_SUFFIX), "true");
            }
        }
        map
    }

    /// Collect, then fill a missing `scope` from the page URL.
    pub fn collect_with_scope(&self, query: &FilterMap) -> FilterMap {
        let mut map = self.collect();
        let has_scope = map.get("scope").map(|v| !v.is_blank()).unwrap_or(false);
        if !has_scope {
            if let Some(scope) = scope_from_url(query) {
                map.insert("scope", FilterValue::Single(scope));
            }
        }
        map
    }

    /// Apply URL parameters to the matching controls. Multi-selects take
    /// every value, adding options they lack; other controls take the first.
    pub fn restore_from_url(&mut self, query: &FilterMap) {
        for control in &mut self.controls {
            let values = query.values(&control.name);
            if values.is_empty() {
                continue;
            }
            control.set_values(&values, true);
            control.widget_refreshes += 1;
        }
    }

    /// Clear every control whose name is not in `preserve`.
    pub fn reset(&mut self, preserve: &[&str]) {
        for control in &mut self.controls {
            if preserve.contains(&control.name.as_str()) {
                continue;
            }
            control.clear();
        }
    }

    /// Flip the NOT toggle of a control's group. Returns the new state, or
    /// `None` when the control or its toggle does not exist.
    pub fn toggle_not(&mut self, name: &str) -> Option<bool> {
        let control = self.control_mut(name)?;
        let active = control.not_toggle.as_mut()?;
        *active = !*active;
        Some(*active)
    }

    /// Select the URL's scope in the `scope` control when nothing is chosen.
    pub fn sync_scope_from_url(&mut self, query: &FilterMap) {
        let Some(scope) = scope_from_url(query) else {
            return;
        };
        let Some(control) = self.control_mut("scope") else {
            return;
        };
        if !control.is_select() || !control.values().is_empty() {
            return;
        }
        control.set_values(&[scope.as_str()], true);
        control.widget_refreshes += 1;
    }

    /// Fill select controls from an option catalogue. Labels are
    /// standardized and options sorted case-insensitively by label.
    pub fn populate_options(
        &mut self,
        catalogue: &FilterCatalogue,
        exclude: &[&str],
        labels: &LabelStandardizer,
    ) {
        for (key, items) in catalogue.iter() {
            if exclude.contains(&key) {
                continue;
            }
            let Some(control) = self.controls.iter_mut().find(|c| c.id == key) else {
                continue;
            };
            let mut fresh: Vec<SelectOption> = items
                .iter()
                .filter(|o| !o.value.is_empty())
                .map(|o| SelectOption::new(o.value.clone(), labels.standardize(key, &o.label)))
                .collect();
            sort_by_label(&mut fresh);
            match &mut control.kind {
                ControlKind::Select { options, .. } | ControlKind::MultiSelect { options, .. } => {
                    options.extend(fresh);
                    control.widget_refreshes += 1;
                }
                _ => {}
            }
        }
    }

    /// Drop every selected value of a field.
    pub fn remove_filter(&mut self, name: &str) {
        if let Some(control) = self.control_mut(name) {
            control.clear();
        }
    }

    /// Drop one selected value of a multi-select field.
    pub fn remove_filter_value(&mut self, name: &str, value: &str) {
        if let Some(control) = self.control_mut(name) {
            if let ControlKind::MultiSelect { selected, .. } = &mut control.kind {
                selected.retain(|v| v != value);
                control.widget_refreshes += 1;
            }
        }
    }
}

fn operator_control(field: &str) -> Control {
    let (label, noun, default) = if field == "document_language" {
        ("Language Match Logic", "language", "and")
    } else {
        ("Country Match Logic", "country", "or")
    };
    let options = vec![
        SelectOption::new(
            "and",
            format!("AND (document must include every selected {})", noun),
        ),
        SelectOption::new(
            "or",
            format!("OR (document may include any selected {})", noun),
        ),
    ];
    Control::select(&format!("{}_operator", field), label, options).with_value(&[default])
}

fn sort_by_label(options: &mut [SelectOption]) {
    options.sort_by_cached_key(|o| o.label.to_lowercase());
}

/// Scope requested by the page URL (`scope`, or the legacy
/// `source_index_open_alex`).
pub fn scope_from_url(query: &FilterMap) -> Option<String> {
    query
        .get_str("scope")
        .filter(|v| !v.trim().is_empty())
        .or_else(|| query.get_str("source_index_open_alex"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// True when the map holds a user filter beyond years, operators and the
/// breakdown itself.
pub fn has_other_filters(filters: &FilterMap) -> bool {
    filters
        .iter()
        .any(|(key, value)| is_user_filter(key) && !value.is_blank())
}

/// False for page settings (study unit, breakdown, operators) and flags.
pub fn is_user_filter(key: &str) -> bool {
    !NON_FILTER_KEYS.contains(&key) && !key.ends_with(NOT_SUFFIX)
}

/// Body of the indicator data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub study_unit: String,
    pub breakdown_variable: Option<String>,
    pub filters: FilterMap,
}

impl IndicatorRequest {
    /// Wrap a collected filter map, lifting the breakdown variable out of it.
    pub fn new(study_unit: impl Into<String>, filters: FilterMap) -> Self {
        let breakdown_variable = filters
            .get_str("breakdown_variable")
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self {
            study_unit: study_unit.into(),
            breakdown_variable,
            filters,
        }
    }

    /// The same breakdown without any user filter. Year bounds are dropped
    /// too: the share baseline covers every year.
    pub fn baseline(&self) -> Self {
        Self {
            study_unit: self.study_unit.clone(),
            breakdown_variable: self.breakdown_variable.clone(),
            filters: FilterMap::new(),
        }
    }
}

/// Query pairs for the search results endpoint: the query text, the index
/// and one pair per selected value.
pub fn build_search_params(
    query_text: &str,
    index_name: &str,
    form: &FilterForm,
) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if !query_text.is_empty() {
        params.push(("search".to_string(), query_text.to_string()));
    }
    if !index_name.is_empty() {
        params.push(("index_name".to_string(), index_name.to_string()));
    }
    for control in form.controls.iter().filter(|c| c.is_select()) {
        for value in control.values() {
            params.push((control.name.clone(), value.to_string()));
        }
    }
    params
}
