//! Display labels for raw filter and breakdown codes.
//!
//! Country and language codes are resolved through a [`DisplayNames`]
//! service, collection acronyms through a fixed table, and boolean flags to
//! `Yes`/`No`. Every function here is total: unknown input comes back as-is.

mod tables;

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use tables::{
    lookup, COLLECTION_NAMES, FALLBACK_LANGUAGE_NAMES, FALLBACK_REGION_NAMES, LANGUAGE_NAMES,
    REGION_NAMES,
};

/// Metric suffixes that may trail a breakdown label, e.g. `"pt (Documents)"`.
pub const METRIC_SUFFIXES: &[&str] = &[
    "Documents",
    "Citations",
    "Cited Documents",
    "Percent Docs With Citations",
    "Periodicals",
    "Documents per Periodical",
    "Citations per Periodical",
    "Cited Documents per Periodical",
    "Percent Periodicals With Cited Docs",
];

/// Locale-aware code to name lookups.
pub trait DisplayNames: Send + Sync {
    /// Name for an uppercase ISO 3166 region code.
    fn region(&self, code: &str) -> Option<String>;
    /// Name for a lowercase ISO 639 language code.
    fn language(&self, code: &str) -> Option<String>;
}

/// English display names backed by static ISO tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDisplayNames;

impl DisplayNames for BuiltinDisplayNames {
    fn region(&self, code: &str) -> Option<String> {
        lookup(REGION_NAMES, code).map(str::to_string)
    }

    fn language(&self, code: &str) -> Option<String> {
        lookup(LANGUAGE_NAMES, code).map(str::to_string)
    }
}

/// Message catalogue hook for user-visible words.
pub trait Translate: Send + Sync {
    fn gettext<'a>(&self, msgid: &'a str) -> Cow<'a, str>;
}

/// Returns every message unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untranslated;

impl Translate for Untranslated {
    fn gettext<'a>(&self, msgid: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(msgid)
    }
}

/// Which standardization rule a field key selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Country,
    Language,
    Collection,
    Flag,
    Other,
}

impl FieldKind {
    /// Classify a field key or its human label.
    pub fn of(field: &str) -> Self {
        let field = field.strip_suffix(".enum").unwrap_or(field);
        match field {
            "country" | "Country" | "source_country" | "Source Country" => FieldKind::Country,
            "document_language" | "Document Language" => FieldKind::Language,
            "collection" | "Collection" => FieldKind::Collection,
            "open_access" | "Open Access" => FieldKind::Flag,
            f if f.starts_with("is_") => FieldKind::Flag,
            _ => FieldKind::Other,
        }
    }
}

/// Converts raw codes to display labels.
#[derive(Clone)]
pub struct LabelStandardizer {
    names: Arc<dyn DisplayNames>,
    translate: Arc<dyn Translate>,
}

impl Default for LabelStandardizer {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinDisplayNames), Arc::new(Untranslated))
    }
}

impl std::fmt::Debug for LabelStandardizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelStandardizer").finish_non_exhaustive()
    }
}

fn language_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z]{2,4})*$").expect("valid regex"))
}

fn suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternatives = METRIC_SUFFIXES
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?is)^(.*?)\s+\(({})\)$", alternatives)).expect("valid regex")
    })
}

/// Split a trailing `" (Documents)"`-style suffix off a label.
///
/// The suffix is returned with its leading space and original casing so it
/// can be re-appended verbatim.
pub fn split_metric_suffix(value: &str) -> (&str, String) {
    match suffix_re().captures(value) {
        Some(caps) => {
            let base = caps.get(1).map_or("", |m| m.as_str());
            let word = caps.get(2).map_or("", |m| m.as_str());
            (base, format!(" ({})", word))
        }
        None => (value, String::new()),
    }
}

impl LabelStandardizer {
    pub fn new(names: Arc<dyn DisplayNames>, translate: Arc<dyn Translate>) -> Self {
        Self { names, translate }
    }

    /// Translate a user-visible message.
    pub fn tr<'a>(&self, msgid: &'a str) -> Cow<'a, str> {
        self.translate.gettext(msgid)
    }

    /// Display label for `value` under `field`.
    pub fn standardize(&self, field: &str, value: &str) -> String {
        match FieldKind::of(field) {
            FieldKind::Country => self.country(value),
            FieldKind::Language => self.language(value),
            FieldKind::Collection => self.collection(value),
            FieldKind::Flag => self.flag(value),
            FieldKind::Other => value.to_string(),
        }
    }

    /// Country name for an ISO code, keeping any metric suffix.
    pub fn country(&self, code: &str) -> String {
        let (base, suffix) = split_metric_suffix(code);
        if base.is_empty() {
            return String::new();
        }
        if base.chars().count() > 3 {
            return format!("{}{}", base.trim(), suffix);
        }
        let normalized = base.trim().to_uppercase();
        let label = self
            .names
            .region(&normalized)
            .or_else(|| lookup(FALLBACK_REGION_NAMES, &normalized).map(str::to_string))
            .map(|name| self.tr(&name).into_owned())
            .unwrap_or(normalized);
        format!("{}{}", label, suffix)
    }

    /// Language name for a BCP 47-ish tag, keeping any metric suffix.
    pub fn language(&self, code: &str) -> String {
        let normalized = code.trim();
        if normalized.is_empty() {
            return String::new();
        }
        let (base, suffix) = split_metric_suffix(normalized);
        let first = base
            .trim()
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .find(|t| !t.is_empty())
            .unwrap_or("");
        let tag = first.replace('_', "-");
        if !language_tag_re().is_match(&tag) {
            return format!("{}{}", first, suffix);
        }

        let mut parts = tag.split('-');
        let language = parts.next().unwrap_or("").to_lowercase();
        let region = parts.next().map(str::to_uppercase);

        let mut label = match self
            .names
            .language(&language)
            .or_else(|| lookup(FALLBACK_LANGUAGE_NAMES, &language).map(str::to_string))
        {
            Some(name) => capitalize_first(&name),
            None => language.to_uppercase(),
        };

        if let Some(region) = region {
            let region_label = self.country(&region);
            let region_label = if region_label.is_empty() {
                region
            } else {
                region_label
            };
            label.push_str(&format!(" ({})", region_label));
        }

        format!("{}{}", label, suffix)
    }

    /// SciELO collection name for an acronym, keeping any metric suffix.
    pub fn collection(&self, code: &str) -> String {
        let (base, suffix) = split_metric_suffix(code);
        let name = lookup(COLLECTION_NAMES, base)
            .map(|name| self.tr(name).into_owned())
            .unwrap_or_else(|| base.to_string());
        format!("{}{}", name, suffix)
    }

    /// `Yes`/`No` for boolean flag values.
    pub fn flag(&self, value: &str) -> String {
        match value {
            "1" | "true" | "True" => self.tr("Yes").into_owned(),
            "0" | "false" | "False" => self.tr("No").into_owned(),
            other => other.to_string(),
        }
    }

    /// `"Y1 to Y2"`, a single year when both ends match, empty when invalid.
    pub fn format_year_range(&self, start: &str, end: &str) -> String {
        match year_bounds(start, end) {
            Some((first, last)) if first == last => first.to_string(),
            Some((first, last)) => format!("{} {} {}", first, self.tr("to"), last),
            None => String::new(),
        }
    }
}

fn default_standardizer() -> &'static LabelStandardizer {
    static DEFAULT: OnceLock<LabelStandardizer> = OnceLock::new();
    DEFAULT.get_or_init(LabelStandardizer::default)
}

/// Standardize a value with the built-in English names.
pub fn standardize(field: &str, value: &str) -> String {
    default_standardizer().standardize(field, value)
}

/// Country label with the built-in English names.
pub fn standardize_country_code(code: &str) -> String {
    default_standardizer().country(code)
}

/// Language label with the built-in English names.
pub fn standardize_language_code(code: &str) -> String {
    default_standardizer().language(code)
}

/// Year range label with the built-in English names.
pub fn format_year_range(start: &str, end: &str) -> String {
    default_standardizer().format_year_range(start, end)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse a leading integer the way form inputs are read: surrounding
/// whitespace is ignored and trailing garbage after the digits is dropped.
pub fn parse_leading_int(text: &str) -> Option<i32> {
    let text = text.trim();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i32>().ok().map(|n| n * sign)
}

/// Widest span [`generate_year_list`] will expand.
pub const MAX_YEAR_SPAN: i64 = 1000;

/// Parsed `(lo, hi)` of two year inputs in either order.
pub fn year_bounds(start: &str, end: &str) -> Option<(i32, i32)> {
    let a = parse_leading_int(start)?;
    let b = parse_leading_int(end)?;
    Some(if a <= b { (a, b) } else { (b, a) })
}

/// Every year between `start` and `end` inclusive, in ascending order.
/// Empty when either input is not a year or the span exceeds
/// [`MAX_YEAR_SPAN`].
pub fn generate_year_list(start: &str, end: &str) -> Vec<i32> {
    match year_bounds(start, end) {
        Some((lo, hi)) if i64::from(hi) - i64::from(lo) < MAX_YEAR_SPAN => (lo..=hi).collect(),
        _ => Vec::new(),
    }
}

/// Compress a list of years into `"2001 to 2003, 2005"`.
pub fn years_to_ranges(years: &[i32]) -> String {
    let unique: BTreeSet<i32> = years.iter().copied().collect();
    let mut iter = unique.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };

    let mut ranges = Vec::new();
    let (mut start, mut end) = (first, first);
    for year in iter {
        if year == end + 1 {
            end = year;
        } else {
            ranges.push(format_run(start, end));
            start = year;
            end = year;
        }
    }
    ranges.push(format_run(start, end));
    ranges.join(", ")
}

fn format_run(start: i32, end: i32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{} to {}", start, end)
    }
}

/// Lowercase the text, then uppercase the first letter of every word.
pub fn to_title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.to_lowercase().chars() {
        if at_word_start && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}
