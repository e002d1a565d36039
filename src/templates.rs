//! HTML fragments injected into the portal pages.
//!
//! Every fragment is built with `format!` and every interpolated value goes
//! through [`html_escape`] first.

use crate::filters::{ActiveFilters, AppliedFilters};
use crate::results::Document;

/// Escape text for use in HTML text and double- or single-quoted attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const NOT_BADGE: &str = r#"<span class="badge badge-oca-light bg-danger text-white">NOT</span>"#;
const AND_SEPARATOR: &str = r#"<span class="badge badge-oca-light bg-secondary mx-2">AND</span>"#;

/// Applied-filters summary panel.
pub fn applied_filters_panel(applied: &AppliedFilters) -> String {
    let groups: Vec<String> = applied
        .groups
        .iter()
        .map(|group| {
            let values: Vec<String> = group
                .values
                .iter()
                .map(|v| {
                    if group.negated {
                        format!("{} {}", NOT_BADGE, html_escape(v))
                    } else {
                        html_escape(v)
                    }
                })
                .collect();
            format!(
                r#"<span class="fw-bold">{}:</span> {}"#,
                html_escape(&group.label),
                values.join(", ")
            )
        })
        .collect();

    let mut html = format!(
        r#"<strong class="text-primary">{}</strong><div>{}</div>"#,
        html_escape(&applied.title),
        groups.join(AND_SEPARATOR)
    );

    if !applied.operators.is_empty() {
        let badges: Vec<String> = applied
            .operators
            .iter()
            .map(|op| {
                format!(
                    r#"<span><span class="fw-bold">{}:</span> <span class="badge badge-oca-light bg-secondary">{}</span></span>"#,
                    html_escape(&op.label),
                    op.operator.badge()
                )
            })
            .collect();
        html.push_str(&format!(
            r#"<strong class="mt-1 text-primary">{}</strong><div>{}</div>"#,
            html_escape(&applied.options_title),
            badges.join(" ")
        ));
    }

    html
}

/// Search-page query and filter chips with the active filter count.
pub fn active_filters(active: &ActiveFilters) -> String {
    let search = match &active.query {
        Some(query) => format!(
            r#"<div id="search-query-badge"><span class="applied-filter-chip"><i class="icon-filter"></i> <strong>Search:</strong> {}<button type="button" class="btn-close btn-close-black ms-1" data-clear-search="true"></button></span></div>"#,
            html_escape(query)
        ),
        None => String::new(),
    };

    let chips: String = active
        .chips
        .iter()
        .map(|chip| {
            format!(
                r#"<span class="applied-filter-chip"><i class="icon-filter"></i> <strong>{}:</strong> {}<button type="button" class="btn-close btn-close-black ms-1" data-filter-key="{}" data-filter-value="{}"></button></span>"#,
                html_escape(&chip.label),
                html_escape(&chip.text),
                html_escape(&chip.key),
                html_escape(&chip.value)
            )
        })
        .collect();

    format!(
        r#"<div id="active-filters-container">{}<div id="selected-filters-badges">{}</div><span id="active-filters-count">{}</span></div>"#,
        search,
        chips,
        active.count()
    )
}

/// Inline error banner above the charts.
pub fn error_banner(message: &str) -> String {
    format!(
        r#"<div id="indicator-chart-error" class="alert alert-danger shadow-sm mb-3 mt-2" role="alert">{}</div>"#,
        html_escape(message)
    )
}

/// Alert shown when a search returns nothing.
pub fn empty_results(message: &str) -> String {
    format!(
        r#"<div class="alert alert-info" role="alert"><i class="icon-info-sign"></i> {}</div>"#,
        html_escape(message)
    )
}

fn optional_block(value: Option<&str>, render: impl FnOnce(String) -> String) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => render(html_escape(v)),
        None => String::new(),
    }
}

fn list_block(values: &[String], class: &str, label: &str) -> String {
    let values: Vec<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(html_escape)
        .collect();
    if values.is_empty() {
        return String::new();
    }
    format!(
        r#"<p class="{}"><strong>{}:</strong> {}</p>"#,
        class,
        label,
        values.join("; ")
    )
}

fn title_block(doc: &Document) -> String {
    let title = html_escape(doc.title.as_deref().unwrap_or("Untitled"));
    match doc.url.as_deref().map(str::trim).filter(|u| is_safe_url(u)) {
        Some(url) => format!(
            r#"<h5 class="result-title"><a href="{}" target="_blank" rel="noopener">{}</a></h5>"#,
            html_escape(url),
            title
        ),
        None => format!(r#"<h5 class="result-title">{}</h5>"#, title),
    }
}

/// Only http(s) and site-relative links become anchors.
fn is_safe_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return true;
    }
    // `//host` is protocol-relative and leaves the site.
    lower.starts_with('/') && !lower.starts_with("//") && !lower.starts_with("/\\")
}

/// Card for journal articles and other bibliographic records.
pub fn bibliographic_card(doc: &Document) -> String {
    let meta_line = [
        doc.source.as_deref(),
        doc.year.as_deref(),
        doc.document_type.as_deref(),
    ]
    .iter()
    .flatten()
    .map(|v| v.trim())
    .filter(|v| !v.is_empty())
    .map(html_escape)
    .collect::<Vec<_>>()
    .join(" | ");
    let meta = if meta_line.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="result-meta text-muted">{}</p>"#, meta_line)
    };

    let doi = optional_block(doc.doi.as_deref(), |doi| {
        format!(
            r#"<p class="result-doi">DOI: <a href="https://doi.org/{0}" target="_blank" rel="noopener">{0}</a></p>"#,
            doi
        )
    });
    let abstract_block = optional_block(doc.abstract_text.as_deref(), |text| {
        format!(r#"<p class="result-abstract">{}</p>"#, text)
    });

    format!(
        r#"<div class="result-item result-bibliographic">{}{}{}{}{}{}{}</div>"#,
        title_block(doc),
        list_block(&doc.authors, "result-authors", "Authors"),
        meta,
        doi,
        list_block(&doc.institutions, "result-institutions", "Institutions"),
        abstract_block,
        list_block(&doc.keywords, "result-keywords", "Keywords"),
    )
}

/// Card for social-production records (actions, practices, events).
pub fn social_card(doc: &Document) -> String {
    let directory = optional_block(doc.directory_type.as_deref(), |v| {
        format!(r#"<span class="badge bg-secondary">{}</span>"#, v)
    });
    let action = optional_block(doc.action.as_deref(), |v| {
        format!(r#"<p class="result-action"><strong>Action:</strong> {}</p>"#, v)
    });
    let practice = optional_block(doc.practice.as_deref(), |v| {
        format!(r#"<p class="result-practice"><strong>Practice:</strong> {}</p>"#, v)
    });
    let classification = optional_block(doc.classification.as_deref(), |v| {
        format!(
            r#"<p class="result-classification"><strong>Classification:</strong> {}</p>"#,
            v
        )
    });
    let year = optional_block(doc.year.as_deref(), |v| {
        format!(r#"<p class="result-meta text-muted">{}</p>"#, v)
    });
    let description = optional_block(doc.abstract_text.as_deref(), |v| {
        format!(r#"<p class="result-abstract">{}</p>"#, v)
    });

    let mut places = doc.cities.clone();
    places.extend(doc.states.iter().cloned());

    format!(
        r#"<div class="result-item result-social">{}{}{}{}{}{}{}{}{}</div>"#,
        directory,
        title_block(doc),
        year,
        list_block(&doc.institutions, "result-institutions", "Institutions"),
        action,
        practice,
        classification,
        list_block(&places, "result-places", "Places"),
        description,
    )
}

/// Fallback card: title, year and description.
pub fn generic_card(doc: &Document) -> String {
    let year = optional_block(doc.year.as_deref(), |v| {
        format!(r#"<p class="result-meta text-muted">{}</p>"#, v)
    });
    let description = optional_block(doc.abstract_text.as_deref(), |v| {
        format!(r#"<p class="result-abstract">{}</p>"#, v)
    });
    format!(
        r#"<div class="result-item">{}{}{}</div>"#,
        title_block(doc),
        year,
        description
    )
}

/// Wrap rendered items with the total count.
pub fn results_list(total: u64, items: &str) -> String {
    format!(
        r#"<div class="results-list"><p class="results-total text-muted">{} results</p>{}</div>"#,
        total, items
    )
}
