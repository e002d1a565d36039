//! Per-page session helpers: fetch sequencing, the submit guard, the chart
//! instance registry and the persisted layout preference.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::charts::{ChartOptions, ChartSet};

/// Hands out increasing tickets so that only the newest fetch is applied.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

/// Ticket of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch; every earlier ticket becomes stale.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Run `apply` only if `ticket` is still the latest. Returns whether it ran.
    pub fn apply_if_current<F: FnOnce()>(&self, ticket: Ticket, apply: F) -> bool {
        if self.is_current(ticket) {
            apply();
            true
        } else {
            debug!("Dropping stale response for ticket {}", ticket.0);
            false
        }
    }
}

/// Disabled state of the form's submit button.
#[derive(Debug, Clone, Default)]
pub struct SubmitButton {
    disabled: Arc<AtomicBool>,
}

impl SubmitButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Disable the button until the returned guard is dropped.
    pub fn guard(&self) -> SubmitGuard {
        self.disabled.store(true, Ordering::SeqCst);
        SubmitGuard {
            disabled: Arc::clone(&self.disabled),
        }
    }
}

/// Keeps the submit button disabled while a request is in flight.
#[derive(Debug)]
pub struct SubmitGuard {
    disabled: Arc<AtomicBool>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.disabled.store(false, Ordering::SeqCst);
    }
}

/// A live chart instance owned by the rendering layer.
pub trait ChartHandle: Send {
    fn set_option(&mut self, options: &ChartOptions);
    fn resize(&mut self);
    fn dispose(&mut self);
}

/// Container id to chart instance.
#[derive(Default)]
pub struct ChartRegistry {
    charts: HashMap<String, Box<dyn ChartHandle>>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh instance for `container`, disposing any previous one.
    pub fn init(&mut self, container: &str, handle: Box<dyn ChartHandle>) -> &mut dyn ChartHandle {
        self.dispose(container);
        self.charts
            .entry(container.to_string())
            .or_insert(handle)
            .as_mut()
    }

    /// Dispose and forget the instance of `container`, if any.
    pub fn dispose(&mut self, container: &str) {
        if let Some(mut handle) = self.charts.remove(container) {
            handle.dispose();
        }
    }

    pub fn dispose_all(&mut self) {
        for (_, mut handle) in self.charts.drain() {
            handle.dispose();
        }
    }

    pub fn resize_all(&mut self) {
        for handle in self.charts.values_mut() {
            handle.resize();
        }
    }

    pub fn contains(&self, container: &str) -> bool {
        self.charts.contains_key(container)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Render a chart set: every slot with options gets a new instance from
    /// `make`, empty slots lose theirs. Returns the ids left visible.
    pub fn apply_chart_set<F>(&mut self, set: &ChartSet, mut make: F) -> Vec<String>
    where
        F: FnMut(&str) -> Box<dyn ChartHandle>,
    {
        let mut visible = Vec::new();
        for slot in set.slots() {
            match &slot.options {
                Some(options) => {
                    let handle = make(&slot.container);
                    self.init(&slot.container, handle).set_option(options);
                    visible.push(slot.container.clone());
                }
                None => self.dispose(&slot.container),
            }
        }
        visible
    }
}

/// Viewports at least this wide get the collapsible filter sidebar.
pub const DESKTOP_MIN_WIDTH_PX: u32 = 992;
const FILTERS_HIDDEN_KEY: &str = "indicator:filters_hidden";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(rename = "indicator:filters_hidden", default)]
    filters_hidden: bool,
}

/// Whether the filter sidebar is collapsed, persisted across sessions.
#[derive(Debug, Clone)]
pub struct LayoutPreference {
    path: PathBuf,
}

impl LayoutPreference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored flag; unreadable or missing storage reads as not hidden.
    pub fn filters_hidden(&self) -> bool {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return false,
        };
        match serde_json::from_str::<PreferenceFile>(&text) {
            Ok(file) => file.filters_hidden,
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", FILTERS_HIDDEN_KEY, e);
                false
            }
        }
    }

    /// Persist the flag. Storage errors are logged and otherwise ignored.
    pub fn set_filters_hidden(&self, hidden: bool) {
        let file = PreferenceFile {
            filters_hidden: hidden,
        };
        let result = serde_json::to_string(&file)
            .map_err(std::io::Error::other)
            .and_then(|text| {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, text)
            });
        if let Err(e) = result {
            warn!("Could not store {}: {}", FILTERS_HIDDEN_KEY, e);
        }
    }

    /// Hidden state to apply at `viewport_width`; only desktop layouts hide.
    pub fn effective_hidden(&self, viewport_width: u32) -> bool {
        viewport_width >= DESKTOP_MIN_WIDTH_PX && self.filters_hidden()
    }

    /// Flip the flag and return the new state.
    pub fn toggle(&self) -> bool {
        let hidden = !self.filters_hidden();
        self.set_filters_hidden(hidden);
        hidden
    }
}

/// Label of the sidebar toggle button.
pub fn toggle_label(hidden: bool) -> &'static str {
    if hidden {
        "Show filters"
    } else {
        "Hide filters"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_stale_ticket_rejected() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.begin();
        let second = sequencer.begin();
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));

        let mut applied = Vec::new();
        assert!(!sequencer.apply_if_current(first, || applied.push(1)));
        assert!(sequencer.apply_if_current(second, || applied.push(2)));
        assert_eq!(applied, vec![2]);
    }

    #[test]
    fn test_submit_guard_reenables_on_drop() {
        let button = SubmitButton::new();
        {
            let _guard = button.guard();
            assert!(button.is_disabled());
        }
        assert!(!button.is_disabled());

        let result: Result<(), &str> = (|| {
            let _guard = button.guard();
            Err("upstream failed")
        })();
        assert!(result.is_err());
        assert!(!button.is_disabled());
    }

    #[derive(Default)]
    struct Calls {
        events: Mutex<Vec<String>>,
    }

    struct FakeChart {
        id: usize,
        calls: Arc<Calls>,
    }

    impl FakeChart {
        fn record(&self, event: &str) {
            self.calls
                .events
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.id));
        }
    }

    impl ChartHandle for FakeChart {
        fn set_option(&mut self, _options: &ChartOptions) {
            self.record("set");
        }
        fn resize(&mut self) {
            self.record("resize");
        }
        fn dispose(&mut self) {
            self.record("dispose");
        }
    }

    #[test]
    fn test_init_disposes_previous_instance() {
        let calls = Arc::new(Calls::default());
        let mut registry = ChartRegistry::new();
        registry.init("docs-chart", Box::new(FakeChart { id: 1, calls: calls.clone() }));
        registry.init("docs-chart", Box::new(FakeChart { id: 2, calls: calls.clone() }));
        registry.resize_all();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            *calls.events.lock().unwrap(),
            vec!["dispose:1".to_string(), "resize:2".to_string()]
        );
    }

    #[test]
    fn test_empty_registry_is_noop() {
        let mut registry = ChartRegistry::new();
        registry.resize_all();
        registry.resize_all();
        registry.dispose("missing");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_chart_set() {
        use crate::charts::build_chart_set;
        use crate::payload::{StudyUnit, TimeSeriesPayload};

        let payload = TimeSeriesPayload {
            years: vec!["2020".into()],
            ndocs_per_year: vec![4.0],
            total_citations_per_year: vec![0.0],
            ..Default::default()
        };
        let set = build_chart_set(&payload, StudyUnit::Document, None, Some(860));

        let calls = Arc::new(Calls::default());
        let mut registry = ChartRegistry::new();
        registry.init("citations-chart", Box::new(FakeChart { id: 0, calls: calls.clone() }));
        let mut next = 0;
        let visible = registry.apply_chart_set(&set, |_| {
            next += 1;
            Box::new(FakeChart { id: next, calls: calls.clone() })
        });

        assert!(visible.contains(&"docs-chart".to_string()));
        assert!(!visible.contains(&"citations-chart".to_string()));
        assert!(!registry.contains("citations-chart"));
        assert!(calls.events.lock().unwrap().contains(&"dispose:0".to_string()));
    }

    #[test]
    fn test_layout_preference_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let pref = LayoutPreference::new(dir.path().join("nested").join("prefs.json"));
        assert!(!pref.filters_hidden());

        assert!(pref.toggle());
        assert!(pref.filters_hidden());
        assert!(pref.effective_hidden(1200));
        assert!(!pref.effective_hidden(800));
        assert_eq!(toggle_label(pref.filters_hidden()), "Show filters");

        fs::write(pref.path(), "not json").unwrap();
        assert!(!pref.filters_hidden());
        assert_eq!(toggle_label(false), "Hide filters");
    }
}
