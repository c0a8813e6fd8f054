//! In-memory [`Host`] for running a [`DeviceContext`](crate::DeviceContext)
//! outside a browser, e.g. when pre-rendering markup on a server or in tests.
//!
//! The window is driven explicitly: [`HeadlessWindow::resize`] updates the
//! inner size, re-evaluates media queries and fires `resize` /
//! `orientationchange` listeners the way a browser would.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::host::*;
use super::types::Viewport;

/// `display` values the default headless style engine understands.
const DEFAULT_DISPLAY_VALUES: [&str; 7] = [
    "block",
    "inline",
    "inline-block",
    "none",
    "-webkit-box",
    "-webkit-flex",
    "flex",
];

pub struct HeadlessWindow {
    user_agent: String,
    size: Cell<Viewport>,
    media_queries_enabled: bool,
    probe_elements_enabled: bool,
    display_values: Rc<[String]>,
    /// Held weakly: a query lives as long as the caller keeps its handle.
    queries: RefCell<Vec<Weak<HeadlessMediaQuery>>>,
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
    dispatched: RefCell<Vec<String>>,
    tasks: RefCell<VecDeque<Task>>,
    root: Rc<HeadlessElement>,
}

impl HeadlessWindow {
    pub fn new(user_agent: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            user_agent: user_agent.into(),
            size: Cell::new(Viewport::new(width, height)),
            media_queries_enabled: true,
            probe_elements_enabled: true,
            display_values: DEFAULT_DISPLAY_VALUES.iter().map(|v| v.to_string()).collect(),
            queries: RefCell::default(),
            listeners: RefCell::default(),
            dispatched: RefCell::default(),
            tasks: RefCell::default(),
            root: Rc::new(HeadlessElement::default()),
        }
    }

    /// Behave like a browser without `matchMedia`.
    pub fn without_media_queries(mut self) -> Self {
        self.media_queries_enabled = false;
        self
    }

    /// Behave like a host that cannot create DOM elements.
    pub fn without_probe_elements(mut self) -> Self {
        self.probe_elements_enabled = false;
        self
    }

    /// Replace the set of `display` values the style engine accepts.
    pub fn with_display_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.display_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_class_name(self, class_name: &str) -> Self {
        self.root.set_class_name(class_name);
        self
    }

    pub fn root(&self) -> Rc<HeadlessElement> {
        Rc::clone(&self.root)
    }

    /// Custom events dispatched so far, oldest first.
    pub fn dispatched_events(&self) -> Vec<String> {
        self.dispatched.borrow().clone()
    }

    /// Change the inner size.  Media queries whose state flips notify their
    /// listeners, then `resize` fires, then `orientationchange` if the
    /// portrait/landscape state changed.
    pub fn resize(&self, width: u32, height: u32) {
        let before = self.size.replace(Viewport::new(width, height));
        let after = self.size.get();

        let queries: Vec<_> = {
            let mut queries = self.queries.borrow_mut();
            queries.retain(|q| q.strong_count() > 0);
            queries.iter().filter_map(Weak::upgrade).collect()
        };
        for query in queries {
            query.evaluate(after);
        }

        self.fire(RESIZE);
        if before.is_portrait() != after.is_portrait() {
            self.fire(ORIENTATION_CHANGE);
        }
    }

    /// Swap width and height.
    pub fn rotate(&self) {
        let Viewport { width, height } = self.size.get();
        self.resize(height, width);
    }

    /// Run deferred tasks, including any they schedule.  Returns how many ran.
    pub fn run_pending_tasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    fn fire(&self, event: &str) {
        let taken = self.listeners.borrow_mut().remove(event);
        let Some(mut taken) = taken else {
            return;
        };
        for listener in taken.iter_mut() {
            listener();
        }
        // Listeners registered while firing go after the existing ones.
        let mut listeners = self.listeners.borrow_mut();
        let slot = listeners.entry(event.to_owned()).or_default();
        taken.append(slot);
        *slot = taken;
    }
}

const RESIZE: &str = "resize";
const ORIENTATION_CHANGE: &str = "orientationchange";

impl Host for HeadlessWindow {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn inner_width(&self) -> u32 {
        self.size.get().width
    }

    fn inner_height(&self) -> u32 {
        self.size.get().height
    }

    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQuery>> {
        if !self.media_queries_enabled {
            return None;
        }
        let query = Rc::new(HeadlessMediaQuery::new(query, self.size.get()));
        let mut queries = self.queries.borrow_mut();
        queries.retain(|q| q.strong_count() > 0);
        queries.push(Rc::downgrade(&query));
        Some(query)
    }

    fn add_event_listener(&self, event: &str, listener: Listener) {
        self.listeners
            .borrow_mut()
            .entry(event.to_owned())
            .or_default()
            .push(listener);
    }

    fn dispatch_event(&self, event: &str) {
        self.dispatched.borrow_mut().push(event.to_owned());
        self.fire(event);
    }

    fn root_element(&self) -> Rc<dyn RootElement> {
        self.root.clone()
    }

    fn create_probe_element(&self) -> Option<Box<dyn ProbeElement>> {
        if !self.probe_elements_enabled {
            return None;
        }
        Some(Box::new(HeadlessProbe {
            accepted: Rc::clone(&self.display_values),
            display: String::new(),
        }))
    }

    fn defer(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

// ---------------------------------------------------------------------------
// Root element
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct HeadlessElement {
    class_name: RefCell<String>,
    style: RefCell<IndexMap<String, String>>,
}

impl HeadlessElement {
    pub fn style(&self, property: &str) -> Option<String> {
        self.style.borrow().get(property).cloned()
    }
}

impl RootElement for HeadlessElement {
    fn class_name(&self) -> String {
        self.class_name.borrow().clone()
    }

    fn set_class_name(&self, value: &str) {
        *self.class_name.borrow_mut() = value.to_owned();
    }

    fn set_style_property(&self, property: &str, value: &str) {
        self.style
            .borrow_mut()
            .insert(property.to_owned(), value.to_owned());
    }
}

// ---------------------------------------------------------------------------
// Probe element
// ---------------------------------------------------------------------------

struct HeadlessProbe {
    accepted: Rc<[String]>,
    display: String,
}

impl ProbeElement for HeadlessProbe {
    fn set_display(&mut self, value: &str) {
        if self.accepted.iter().any(|v| v == value) {
            self.display = value.to_owned();
        }
    }

    fn display(&self) -> String {
        self.display.clone()
    }
}

// ---------------------------------------------------------------------------
// Media queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaFeature {
    MinWidth(u32),
    MaxWidth(u32),
    MinHeight(u32),
    MaxHeight(u32),
    Portrait,
    Landscape,
    /// Anything the headless engine cannot evaluate.  Never matches.
    Unsupported,
}

impl MediaFeature {
    /// Parse one `(name: value)` expression.
    fn parse(expr: &str) -> Self {
        let inner = expr.trim().trim_start_matches('(').trim_end_matches(')');
        let Some((name, value)) = inner.split_once(':') else {
            return Self::Unsupported;
        };
        let value = value.trim();
        let px = || value.strip_suffix("px").and_then(|n| n.trim().parse::<u32>().ok());
        match (name.trim(), value) {
            ("orientation", "portrait") => Self::Portrait,
            ("orientation", "landscape") => Self::Landscape,
            ("min-width", _) => px().map_or(Self::Unsupported, Self::MinWidth),
            ("max-width", _) => px().map_or(Self::Unsupported, Self::MaxWidth),
            ("min-height", _) => px().map_or(Self::Unsupported, Self::MinHeight),
            ("max-height", _) => px().map_or(Self::Unsupported, Self::MaxHeight),
            _ => Self::Unsupported,
        }
    }

    fn matches(&self, size: Viewport) -> bool {
        match *self {
            Self::MinWidth(n) => size.width >= n,
            Self::MaxWidth(n) => size.width <= n,
            Self::MinHeight(n) => size.height >= n,
            Self::MaxHeight(n) => size.height <= n,
            // Square viewports count as portrait, as in CSS.
            Self::Portrait => size.height >= size.width,
            Self::Landscape => size.width > size.height,
            Self::Unsupported => false,
        }
    }
}

struct HeadlessMediaQuery {
    features: Vec<MediaFeature>,
    matches: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
}

impl HeadlessMediaQuery {
    fn new(query: &str, size: Viewport) -> Self {
        let features: Vec<MediaFeature> = query
            .split(" and ")
            .map(str::trim)
            .filter(|part| !matches!(*part, "screen" | "all" | ""))
            .map(MediaFeature::parse)
            .collect();
        let query = Self {
            features,
            matches: Cell::new(false),
            listeners: RefCell::default(),
        };
        query.matches.set(query.test(size));
        query
    }

    fn test(&self, size: Viewport) -> bool {
        self.features.iter().all(|f| f.matches(size))
    }

    fn evaluate(&self, size: Viewport) {
        let now = self.test(size);
        if self.matches.replace(now) == now {
            return;
        }
        let mut taken = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in taken.iter_mut() {
            listener();
        }
        let mut listeners = self.listeners.borrow_mut();
        taken.append(&mut listeners);
        *listeners = taken;
    }
}

impl MediaQuery for HeadlessMediaQuery {
    fn matches(&self) -> bool {
        self.matches.get()
    }

    fn add_listener(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_query_tracks_resize() {
        let window = HeadlessWindow::new("ua", 1024, 768);
        let tablet = window.match_media("screen and (min-width: 641px)").unwrap();
        let portrait = window
            .match_media("screen and (orientation: portrait)")
            .unwrap();
        assert!(tablet.matches());
        assert!(!portrait.matches());

        window.resize(320, 480);
        assert!(!tablet.matches());
        assert!(portrait.matches());
    }

    #[test]
    fn media_query_listener_fires_only_on_flip() {
        let window = HeadlessWindow::new("ua", 1024, 768);
        let portrait = window
            .match_media("screen and (orientation: portrait)")
            .unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        portrait.add_listener(Box::new(move || counter.set(counter.get() + 1)));

        window.resize(1280, 800);
        assert_eq!(hits.get(), 0);
        window.rotate();
        assert_eq!(hits.get(), 1);
        window.rotate();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn dropped_media_queries_are_pruned() {
        let window = HeadlessWindow::new("ua", 1024, 768);
        let kept = window.match_media("(orientation: portrait)").unwrap();
        let dropped = window.match_media("(orientation: landscape)").unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        dropped.add_listener(Box::new(move || counter.set(counter.get() + 1)));
        drop(dropped);

        window.rotate();
        assert_eq!(window.queries.borrow().len(), 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(Rc::strong_count(&hits), 1);
        assert!(kept.matches());
    }

    #[test]
    fn unsupported_feature_never_matches() {
        let window = HeadlessWindow::new("ua", 1024, 768);
        let q = window.match_media("(prefers-color-scheme: dark)").unwrap();
        assert!(!q.matches());
    }

    #[test]
    fn orientationchange_only_on_flip() {
        let window = HeadlessWindow::new("ua", 1024, 768);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        window.add_event_listener(
            "orientationchange",
            Box::new(move || counter.set(counter.get() + 1)),
        );
        window.resize(1000, 700);
        assert_eq!(hits.get(), 0);
        window.resize(700, 1000);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn probe_drops_unknown_display_values() {
        let window = HeadlessWindow::new("ua", 1, 1).with_display_values(["block"]);
        let mut probe = window.create_probe_element().unwrap();
        probe.set_display("block");
        probe.set_display("flex");
        assert_eq!(probe.display(), "block");
    }

    #[test]
    fn deferred_tasks_run_in_order() {
        let window = HeadlessWindow::new("ua", 1, 1);
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            window.defer(Box::new(move || log.borrow_mut().push(i)));
        }
        assert_eq!(window.run_pending_tasks(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(window.run_pending_tasks(), 0);
    }
}
