//! [`Host`] over the real browser window, via `web-sys`.
//!
//! Listeners handed to the browser are leaked with `Closure::forget`: they
//! stay registered for the lifetime of the page.  JS exceptions from the
//! window are logged and otherwise ignored.

use std::rc::Rc;

use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, Document, Element, HtmlElement, MediaQueryList, Window};

use super::host::*;

#[derive(Clone)]
pub struct BrowserWindow {
    window: Window,
    document: Document,
}

impl BrowserWindow {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    /// Wrap the global `window`.  `None` when there is no DOM (web workers,
    /// Node.js).
    pub fn from_global() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self::new(window, document))
    }
}

fn log_js_error(what: &str, err: JsValue) {
    warn!(error = ?err, "{what} failed");
}

fn dimension(value: Result<JsValue, JsValue>, what: &str) -> u32 {
    match value {
        Ok(v) => v.as_f64().map_or(0, |px| px as u32),
        Err(err) => {
            log_js_error(what, err);
            0
        }
    }
}

impl Host for BrowserWindow {
    fn user_agent(&self) -> String {
        self.window
            .navigator()
            .user_agent()
            .unwrap_or_else(|err| {
                log_js_error("navigator.userAgent", err);
                String::new()
            })
    }

    fn inner_width(&self) -> u32 {
        dimension(self.window.inner_width(), "window.innerWidth")
    }

    fn inner_height(&self) -> u32 {
        dimension(self.window.inner_height(), "window.innerHeight")
    }

    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQuery>> {
        match self.window.match_media(query) {
            Ok(Some(list)) => Some(Rc::new(BrowserMediaQuery(list))),
            Ok(None) => None,
            Err(err) => {
                log_js_error("window.matchMedia", err);
                None
            }
        }
    }

    fn add_event_listener(&self, event: &str, listener: Listener) {
        let closure = Closure::<dyn FnMut()>::wrap(listener);
        if let Err(err) = self
            .window
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        {
            log_js_error("window.addEventListener", err);
        }
        closure.forget();
    }

    fn dispatch_event(&self, event: &str) {
        let result = CustomEvent::new(event).and_then(|ev| self.window.dispatch_event(&ev));
        if let Err(err) = result {
            log_js_error("window.dispatchEvent", err);
        }
    }

    fn root_element(&self) -> Rc<dyn RootElement> {
        Rc::new(BrowserRoot(self.document.document_element()))
    }

    fn create_probe_element(&self) -> Option<Box<dyn ProbeElement>> {
        match self.document.create_element("span") {
            Ok(el) => el
                .dyn_into::<HtmlElement>()
                .ok()
                .map(|el| Box::new(BrowserProbe(el)) as Box<dyn ProbeElement>),
            Err(err) => {
                log_js_error("document.createElement", err);
                None
            }
        }
    }

    fn defer(&self, task: Task) {
        let callback = Closure::once_into_js(move || task());
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0)
        {
            log_js_error("window.setTimeout", err);
        }
    }
}

struct BrowserMediaQuery(MediaQueryList);

impl MediaQuery for BrowserMediaQuery {
    fn matches(&self) -> bool {
        self.0.matches()
    }

    /// `MediaQueryList` only became an `EventTarget` in Safari 14; older
    /// WebKit needs the legacy `addListener`.
    fn add_listener(&self, listener: Listener) {
        let closure = Closure::<dyn FnMut()>::wrap(listener);
        let callback = closure.as_ref().unchecked_ref();
        let result = first_ok(
            || self.0.add_event_listener_with_callback("change", callback),
            || self.0.add_listener_with_opt_callback(Some(callback)),
        );
        if let Err(err) = result {
            log_js_error("MediaQueryList.addListener", err);
        }
        closure.forget();
    }
}

/// Run `primary`; if it fails, run `fallback` and report its outcome.
fn first_ok<T, E>(
    primary: impl FnOnce() -> Result<T, E>,
    fallback: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    primary().or_else(|_| fallback())
}

/// `<html>`; a document without one silently ignores writes.
struct BrowserRoot(Option<Element>);

impl RootElement for BrowserRoot {
    fn class_name(&self) -> String {
        self.0.as_ref().map(Element::class_name).unwrap_or_default()
    }

    fn set_class_name(&self, value: &str) {
        if let Some(el) = &self.0 {
            el.set_class_name(value);
        }
    }

    fn set_style_property(&self, property: &str, value: &str) {
        let Some(el) = self.0.as_ref().and_then(|el| el.dyn_ref::<HtmlElement>()) else {
            return;
        };
        if let Err(err) = el.style().set_property(property, value) {
            log_js_error("style.setProperty", err);
        }
    }
}

struct BrowserProbe(HtmlElement);

impl ProbeElement for BrowserProbe {
    fn set_display(&mut self, value: &str) {
        if let Err(err) = self.0.style().set_property("display", value) {
            log_js_error("style.setProperty", err);
        }
    }

    fn display(&self) -> String {
        self.0
            .style()
            .get_property_value("display")
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fallback_skipped_when_primary_succeeds() {
        let fallback_ran = Cell::new(false);
        let result: Result<(), &str> = first_ok(
            || Ok(()),
            || {
                fallback_ran.set(true);
                Ok(())
            },
        );
        assert!(result.is_ok());
        assert!(!fallback_ran.get());
    }

    #[test]
    fn legacy_registration_used_when_event_target_throws() {
        let registered = Cell::new(0);
        let result: Result<(), &str> = first_ok(
            || Err("TypeError: addEventListener is not a function"),
            || {
                registered.set(registered.get() + 1);
                Ok(())
            },
        );
        assert!(result.is_ok());
        assert_eq!(registered.get(), 1);
    }

    #[test]
    fn fallback_error_is_reported() {
        let result: Result<(), &str> = first_ok(|| Err("modern"), || Err("legacy"));
        assert_eq!(result, Err("legacy"));
    }
}
