//! The window-like collaborator a [`DeviceContext`](crate::DeviceContext) is
//! built from.  Everything here is single-threaded: listeners are plain
//! `FnMut` closures invoked on the host's event loop.

use std::rc::Rc;

/// Callback registered with the host.  Lives until the host drops it.
pub type Listener = Box<dyn FnMut()>;

/// Work scheduled for the next turn of the host's event loop.
pub type Task = Box<dyn FnOnce()>;

/// Window-level capabilities: UA string, inner size, media queries, events.
pub trait Host {
    fn user_agent(&self) -> String;

    fn inner_width(&self) -> u32;

    fn inner_height(&self) -> u32;

    /// Live media query handle, or `None` if the host has no `matchMedia`.
    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQuery>>;

    fn add_event_listener(&self, event: &str, listener: Listener);

    /// Dispatch a custom event on the window.
    fn dispatch_event(&self, event: &str);

    /// The document's root (`<html>`) element.
    fn root_element(&self) -> Rc<dyn RootElement>;

    /// A detached element used to probe which `display` values the style
    /// engine accepts.  `None` when the host cannot create elements.
    fn create_probe_element(&self) -> Option<Box<dyn ProbeElement>>;

    /// Run `task` on the next event-loop turn.
    fn defer(&self, task: Task);
}

pub trait MediaQuery {
    fn matches(&self) -> bool;

    /// Called whenever the match state flips.
    fn add_listener(&self, listener: Listener);
}

pub trait RootElement {
    fn class_name(&self) -> String;

    fn set_class_name(&self, value: &str);

    /// Set an inline style property, e.g. `("height", "768px")`.
    fn set_style_property(&self, property: &str, value: &str);
}

pub trait ProbeElement {
    /// Assign `style.display`.  Values the engine does not understand are
    /// silently dropped, leaving the previous value in place.
    fn set_display(&mut self, value: &str);

    fn display(&self) -> String;
}
