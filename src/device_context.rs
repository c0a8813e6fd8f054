use super::class_list::ClassList;
use super::config::{Config, TokenPair};
use super::error::Result;
use super::helpers::*;
use super::host::{Host, MediaQuery, RootElement};
use super::types::*;
use super::user_agent::{ParsedUserAgent, UserAgentParser};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

const PORTRAIT_MEDIA_QUERY: &str = "screen and (orientation: portrait)";

/// Fallback signal when the host has no live media queries.
const ORIENTATION_CHANGE_EVENT: &str = "orientationchange";
const RESIZE_EVENT: &str = "resize";

/// `display` values that mean the unprefixed (2012) flexbox syntax works.
const MODERN_FLEXBOX_DISPLAY_VALUES: [&str; 2] = ["-webkit-flex", "flex"];

/// Firefox before 28 accepts `display: flex` but does not wrap correctly.
const FIREFOX_MODERN_FLEXBOX_SINCE: &str = "28";

/// iOS majors without usable `overflow: scroll`.
const IOS_NO_OVERFLOW_MAJORS: [&str; 4] = ["1", "2", "3", "4"];

struct MediaQueries {
    tablet_size: Rc<dyn MediaQuery>,
    portrait: Rc<dyn MediaQuery>,
}

/// Device and viewport facts for one page load.
///
/// User agent, OS and OS version are fixed at construction.  The viewport is
/// refreshed by a listener registered on the host, so [`viewport`] always
/// reflects the latest orientation change.  Flagging methods add marker
/// classes to the host's root element; adding a class that is already present
/// does nothing.
///
/// [`viewport`]: DeviceContext::viewport
pub struct DeviceContext<H: Host + 'static> {
    host: Rc<H>,
    config: Config,
    user_agent: String,
    parsed: ParsedUserAgent,
    viewport: Rc<Cell<Viewport>>,
    media_queries: Option<MediaQueries>,
}

impl<H: Host + 'static> DeviceContext<H> {
    pub fn new(host: Rc<H>) -> Result<Self> {
        Self::with_config(host, Config::default())
    }

    pub fn with_config(host: Rc<H>, config: Config) -> Result<Self> {
        let user_agent = host.user_agent();
        let parsed = UserAgentParser::new()?.parse(&user_agent);
        let viewport = Rc::new(Cell::new(measure(&*host)));

        let media_queries = host
            .match_media(&config.tablet_media_query())
            .zip(host.match_media(PORTRAIT_MEDIA_QUERY))
            .map(|(tablet_size, portrait)| MediaQueries {
                tablet_size,
                portrait,
            });

        debug!(
            os = %parsed.os,
            os_version = %parsed.os_version,
            width = viewport.get().width,
            height = viewport.get().height,
            media_queries = media_queries.is_some(),
            "device context initialised"
        );

        let ctx = Self {
            host,
            config,
            user_agent,
            parsed,
            viewport,
            media_queries,
        };
        ctx.add_orientation_change_handler();
        ctx.apply_ios_input_focus_fix();
        Ok(ctx)
    }

    // -----------------------------------------------------------------------
    // Construction-time wiring
    // -----------------------------------------------------------------------

    fn add_orientation_change_handler(&self) {
        let host = Rc::downgrade(&self.host);
        let viewport = Rc::clone(&self.viewport);
        let event = self.config.orientation_event.clone();
        let refresh = Box::new(move || refresh_viewport(&host, &viewport, &event));

        match &self.media_queries {
            Some(mq) => mq.portrait.add_listener(refresh),
            None => self.host.add_event_listener(ORIENTATION_CHANGE_EVENT, refresh),
        }
    }

    fn apply_ios_input_focus_fix(&self) {
        if self.parsed.os != OperatingSystem::Ios || !self.config.ios_input_focus_fix {
            return;
        }
        let host = Rc::downgrade(&self.host);
        self.host.add_event_listener(
            RESIZE_EVENT,
            Box::new(move || {
                let Some(strong) = host.upgrade() else {
                    return;
                };
                let host = host.clone();
                strong.defer(Box::new(move || {
                    if let Some(host) = host.upgrade() {
                        let min_width = format!("{}px", host.inner_width());
                        host.root_element().set_style_property("min-width", &min_width);
                    }
                }));
            }),
        );
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn os(&self) -> OperatingSystem {
        self.parsed.os
    }

    /// `"7.1"`, `"4.4"`, or `"unknown"`.
    pub fn os_version(&self) -> &str {
        &self.parsed.os_version
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root_element(&self) -> Rc<dyn RootElement> {
        self.host.root_element()
    }

    /// Cached dimensions from construction or the last orientation change.
    /// This does not re-measure the window.
    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn version_starts_with(&self, prefix: &str) -> bool {
        version_starts_with(self.os_version(), prefix)
    }

    pub fn is_ipad_on_ios7(&self) -> bool {
        self.parsed.is_ipad && self.version_starts_with("7")
    }

    pub fn is_in_portrait_mode(&self) -> bool {
        match &self.media_queries {
            Some(mq) => mq.portrait.matches(),
            None => self.viewport().is_portrait(),
        }
    }

    pub fn is_in_landscape_mode(&self) -> bool {
        !self.is_in_portrait_mode()
    }

    /// Without media queries this reads the live window width, not the cache.
    pub fn is_tablet_size(&self) -> bool {
        match &self.media_queries {
            Some(mq) => mq.tablet_size.matches(),
            None => self.host.inner_width() >= self.config.tablet_min_width,
        }
    }

    /// Android's pre-Chrome WebKit browser.
    pub fn is_stock_android_browser(&self) -> bool {
        self.os() == OperatingSystem::Android && !self.parsed.mentions_chrome
    }

    pub fn is_android_2x(&self) -> bool {
        self.os() == OperatingSystem::Android && self.version_starts_with("2")
    }

    /// Whether `overflow: scroll` works.  Android 2.x and iOS 1 to 4 are
    /// blacklisted; everything else is assumed to support it.
    pub fn has_overflow_support(&self) -> bool {
        match self.os() {
            OperatingSystem::Android => !self.version_starts_with("2"),
            OperatingSystem::Ios => !IOS_NO_OVERFLOW_MAJORS
                .iter()
                .any(|major| self.version_starts_with(major)),
            OperatingSystem::Unknown => true,
        }
    }

    pub fn has_modern_flexbox_support(&self) -> bool {
        if let Some(version) = &self.parsed.firefox_version {
            if version_lt(version, FIREFOX_MODERN_FLEXBOX_SINCE) {
                return false;
            }
        }

        let Some(mut probe) = self.host.create_probe_element() else {
            return false;
        };
        for value in MODERN_FLEXBOX_DISPLAY_VALUES {
            probe.set_display(value);
        }
        let display = probe.display();
        MODERN_FLEXBOX_DISPLAY_VALUES.contains(&display.as_str())
    }

    // -----------------------------------------------------------------------
    // Flagging
    // -----------------------------------------------------------------------

    fn add_class(&self, token: &str) {
        let root = self.host.root_element();
        let mut classes = ClassList::parse(&root.class_name());
        if classes.add(token) {
            root.set_class_name(&classes.to_string());
            trace!(token, "flagged root element");
        }
    }

    fn flag(&self, supported: bool, tokens: &TokenPair) {
        self.add_class(tokens.pick(supported));
    }

    pub fn flag_overflow_support(&self) {
        self.flag(self.has_overflow_support(), &self.config.vocabulary.overflow);
    }

    pub fn flag_modern_flexbox_support(&self) {
        self.flag(
            self.has_modern_flexbox_support(),
            &self.config.vocabulary.modern_flexbox,
        );
    }

    /// Marks iPads on iOS 7, whose landscape `innerHeight` is off by 20px.
    pub fn flag_ipad_on_ios7(&self) {
        if self.is_ipad_on_ios7() {
            self.add_class(&self.config.vocabulary.ipad_ios_7);
        }
    }

    pub fn flag_android_2x(&self) {
        if let Some(token) = &self.config.vocabulary.android_2x {
            if self.is_android_2x() {
                self.add_class(token);
            }
        }
    }

    /// Adds `<name_prefix><os>` and `<version_prefix><major>`, e.g.
    /// `os-ios osv-7`.  For an unknown version the major is `u`.
    pub fn flag_os(&self) {
        let Some(os_tokens) = &self.config.vocabulary.os else {
            return;
        };
        self.add_class(&format!("{}{}", os_tokens.name_prefix, self.os().slug()));
        self.add_class(&format!(
            "{}{}",
            os_tokens.version_prefix,
            major_version_char(self.os_version())
        ));
    }

    pub fn set_viewport_height_to_device_height(&self) {
        let height = format!("{}px", self.viewport().height);
        self.host.root_element().set_style_property("height", &height);
    }
}

fn measure<H: Host + ?Sized>(host: &H) -> Viewport {
    Viewport::new(host.inner_width(), host.inner_height())
}

fn refresh_viewport<H: Host>(host: &Weak<H>, viewport: &Cell<Viewport>, event: &str) {
    let Some(host) = host.upgrade() else {
        return;
    };
    let measured = measure(&*host);
    viewport.set(measured);
    trace!(width = measured.width, height = measured.height, "viewport refreshed");
    host.dispatch_event(event);
}
