use super::error::Result;
use super::helpers::take_chars;
use super::types::OperatingSystem;
use aho_corasick::AhoCorasick;
use fancy_regex::Regex;

/// Keywords searched case-insensitively in one pass over the UA.
/// Order matters: the index of each keyword is its pattern ID.
const KEYWORDS: [&str; 4] = ["ipad", "iphone", "android", "firefox"];

const IPAD: usize = 0;
const IPHONE: usize = 1;
const ANDROID: usize = 2;
const FIREFOX: usize = 3;

/// Version token markers.  These are case-sensitive, unlike the OS keywords.
const IOS_VERSION_MARKER: &str = "OS ";
const ANDROID_VERSION_MARKER: &str = "Android ";

/// Number of characters taken after a version marker (`7_1`, `4.4`).
const VERSION_LEN: usize = 3;

const UNKNOWN_VERSION: &str = "unknown";

/// Everything derived from a User-Agent string at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub os: OperatingSystem,
    /// `"7.1"`, `"4.4"`, or `"unknown"`.
    pub os_version: String,
    pub is_ipad: bool,
    /// `Some` whenever the UA mentions Firefox.  The inner value is the
    /// `Firefox/NN` version token, or `"0"` when the token is missing.
    pub firefox_version: Option<String>,
    /// The UA contains `Chrome` (case-sensitive).
    pub mentions_chrome: bool,
}

pub struct UserAgentParser {
    keywords: AhoCorasick,
    firefox_version: Regex,
}

impl UserAgentParser {
    pub fn new() -> Result<Self> {
        let keywords = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(KEYWORDS)?;
        let firefox_version = Regex::new(r"Firefox/(\d+(?:\.\d+)?)")?;
        Ok(Self {
            keywords,
            firefox_version,
        })
    }

    pub fn parse(&self, ua: &str) -> ParsedUserAgent {
        let mut found = [false; KEYWORDS.len()];
        for m in self.keywords.find_overlapping_iter(ua) {
            found[m.pattern().as_usize()] = true;
        }
        let has = |id: usize| found[id];

        let os = if has(IPAD) || has(IPHONE) {
            OperatingSystem::Ios
        } else if has(ANDROID) {
            OperatingSystem::Android
        } else {
            OperatingSystem::Unknown
        };

        let firefox_version = has(FIREFOX).then(|| {
            self.firefox_version
                .captures(ua)
                .ok()
                .flatten()
                .and_then(|caps| caps.get(1).map(|m| m.as_str().to_owned()))
                .unwrap_or_else(|| "0".to_owned())
        });

        ParsedUserAgent {
            os,
            os_version: os_version(ua, os),
            is_ipad: has(IPAD),
            firefox_version,
            mentions_chrome: ua.contains("Chrome"),
        }
    }
}

/// Extract the short OS version following the platform marker.  iOS uses
/// underscores (`OS 7_1`), so the first one is turned into a dot.
fn os_version(ua: &str, os: OperatingSystem) -> String {
    let (marker, replace_underscore) = match os {
        OperatingSystem::Ios => (IOS_VERSION_MARKER, true),
        OperatingSystem::Android => (ANDROID_VERSION_MARKER, false),
        OperatingSystem::Unknown => return UNKNOWN_VERSION.to_owned(),
    };

    match ua.find(marker) {
        Some(idx) => {
            let raw = take_chars(ua, idx + marker.len(), VERSION_LEN);
            if replace_underscore {
                raw.replacen('_', ".", 1)
            } else {
                raw.to_owned()
            }
        }
        None => UNKNOWN_VERSION.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(ua: &str) -> ParsedUserAgent {
        UserAgentParser::new().unwrap().parse(ua)
    }

    #[test]
    fn ipad_ios7() {
        let p = parse("Mozilla/5.0 (iPad; CPU OS 7_1 like Mac OS X) AppleWebKit/537.51.2");
        assert_eq!(p.os, OperatingSystem::Ios);
        assert_eq!(p.os_version, "7.1");
        assert!(p.is_ipad);
    }

    #[test]
    fn iphone_uses_first_os_marker() {
        let p = parse("Mozilla/5.0 (iPhone; CPU iPhone OS 6_1_3 like Mac OS X)");
        assert_eq!(p.os, OperatingSystem::Ios);
        assert_eq!(p.os_version, "6.1");
        assert!(!p.is_ipad);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let p = parse("some-IPAD-client");
        assert_eq!(p.os, OperatingSystem::Ios);
        assert_eq!(p.os_version, "unknown");
    }

    #[test]
    fn android_version() {
        let p = parse("Mozilla/5.0 (Linux; Android 4.4.2; Nexus 5 Build/KOT49H) Chrome/32.0");
        assert_eq!(p.os, OperatingSystem::Android);
        assert_eq!(p.os_version, "4.4");
        assert!(p.mentions_chrome);
    }

    #[test]
    fn lowercase_android_has_no_version() {
        let p = parse("android-webview");
        assert_eq!(p.os, OperatingSystem::Android);
        assert_eq!(p.os_version, "unknown");
    }

    #[test]
    fn desktop_is_unknown() {
        let p = parse("Mozilla/5.0 (X11; Linux x86_64; rv:27.0) Gecko/20100101 Firefox/27.0");
        assert_eq!(p.os, OperatingSystem::Unknown);
        assert_eq!(p.os_version, "unknown");
        assert_eq!(p.firefox_version.as_deref(), Some("27.0"));
    }

    #[test]
    fn firefox_without_version_token() {
        let p = parse("firefox-ish crawler");
        assert_eq!(p.firefox_version.as_deref(), Some("0"));
    }

    #[test]
    fn ipad_takes_precedence_over_android() {
        let p = parse("iPad Android 4.0");
        assert_eq!(p.os, OperatingSystem::Ios);
    }
}
