use std::path::Path;

use serde::Deserialize;

use super::error::{Error, Result};

/// Default tablet-size breakpoint in CSS pixels.
pub const DEFAULT_TABLET_MIN_WIDTH: u32 = 641;

/// Custom event dispatched on the host after every viewport refresh.
pub const DEFAULT_ORIENTATION_EVENT: &str = "deviceService.orientationchange";

// ---------------------------------------------------------------------------
// Marker vocabulary
// ---------------------------------------------------------------------------

/// Class tokens for a feature that is flagged either way.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub supported: String,
    pub unsupported: String,
}

impl TokenPair {
    fn new(supported: &str, unsupported: &str) -> Self {
        Self {
            supported: supported.to_owned(),
            unsupported: unsupported.to_owned(),
        }
    }

    pub fn pick(&self, supported: bool) -> &str {
        if supported {
            &self.supported
        } else {
            &self.unsupported
        }
    }
}

/// Prefixes for the `<name_prefix><os> <version_prefix><major>` token pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OsTokens {
    pub name_prefix: String,
    pub version_prefix: String,
}

/// The class names written to the document root by the `flag_*` methods.
///
/// `android_2x` and `os` are optional; when `None` the matching flag method
/// leaves the root element untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerVocabulary {
    pub modern_flexbox: TokenPair,
    pub overflow: TokenPair,
    pub ipad_ios_7: String,
    pub android_2x: Option<String>,
    pub os: Option<OsTokens>,
}

impl MarkerVocabulary {
    /// Unprefixed tokens: `modern-flexbox`, `no-overflow-support`, `os-ios osv-7`.
    pub fn standard() -> Self {
        Self {
            modern_flexbox: TokenPair::new("modern-flexbox", "no-modern-flexbox"),
            overflow: TokenPair::new("overflow-support", "no-overflow-support"),
            ipad_ios_7: "ipad-ios-7".to_owned(),
            android_2x: Some("android-2".to_owned()),
            os: Some(OsTokens {
                name_prefix: "os-".to_owned(),
                version_prefix: "osv-".to_owned(),
            }),
        }
    }

    /// `cc-` prefixed tokens.  This vocabulary never had an Android 2.x marker.
    pub fn legacy() -> Self {
        Self {
            modern_flexbox: TokenPair::new("cc-modern-flexbox", "cc-no-modern-flexbox"),
            overflow: TokenPair::new("cc-has-overflow-support", "cc-has-no-overflow-support"),
            ipad_ios_7: "cc-ipad-ios-7".to_owned(),
            android_2x: None,
            os: Some(OsTokens {
                name_prefix: "cc-os-".to_owned(),
                version_prefix: "cc-osv-".to_owned(),
            }),
        }
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "standard" => Ok(Self::standard()),
            "legacy" => Ok(Self::legacy()),
            other => Err(Error::UnknownPreset(other.to_owned())),
        }
    }
}

impl Default for MarkerVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub vocabulary: MarkerVocabulary,
    /// Viewports at least this wide count as tablet-sized.
    pub tablet_min_width: u32,
    pub orientation_event: String,
    /// On iOS, pin the root element's `min-width` to the window width after
    /// every resize.  Works around layout breaking when the device is rotated
    /// while the on-screen keyboard is open.
    pub ios_input_focus_fix: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vocabulary: MarkerVocabulary::standard(),
            tablet_min_width: DEFAULT_TABLET_MIN_WIDTH,
            orientation_event: DEFAULT_ORIENTATION_EVENT.to_owned(),
            ios_input_focus_fix: true,
        }
    }
}

impl Config {
    pub fn with_vocabulary(vocabulary: MarkerVocabulary) -> Self {
        Self {
            vocabulary,
            ..Self::default()
        }
    }

    /// Parse a YAML config document.  Every key is optional.
    ///
    /// ```yaml
    /// vocabulary:
    ///   preset: legacy
    ///   ipad_ios_7: my-ipad-fix
    ///   android_2x: ""        # empty string or null disables the marker
    ///   os: null              # no os-/osv- tokens
    /// tablet_min_width: 768
    /// ```
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let entry: ConfigEntry = serde_yaml::from_str(s)?;
        entry.resolve()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// The media query tracking the tablet-size breakpoint.
    pub(crate) fn tablet_media_query(&self) -> String {
        format!("screen and (min-width: {}px)", self.tablet_min_width)
    }
}

// ---------------------------------------------------------------------------
// Raw YAML shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigEntry {
    vocabulary: VocabularyEntry,
    tablet_min_width: u32,
    orientation_event: String,
    ios_input_focus_fix: bool,
}

impl Default for ConfigEntry {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            vocabulary: VocabularyEntry::default(),
            tablet_min_width: defaults.tablet_min_width,
            orientation_event: defaults.orientation_event,
            ios_input_focus_fix: defaults.ios_input_focus_fix,
        }
    }
}

impl ConfigEntry {
    fn resolve(self) -> Result<Config> {
        Ok(Config {
            vocabulary: self.vocabulary.resolve()?,
            tablet_min_width: self.tablet_min_width,
            orientation_event: self.orientation_event,
            ios_input_focus_fix: self.ios_input_focus_fix,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct VocabularyEntry {
    preset: Option<String>,
    modern_flexbox: Option<TokenPair>,
    overflow: Option<TokenPair>,
    ipad_ios_7: Option<String>,
    #[serde(deserialize_with = "explicit_null")]
    android_2x: Option<Option<String>>,
    #[serde(deserialize_with = "explicit_null")]
    os: Option<Option<OsTokens>>,
}

/// Keeps an explicit `null` apart from a missing key: a missing key leaves
/// the preset alone (`None`), `null` disables the marker (`Some(None)`).
fn explicit_null<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl VocabularyEntry {
    fn resolve(self) -> Result<MarkerVocabulary> {
        let mut vocab = match self.preset.as_deref() {
            Some(name) => MarkerVocabulary::preset(name)?,
            None => MarkerVocabulary::standard(),
        };
        if let Some(pair) = self.modern_flexbox {
            vocab.modern_flexbox = pair;
        }
        if let Some(pair) = self.overflow {
            vocab.overflow = pair;
        }
        if let Some(token) = self.ipad_ios_7 {
            vocab.ipad_ios_7 = token;
        }
        if let Some(token) = self.android_2x {
            vocab.android_2x = token.filter(|t| !t.is_empty());
        }
        if let Some(os) = self.os {
            vocab.os =
                os.filter(|os| !(os.name_prefix.is_empty() && os.version_prefix.is_empty()));
        }
        Ok(vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn preset_with_overrides() {
        let config = Config::from_yaml_str(
            "vocabulary:\n  preset: legacy\n  android_2x: cc-android-2\ntablet_min_width: 768\n",
        )
        .unwrap();
        assert_eq!(config.vocabulary.overflow.supported, "cc-has-overflow-support");
        assert_eq!(config.vocabulary.android_2x.as_deref(), Some("cc-android-2"));
        assert_eq!(config.tablet_min_width, 768);
        assert_eq!(config.tablet_media_query(), "screen and (min-width: 768px)");
    }

    #[test]
    fn empty_token_disables_marker() {
        let config = Config::from_yaml_str("vocabulary:\n  android_2x: \"\"\n").unwrap();
        assert_eq!(config.vocabulary.android_2x, None);
    }

    #[test]
    fn null_disables_os_tokens() {
        let config = Config::from_yaml_str("vocabulary:\n  os: null\n  android_2x: ~\n").unwrap();
        assert_eq!(config.vocabulary.os, None);
        assert_eq!(config.vocabulary.android_2x, None);
        assert_eq!(config.vocabulary.overflow.supported, "overflow-support");
    }

    #[test]
    fn empty_os_prefixes_disable_os_tokens() {
        let config = Config::from_yaml_str(
            "vocabulary:\n  os:\n    name_prefix: \"\"\n    version_prefix: \"\"\n",
        )
        .unwrap();
        assert_eq!(config.vocabulary.os, None);
    }

    #[test]
    fn missing_os_keeps_preset() {
        let config = Config::from_yaml_str("vocabulary:\n  preset: legacy\n").unwrap();
        assert_eq!(
            config.vocabulary.os.map(|os| os.name_prefix),
            Some("cc-os-".to_owned())
        );
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let err = Config::from_yaml_str("vocabulary:\n  preset: fancy\n").unwrap_err();
        assert!(matches!(err, Error::UnknownPreset(name) if name == "fancy"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            Config::from_yaml_str("tablet_width: 10\n"),
            Err(Error::YAML(_))
        ));
    }
}
