mod class_list;
mod config;
mod device_context;
mod error;
mod headless;
mod helpers;
mod host;
mod types;
mod user_agent;
#[cfg(feature = "web")]
mod web;

pub use class_list::ClassList;
pub use config::{
    Config, MarkerVocabulary, OsTokens, TokenPair, DEFAULT_ORIENTATION_EVENT,
    DEFAULT_TABLET_MIN_WIDTH,
};
pub use device_context::DeviceContext;
pub use error::{Error, Result};
pub use headless::{HeadlessElement, HeadlessWindow};
pub use host::{Host, Listener, MediaQuery, ProbeElement, RootElement, Task};
pub use types::*;
pub use user_agent::{ParsedUserAgent, UserAgentParser};
#[cfg(feature = "web")]
pub use web::BrowserWindow;
