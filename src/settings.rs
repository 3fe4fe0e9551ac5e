use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use tracing::warn;

use crate::parser::content::DEFAULT_MAX_DEPTH;

const ENV_PREFIX: &str = "SCAD_DOCS";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const CHEATSHEET_URL: &str = "https://openscad.org/cheatsheet/";
const MANUAL_URL: &str = "https://en.wikibooks.org/wiki/OpenSCAD_User_Manual";
const WIKI_BASE: &str = "https://en.wikibooks.org";

/// Runtime tunables, overridable through `SCAD_DOCS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub max_depth: usize,
    pub user_agent: String,
    pub cheatsheet_url: String,
    pub manual_url: String,
    pub wiki_base: String,
}

impl Settings {
    /// Load settings from the environment, falling back to the built-in
    /// defaults when a variable does not parse.
    pub fn load() -> Self {
        match Self::from_env(ENV_PREFIX) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed {}_* settings: {}", ENV_PREFIX, e);
                Self::default()
            }
        }
    }

    fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("delay_ms", 1000_i64)?
            .set_default("timeout_secs", 30_i64)?
            .set_default("max_depth", DEFAULT_MAX_DEPTH as i64)?
            .set_default("user_agent", USER_AGENT)?
            .set_default("cheatsheet_url", CHEATSHEET_URL)?
            .set_default("manual_url", MANUAL_URL)?
            .set_default("wiki_base", WIKI_BASE)?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            delay_ms: 1000,
            timeout_secs: 30,
            max_depth: DEFAULT_MAX_DEPTH,
            user_agent: USER_AGENT.to_string(),
            cheatsheet_url: CHEATSHEET_URL.to_string(),
            manual_url: MANUAL_URL.to_string(),
            wiki_base: WIKI_BASE.to_string(),
        }
    }
}

/// Site-specific vocabulary used by the extractors and the crawler.
///
/// The defaults describe the OpenSCAD cheat sheet and the Wikibooks user
/// manual. Other MediaWiki-hosted manuals only need a different profile.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// A `<pre>` block counts as a code sample only if it mentions one of these.
    pub code_keywords: Vec<String>,
    /// Relative hrefs must start with this to be followed.
    pub link_prefix: String,
    /// Hrefs containing any of these are never followed.
    pub link_exclusions: Vec<String>,
    /// Sections with exactly these titles are dropped.
    pub skip_titles: Vec<String>,
    pub content_container_id: String,
    pub title_heading_id: String,
    pub edit_section_class: String,
    pub heading_wrapper_class: String,
    pub cheatsheet_title: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        SiteProfile {
            code_keywords: to_strings(&[
                "cube",
                "sphere",
                "cylinder",
                "translate",
                "rotate",
                "union",
                "difference",
                "intersection",
                "module",
                "function",
            ]),
            link_prefix: "/wiki/OpenSCAD".to_string(),
            link_exclusions: to_strings(&[
                "/w/",
                "action=edit",
                "printable=yes",
                "oldid=",
                "Category:",
                "Special:",
                "Talk:",
            ]),
            skip_titles: to_strings(&["References", "External links", "See also", "Navigation menu"]),
            content_container_id: "mw-content-text".to_string(),
            title_heading_id: "firstHeading".to_string(),
            edit_section_class: "mw-editsection".to_string(),
            heading_wrapper_class: "mw-heading".to_string(),
            cheatsheet_title: "OpenSCAD Cheat Sheet".to_string(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
