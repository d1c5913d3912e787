//! Configuration management for Autopost
//!
//! Settings come from a TOML (or legacy JSON) file and are then overridden by
//! `AUTOPOST_*` environment variables.

use crate::session::{LoadState, NavigationOptions};
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Run configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CDP endpoint of a Chrome started with remote debugging
    pub cdp_endpoint: String,

    /// Platform origin, e.g. `https://www.facebook.com`
    pub platform_url: String,

    /// Group identifiers, posted to in this order
    pub groups: Vec<String>,

    /// Folder scanned for `.jpg`/`.mp4` attachments
    #[serde(alias = "mediaFolder")]
    pub media_folder: Option<PathBuf>,

    /// Browser-exported cookie JSON
    #[serde(alias = "cookiesPath")]
    pub cookies_path: PathBuf,

    /// Markdown post body
    #[serde(alias = "contentPath")]
    pub content_path: PathBuf,

    /// Where screenshots are written
    #[serde(alias = "evidenceDir")]
    pub evidence_dir: PathBuf,

    /// Log level used when RUST_LOG is unset
    pub log_level: String,

    /// Retry policy
    pub retry: RetryConfig,

    /// Waits and timeouts
    pub timings: Timings,

    /// Platform UI wording the matchers key on
    pub ui: UiText,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdp_endpoint: "ws://localhost:9222".to_string(),
            platform_url: "https://www.facebook.com".to_string(),
            groups: Vec::new(),
            media_folder: None,
            cookies_path: PathBuf::from("config/authen.json"),
            content_path: PathBuf::from("config/prompt.md"),
            evidence_dir: PathBuf::from("log"),
            log_level: "info".to_string(),
            retry: RetryConfig::default(),
            timings: Timings::default(),
            ui: UiText::default(),
        }
    }
}

/// Retry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per group, including the first
    pub max_retries: usize,

    /// Backoff before attempt `i + 1` is `retry_delays_ms[i - 1]`
    pub retry_delays_ms: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delays_ms: vec![3000, 5000, 7000],
        }
    }
}

/// Every wait the posting pipeline performs, in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub navigation_timeout_ms: u64,
    pub load_state_timeout_ms: u64,
    pub post_navigation_settle_ms: u64,
    pub composer_open_settle_ms: u64,
    pub composer_ready_settle_ms: u64,
    pub editor_attach_timeout_ms: u64,
    pub paragraph_click_timeout_ms: u64,
    pub focus_settle_ms: u64,
    pub keystroke_delay_ms: u64,
    pub typing_settle_ms: u64,
    pub upload_settle_ms: u64,
    pub pre_click_settle_ms: u64,
    pub publish_settle_ms: u64,
    pub group_settle_ms: u64,
    pub shutdown_settle_ms: u64,
}

impl Timings {
    /// Navigation ceilings for landing and group pages
    pub fn navigation(&self) -> NavigationOptions {
        NavigationOptions {
            timeout: Duration::from_millis(self.navigation_timeout_ms),
            wait_until: LoadState::DOMContentLoaded,
            load_timeout: Duration::from_millis(self.load_state_timeout_ms),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 30_000,
            load_state_timeout_ms: 15_000,
            post_navigation_settle_ms: 2_000,
            composer_open_settle_ms: 2_000,
            composer_ready_settle_ms: 3_000,
            editor_attach_timeout_ms: 2_000,
            paragraph_click_timeout_ms: 5_000,
            focus_settle_ms: 500,
            keystroke_delay_ms: 30,
            typing_settle_ms: 1_000,
            upload_settle_ms: 8_000,
            pre_click_settle_ms: 2_000,
            publish_settle_ms: 8_000,
            group_settle_ms: 3_000,
            shutdown_settle_ms: 5_000,
        }
    }
}

/// Platform wording
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiText {
    /// Visible text of the button that opens the composer (case-insensitive)
    pub composer_trigger: String,

    /// Dialog labels containing this are messaging overlays, never composers
    pub messaging_marker: String,

    /// Hint found in the editor's aria-label / aria-placeholder
    pub write_hint: String,

    /// Label of the submit control
    pub submit_label: String,
}

impl Default for UiText {
    fn default() -> Self {
        Self {
            composer_trigger: "Write something".to_string(),
            messaging_marker: "Messenger".to_string(),
            write_hint: "Write".to_string(),
            submit_label: "Post".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// `.json` files are read with serde_json (legacy layout with `groups`
    /// and `mediaFolder`), anything else as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: Config = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?
        } else {
            toml::from_str(&content)
                .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?
        };

        Ok(config)
    }

    /// Override fields from `AUTOPOST_*` environment variables
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("AUTOPOST_CDP_ENDPOINT") {
            self.cdp_endpoint = endpoint;
        }

        if let Some(url) = lookup("AUTOPOST_PLATFORM_URL") {
            self.platform_url = url;
        }

        if let Some(groups) = lookup("AUTOPOST_GROUPS") {
            self.groups = groups
                .split(',')
                .map(|group| group.trim().to_string())
                .filter(|group| !group.is_empty())
                .collect();
        }

        if let Some(folder) = lookup("AUTOPOST_MEDIA_FOLDER") {
            self.media_folder = Some(PathBuf::from(folder));
        }

        if let Some(path) = lookup("AUTOPOST_COOKIES") {
            self.cookies_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("AUTOPOST_CONTENT") {
            self.content_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("AUTOPOST_EVIDENCE_DIR") {
            self.evidence_dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup("AUTOPOST_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(max_retries) = lookup("AUTOPOST_MAX_RETRIES") {
            self.retry.max_retries = max_retries
                .parse()
                .map_err(|_| Error::configuration("Invalid AUTOPOST_MAX_RETRIES"))?;
        }

        if let Some(delays) = lookup("AUTOPOST_RETRY_DELAYS_MS") {
            self.retry.retry_delays_ms = delays
                .split(',')
                .map(|d| d.trim().parse::<u64>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| Error::configuration("Invalid AUTOPOST_RETRY_DELAYS_MS"))?;
        }

        Ok(self)
    }

    /// Reject settings the orchestrator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_retries == 0 {
            return Err(Error::configuration("retry.max_retries must be at least 1"));
        }

        if self.retry.retry_delays_ms.len() + 1 < self.retry.max_retries {
            return Err(Error::configuration(format!(
                "retry.retry_delays_ms needs at least {} entries for {} attempts",
                self.retry.max_retries - 1,
                self.retry.max_retries
            )));
        }

        if self.groups.is_empty() {
            return Err(Error::configuration("no groups configured"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_retry_policy() {
        let config = Config::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.retry_delays_ms, vec![3000, 5000, 7000]);
        assert_eq!(config.timings.navigation_timeout_ms, 30_000);
        assert_eq!(config.timings.load_state_timeout_ms, 15_000);
        assert_eq!(config.timings.keystroke_delay_ms, 30);
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            groups = ["111", "222"]
            media_folder = "/srv/media"

            [retry]
            max_retries = 2
            retry_delays_ms = [1000]

            [ui]
            submit_label = "Publish"
            "#,
        )
        .unwrap();

        assert_eq!(config.groups, vec!["111", "222"]);
        assert_eq!(config.media_folder, Some(PathBuf::from("/srv/media")));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.ui.submit_label, "Publish");
        assert_eq!(config.ui.messaging_marker, "Messenger");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_legacy_json() {
        let config: Config =
            serde_json::from_str(r#"{ "groups": ["42"], "mediaFolder": "./media" }"#).unwrap();

        assert_eq!(config.groups, vec!["42"]);
        assert_eq!(config.media_folder, Some(PathBuf::from("./media")));
        assert_eq!(config.cdp_endpoint, "ws://localhost:9222");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .apply_vars(vars(&[
                ("AUTOPOST_GROUPS", "1, 2,,3"),
                ("AUTOPOST_MAX_RETRIES", "4"),
                ("AUTOPOST_RETRY_DELAYS_MS", "10,20,30"),
                ("AUTOPOST_EVIDENCE_DIR", "/tmp/evidence"),
            ]))
            .unwrap();

        assert_eq!(config.groups, vec!["1", "2", "3"]);
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.retry.retry_delays_ms, vec![10, 20, 30]);
        assert_eq!(config.evidence_dir, PathBuf::from("/tmp/evidence"));
    }

    #[test]
    fn test_invalid_env_value() {
        let result = Config::default().apply_vars(vars(&[("AUTOPOST_MAX_RETRIES", "three")]));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_requires_enough_delays() {
        let mut config = Config {
            groups: vec!["1".to_string()],
            ..Default::default()
        };
        config.retry.max_retries = 5;

        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        config.retry.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_groups() {
        assert!(Config::default().validate().is_err());
    }
}
