//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Where to find the browser and which tab to attach to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// CDP HTTP endpoint of a running Chrome.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Substring a tab URL must contain.
    #[serde(default = "default_url_pattern")]
    pub url_pattern: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            url_pattern: default_url_pattern(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_url_pattern() -> String {
    "notebooklm.google.com".to_string()
}

/// Change monitor timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How often pending page mutations are collected.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delays of the scans run right after attaching.
    #[serde(default = "default_initial_scan_delays_ms")]
    pub initial_scan_delays_ms: Vec<u64>,
}

impl MonitorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn initial_scan_delays(&self) -> Vec<Duration> {
        self.initial_scan_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            initial_scan_delays_ms: default_initial_scan_delays_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_initial_scan_delays_ms() -> Vec<u64> {
    vec![1000, 3000, 5000]
}

/// Source resolution tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_ellipsis_settle_ms")]
    pub ellipsis_settle_ms: u64,

    #[serde(default = "default_panel_timeout_ms")]
    pub panel_timeout_ms: u64,

    #[serde(default = "default_panel_close_delay_ms")]
    pub panel_close_delay_ms: u64,

    #[serde(default = "default_introspection_depth")]
    pub introspection_depth: usize,

    #[serde(default = "default_max_label_len")]
    pub max_label_len: usize,

    /// Click citations and read their source panel.
    #[serde(default = "default_true")]
    pub panel_strategy: bool,

    /// Correlate unresolved citations with sidebar document names.
    #[serde(default = "default_true")]
    pub sidebar_strategy: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ellipsis_settle_ms: default_ellipsis_settle_ms(),
            panel_timeout_ms: default_panel_timeout_ms(),
            panel_close_delay_ms: default_panel_close_delay_ms(),
            introspection_depth: default_introspection_depth(),
            max_label_len: default_max_label_len(),
            panel_strategy: true,
            sidebar_strategy: true,
        }
    }
}

fn default_ellipsis_settle_ms() -> u64 {
    200
}

fn default_panel_timeout_ms() -> u64 {
    1500
}

fn default_panel_close_delay_ms() -> u64 {
    300
}

fn default_introspection_depth() -> usize {
    5
}

fn default_max_label_len() -> usize {
    50
}

/// Persistent settings location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: String,
}

impl SettingsConfig {
    /// The settings path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).as_ref())
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> String {
    "~/.citelegend/settings.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.browser.endpoint, "http://localhost:9222");
        assert_eq!(config.browser.url_pattern, "notebooklm.google.com");
        assert_eq!(config.monitor.debounce(), Duration::from_millis(500));
        assert_eq!(
            config.monitor.initial_scan_delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(5)
            ]
        );
        assert_eq!(config.resolver.panel_timeout_ms, 1500);
        assert!(config.resolver.panel_strategy);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [resolver]
            panel_strategy = false
            "#,
        )
        .unwrap();
        assert!(!config.resolver.panel_strategy);
        assert!(config.resolver.sidebar_strategy);
        assert_eq!(config.resolver.introspection_depth, 5);
    }

    #[test]
    fn test_settings_path_expanded() {
        let path = SettingsConfig::default().resolved_path();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".citelegend/settings.json"));
    }
}
