//! Wiring from configuration to a running citation session.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use citelegend_config::{Config, ConfigLoader, ConfigValidator};
use citelegend_core::{
    CitationSession, FileSettingsStore, MarkerExtractor, ResolverConfig, Settings, SourceResolver,
};
use citelegend_page_cdp::CdpPage;

/// A session attached to a live tab.
pub(crate) struct Attached {
    pub page: Arc<CdpPage>,
    pub session: Arc<CitationSession>,
}

/// Load and validate the configuration.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = ConfigLoader::load_or_default(path).context("failed to load configuration")?;

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    Ok(config)
}

/// The persistent settings named by the configuration.
pub(crate) fn settings(config: &Config) -> Settings {
    let path = config.settings.resolved_path();
    Settings::new(Arc::new(FileSettingsStore::new(path)))
}

pub(crate) fn resolver_config(config: &Config) -> ResolverConfig {
    let resolver = &config.resolver;
    ResolverConfig {
        panel_timeout: Duration::from_millis(resolver.panel_timeout_ms),
        panel_close_delay: Duration::from_millis(resolver.panel_close_delay_ms),
        introspection_depth: resolver.introspection_depth,
        max_label_len: resolver.max_label_len,
        panel_strategy: resolver.panel_strategy,
        sidebar_strategy: resolver.sidebar_strategy,
        ..ResolverConfig::default()
    }
}

/// Attach to the notebook tab and build a session over it.
pub(crate) async fn attach(config: &Config) -> anyhow::Result<Attached> {
    let browser = &config.browser;
    let page = CdpPage::connect(&browser.endpoint, &browser.url_pattern)
        .await
        .with_context(|| format!("could not attach to a tab matching '{}'", browser.url_pattern))?;
    info!("Attached to {}", page.target().url);
    let page = Arc::new(page);

    let session = CitationSession::builder(page.clone(), settings(config))
        .presenter(page.clone())
        .clipboard(page.clone())
        .extractor(MarkerExtractor::new(Duration::from_millis(
            config.resolver.ellipsis_settle_ms,
        )))
        .resolver(SourceResolver::new(resolver_config(config)))
        .build()
        .await?;

    Ok(Attached { page, session })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_config_from_file_values() {
        let config = ConfigLoader::load_str(
            r#"
            [resolver]
            panel_timeout_ms = 2500
            introspection_depth = 8
            sidebar_strategy = false
            "#,
        )
        .unwrap();

        let resolver = resolver_config(&config);
        assert_eq!(resolver.panel_timeout, Duration::from_millis(2500));
        assert_eq!(resolver.panel_close_delay, Duration::from_millis(300));
        assert_eq!(resolver.introspection_depth, 8);
        assert!(resolver.panel_strategy);
        assert!(!resolver.sidebar_strategy);
        assert_eq!(
            resolver.panel_poll_interval,
            ResolverConfig::default().panel_poll_interval
        );
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor]\ndebounce_ms = 10\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("monitor.debounce_ms"));
    }
}
