//! `override` subcommand handlers.
//!
//! These edit the settings file directly, so no browser is needed. A
//! running `watch` picks the change up on its next attach.

use anyhow::Context;

use citelegend_config::Config;
use citelegend_core::{CitationKey, Settings};

use crate::cli::OverrideAction;
use crate::setup::settings;

/// Handle override subcommands.
pub(crate) async fn handle_override_command(
    config: &Config,
    action: OverrideAction,
) -> anyhow::Result<()> {
    let settings = settings(config);
    settings.initialize().await?;

    match action {
        OverrideAction::Set { key, name } => set(&settings, &key, &name).await,
        OverrideAction::Clear { key } => clear(&settings, &key).await,
        OverrideAction::List => list(&settings).await,
    }
}

async fn set(settings: &Settings, key: &str, name: &str) -> anyhow::Result<()> {
    let key: CitationKey = key.parse().context("invalid citation key")?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Custom name cannot be empty; use `override clear {}`", key);
    }

    let mut names = settings.custom_names().await?;
    names.insert(key.clone(), name.to_string());
    settings.set_custom_names(&names).await?;
    println!("[{}] -> {}", key, name);
    Ok(())
}

async fn clear(settings: &Settings, key: &str) -> anyhow::Result<()> {
    let key: CitationKey = key.parse().context("invalid citation key")?;

    let mut names = settings.custom_names().await?;
    if names.remove(&key).is_some() {
        settings.set_custom_names(&names).await?;
        println!("Cleared custom name for [{}]", key);
    } else {
        println!("No custom name for [{}]", key);
    }
    Ok(())
}

async fn list(settings: &Settings) -> anyhow::Result<()> {
    let names = settings.custom_names().await?;
    if names.is_empty() {
        println!("No custom names set.");
        return Ok(());
    }
    for (key, name) in names {
        println!("[{}] {}", key, name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use citelegend_core::MemorySettingsStore;

    #[tokio::test]
    async fn test_set_and_clear() {
        let settings = Settings::new(Arc::new(MemorySettingsStore::new()));
        settings.initialize().await.unwrap();

        set(&settings, "2", "  Annual report ").await.unwrap();
        let names = settings.custom_names().await.unwrap();
        assert_eq!(names.get(&CitationKey::from(2)).map(String::as_str), Some("Annual report"));

        clear(&settings, "2").await.unwrap();
        assert!(settings.custom_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_rejects_blank_name() {
        let settings = Settings::in_memory();
        assert!(set(&settings, "1", "   ").await.is_err());
    }

    #[tokio::test]
    async fn test_set_rejects_blank_key() {
        let settings = Settings::in_memory();
        assert!(set(&settings, "  ", "Report").await.is_err());
    }
}
