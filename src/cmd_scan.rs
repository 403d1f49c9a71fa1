//! One-shot commands: `scan`, `copy`, `transcript` and `enhance`.

use std::io::Read;

use anyhow::{Context, bail};

use citelegend_config::Config;
use citelegend_core::export::enhance_copied_text;

use crate::setup::attach;

/// Run a full rescan and print the legend.
pub(crate) async fn scan(config: &Config, json: bool) -> anyhow::Result<()> {
    let attached = attach(config).await?;
    attached.session.rescan().await?;

    if json {
        let citations = attached.session.citations();
        println!("{}", serde_json::to_string_pretty(&citations)?);
    } else {
        println!("{}", attached.session.legend_text(true));
    }
    Ok(())
}

/// Rescan and copy the legend to the page clipboard.
pub(crate) async fn copy(config: &Config) -> anyhow::Result<()> {
    let attached = attach(config).await?;
    let entries = attached.session.rescan().await?;
    attached.session.copy_legend().await?;
    println!("Copied {} citation(s)", entries.len());
    Ok(())
}

/// Print the chat transcript.
pub(crate) async fn transcript(config: &Config) -> anyhow::Result<()> {
    let attached = attach(config).await?;
    match attached.session.chat_text().await? {
        Some(text) => {
            println!("{}", text);
            Ok(())
        }
        None => bail!("No chat text found on the page"),
    }
}

/// Rewrite copied text from stdin. Needs no browser.
pub(crate) fn enhance(config: &Config) -> anyhow::Result<()> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    print!("{}", enhance_text(config, &text));
    Ok(())
}

fn enhance_text(config: &Config, text: &str) -> String {
    enhance_copied_text(text.trim_end(), config.resolver.max_label_len) + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_text_uses_configured_label_length() {
        let mut config = Config::default();
        config.resolver.max_label_len = 12;

        let out = enhance_text(&config, "As shown [[drive_pdf Quarterly operations review.pdf]]\n");
        assert_eq!(
            out,
            "As shown [Quarterly...]\n\nSources:\n[1] Quarterly operations review\n"
        );
    }

    #[test]
    fn test_enhance_text_passes_plain_text_through() {
        let config = Config::default();
        assert_eq!(enhance_text(&config, "nothing to do [2]\n"), "nothing to do [2]\n");
    }
}
