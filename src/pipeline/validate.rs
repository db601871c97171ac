// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;
use crate::services::Keywords;
use crate::storage::LedgerStore;
use crate::utils::console;

/// Validate configuration, the keyword file and the ledger.
pub async fn run_validate(config: &Config) -> Result<()> {
    console::header("Validating configuration");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK");
    console::sub_item(&format!("MOPS API: {}", config.mops.base_url));
    console::sub_item(&format!("Timeout: {}s", config.mops.timeout_secs));
    console::sub_item(&format!(
        "Telegram: {}",
        configured(&config.notify.telegram.bot_token, &config.notify.telegram.chat_id)
    ));
    console::sub_item(&format!(
        "LINE: {}",
        configured(
            &config.notify.line.channel_access_token,
            &config.notify.line.to
        )
    ));

    let keywords = Keywords::load(&config.paths.keywords).inspect_err(|e| {
        log::error!(
            "Cannot read keywords from {}: {}",
            config.paths.keywords.display(),
            e
        )
    })?;
    log::info!("✓ Keywords OK");
    console::sub_item(&format!("{} keywords", keywords.len()));
    if keywords.is_empty() {
        log::warn!("Keyword file is empty; runs will never match");
    }

    let ledger = LedgerStore::new(&config.paths.state).load().await?;
    log::info!("✓ Ledger OK");
    console::sub_item(&format!("{} seen keys", ledger.len()));

    log::info!("All validations passed!");
    Ok(())
}

fn configured(credential: &str, target: &str) -> &'static str {
    if credential.is_empty() || target.is_empty() {
        "not configured"
    } else {
        "configured"
    }
}
