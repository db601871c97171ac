// src/pipeline/info.rs

use crate::error::Result;
use crate::models::Config;
use crate::storage::{Ledger, LedgerStore};

/// Show the ledger location and size.
pub async fn run_info(config: &Config) -> Result<Ledger> {
    let store = LedgerStore::new(&config.paths.state);
    log::info!("Ledger: {}", store.path().display());

    if !store.path().exists() {
        log::info!("No ledger yet.");
        return Ok(Ledger::default());
    }

    let ledger = store.load().await?;
    log::info!("Seen keys: {}", ledger.len());
    if let Some(last) = ledger.keys().last() {
        log::info!("Highest key: {}", last);
    }
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_info_reports_saved_keys() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.state = tmp.path().join("state.json");

        assert!(run_info(&config).await.unwrap().is_empty());

        let ledger: Ledger = ["1140102|sii|3004|1"].into_iter().collect();
        LedgerStore::new(&config.paths.state).save(&ledger).await.unwrap();
        assert_eq!(run_info(&config).await.unwrap().len(), 1);
    }
}
