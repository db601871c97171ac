//! Dedup ledger.
//!
//! The set of identity keys already notified in earlier runs. It is
//! append-only: nothing ever expires, so the file grows with every distinct
//! match for the lifetime of the deployment. Daily match volume is small
//! enough that this is accepted; the key count is logged on every save to
//! keep the growth visible.
//!
//! Two overlapping runs would race on the file. Callers must serialize runs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::IdentityKey;
use crate::storage::{read_optional, write_atomic};

/// Set of previously seen identity keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    seen: BTreeSet<String>,
}

impl Ledger {
    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.seen.iter().map(String::as_str)
    }

    /// Whether every key of `other` is also in `self`.
    pub fn is_superset(&self, other: &Ledger) -> bool {
        self.seen.is_superset(&other.seen)
    }
}

impl<S: Into<String>> FromIterator<S> for Ledger {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            seen: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Union of an existing ledger and this run's keys.
pub fn merge<'a>(
    existing: &Ledger,
    new_keys: impl IntoIterator<Item = &'a IdentityKey>,
) -> Ledger {
    let mut seen = existing.seen.clone();
    seen.extend(new_keys.into_iter().map(|k| k.as_str().to_string()));
    Ledger { seen }
}

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    // Required: a file without it is treated as corrupt rather than empty,
    // since an empty ledger re-sends every match.
    seen_keys: Vec<String>,
}

/// File-backed ledger.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger. A missing file is an empty ledger; an unreadable one
    /// is an error, since running without it would re-notify everything.
    pub async fn load(&self) -> Result<Ledger> {
        let Some(bytes) = read_optional(&self.path).await? else {
            log::info!("No ledger at {}, starting empty", self.path.display());
            return Ok(Ledger::default());
        };

        let file: LedgerFile = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::corrupt_state(&self.path, e))?;
        let ledger: Ledger = file.seen_keys.into_iter().collect();
        log::debug!("Loaded {} keys from {}", ledger.len(), self.path.display());
        Ok(ledger)
    }

    /// Persist the ledger as a sorted key list.
    pub async fn save(&self, ledger: &Ledger) -> Result<()> {
        let file = LedgerFile {
            seen_keys: ledger.keys().map(str::to_string).collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.path, &bytes).await?;
        log::info!(
            "Ledger saved: {} keys in {}",
            ledger.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keys(raw: &[&str]) -> Vec<IdentityKey> {
        raw.iter().map(|k| IdentityKey::new(*k)).collect()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LedgerStore::new(tmp.path().join("state.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let store = LedgerStore::new(tmp.path().join("public/deep/state.json"));
        let ledger: Ledger = ["b|sii|2|1", "a|sii|1|1", "c|otc|3|2"].into_iter().collect();

        store.save(&ledger).await.unwrap();
        assert_eq!(store.load().await.unwrap(), ledger);
    }

    #[tokio::test]
    async fn test_saved_sorted() {
        let tmp = TempDir::new().unwrap();
        let store = LedgerStore::new(tmp.path().join("state.json"));
        let ledger: Ledger = ["z", "a", "m"].into_iter().collect();

        store.save(&ledger).await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"seen_keys": ["a", "m", "z"]}));
    }

    #[tokio::test]
    async fn test_corrupt_file_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let store = LedgerStore::new(&path);

        for body in ["{not json", "", "[\"a\"]", "{\"seen_keys\": \"a\"}", "{}"] {
            std::fs::write(&path, body).unwrap();
            assert!(
                matches!(store.load().await, Err(AppError::CorruptState { .. })),
                "body {body:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_seen_keys_is_not_an_empty_ledger() {
        let tmp = TempDir::new().unwrap();
        let store = LedgerStore::new(tmp.path().join("state.json"));
        std::fs::write(store.path(), "{}").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptState { .. }));
        assert!(err.to_string().contains("seen_keys"));
    }

    #[tokio::test]
    async fn test_loads_existing_layout_with_extra_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, r#"{"seen_keys": ["1140102|sii|3004|1"], "version": 1}"#).unwrap();

        let ledger = LedgerStore::new(&path).load().await.unwrap();
        assert!(ledger.contains(&IdentityKey::new("1140102|sii|3004|1")));
    }

    #[test]
    fn test_merge_is_union_and_superset() {
        let existing: Ledger = ["a", "b"].into_iter().collect();
        let new_keys = keys(&["b", "c"]);

        let merged = merge(&existing, &new_keys);
        assert!(merged.is_superset(&existing));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        // Input untouched.
        assert_eq!(existing.len(), 2);
    }

    #[test]
    fn test_merge_with_nothing() {
        let existing: Ledger = ["a"].into_iter().collect();
        assert_eq!(merge(&existing, std::iter::empty()), existing);
    }
}
