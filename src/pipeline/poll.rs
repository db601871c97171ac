// src/pipeline/poll.rs

//! Poll-and-enrich pass.
//!
//! One listing call, then one detail call per keyword hit, in listing
//! order. Detail lookups are limited to rows that matched because the
//! unfiltered listing is much larger than the hits.

use serde_json::Value;

use crate::error::Result;
use crate::models::{
    Announcement, DetailFailure, ListingQuery, MatchedAnnouncement, RunResult, RunStats,
};
use crate::pipeline::classify::classify;
use crate::services::{DisclosureSource, IdentityFields, Keywords, build_key};
use crate::storage::{LedgerStore, merge};
use crate::utils::time::taipei_now;

/// Knobs for a single poll.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Reject rows whose identity fields are incomplete
    pub require_identity_fields: bool,
    /// Write the merged ledger back
    pub persist: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            require_identity_fields: false,
            persist: true,
        }
    }
}

/// Fetch, match, enrich, classify and record one day's listing.
///
/// The ledger is loaded before any network call so a corrupt ledger stops
/// the run early. A failed listing call ends the run; a failed detail call
/// only drops that row, which stays out of the ledger and is retried on the
/// next run.
pub async fn run_poll(
    source: &dyn DisclosureSource,
    keywords: &Keywords,
    store: &LedgerStore,
    query: &ListingQuery,
    options: PollOptions,
) -> Result<RunResult> {
    let snapshot = store.load().await?;

    let rows = source.fetch_listing(query).await?;
    log::info!("Listing {} returned {} rows", query.label(), rows.len());

    let mut stats = RunStats {
        listing_rows: rows.len(),
        ..RunStats::default()
    };
    let mut matched = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let announcement = match accept_row(row, options) {
            Ok(announcement) => announcement,
            Err(e) if e.is_recoverable() => {
                stats.skipped_rows += 1;
                log::debug!("Skipping row {}: {}", idx, e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let hits: Vec<String> = keywords
            .matches(&announcement.subject)
            .into_iter()
            .map(str::to_string)
            .collect();
        if hits.is_empty() {
            stats.unmatched_rows += 1;
            continue;
        }

        let key = build_key(&announcement.detail_params);
        match source.fetch_detail(&announcement.detail_params).await {
            Ok(detail) => {
                log::debug!("Matched {} {:?}", key, hits);
                matched.push(MatchedAnnouncement {
                    key,
                    announcement,
                    matched_keywords: hits,
                    detail,
                    fetched_at: taipei_now(),
                });
            }
            Err(e) => {
                log::warn!(
                    "Detail lookup failed for {} {} ({}): {}",
                    announcement.company_id,
                    announcement.subject,
                    key,
                    e
                );
                stats.detail_failures.push(DetailFailure {
                    key,
                    company_id: announcement.company_id,
                    subject: announcement.subject,
                    error: e.to_string(),
                });
            }
        }
    }

    let classification = classify(&snapshot, &matched);
    if classification.has_new() {
        log::info!(
            "{} matched, {} new, {} already seen",
            matched.len(),
            classification.newly_matched.len(),
            classification.seen_count
        );
    } else {
        log::info!("{} matched, none new", matched.len());
    }

    if options.persist {
        let merged = merge(&snapshot, matched.iter().map(|m| &m.key));
        store.save(&merged).await?;
    } else {
        log::info!("Dry run: ledger left untouched");
    }

    Ok(RunResult {
        matched,
        newly_matched: classification.newly_matched,
        stats,
    })
}

fn accept_row(row: &Value, options: PollOptions) -> Result<Announcement> {
    let announcement = Announcement::from_row(row)?;
    if options.require_identity_fields {
        IdentityFields::from_params(&announcement.detail_params).require_complete()?;
    }
    Ok(announcement)
}
