// src/pipeline/pipeline.rs

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Config, ListingQuery, RunResult};
use crate::services::{
    ChannelOutcome, Digest, DisclosureSource, Keywords, MopsClient, Notifier, NotifyReport,
};
use crate::storage::{LedgerStore, OutputSink, RunMeta};
use crate::utils::console;
use crate::utils::time::taipei_now;

use super::poll::{PollOptions, run_poll};

/// Per-invocation options.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Listing date to poll
    pub date: NaiveDate,
    /// Skip ledger persistence and notifications
    pub dry_run: bool,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub result: RunResult,
    /// `None` when nothing was dispatched
    pub notify: Option<NotifyReport>,
}

/// Run the full pipeline against the live MOPS API.
pub async fn run_pipeline(config: &Config, options: &RunOptions) -> Result<RunReport> {
    let source = MopsClient::new(&config.mops)?;
    let notifier = Notifier::from_config(&config.notify)?;
    run_pipeline_with(config, options, &source, &notifier).await
}

/// Run the full pipeline with the given upstream and notifier.
pub async fn run_pipeline_with(
    config: &Config,
    options: &RunOptions,
    source: &dyn DisclosureSource,
    notifier: &Notifier,
) -> Result<RunReport> {
    let run_at = taipei_now();
    let query = ListingQuery::from_date(options.date);
    console::header(&format!("MOPS watch for {}", query.label()));

    let keywords = Keywords::load(&config.paths.keywords)?;
    if keywords.is_empty() {
        log::warn!(
            "No keywords in {}; nothing will match",
            config.paths.keywords.display()
        );
    } else {
        log::info!("Loaded {} keywords", keywords.len());
    }

    console::step(1, 3, "Poll - listing, keyword match, detail lookup");
    let store = LedgerStore::new(&config.paths.state);
    let poll_options = PollOptions {
        require_identity_fields: config.pipeline.require_identity_fields,
        persist: !options.dry_run,
    };
    let result = run_poll(source, &keywords, &store, &query, poll_options).await?;

    console::step(2, 3, "Output - JSON and CSV");
    let meta = RunMeta {
        run_at,
        query,
        keywords: keywords.as_slice(),
        matched_count: result.matched.len(),
        new_matched_count: result.newly_matched.len(),
    };
    OutputSink::new(&config.paths.out_json, &config.paths.out_csv)
        .write(&meta, &result.matched)
        .await?;

    console::step(3, 3, "Notify - new matches");
    let notify = if result.newly_matched.is_empty() {
        log::info!("No new matches, nothing to send");
        None
    } else if options.dry_run {
        log::info!(
            "Dry run: {} new matches not sent",
            result.newly_matched.len()
        );
        None
    } else {
        let digest = Digest::build(
            &query.label(),
            &result.newly_matched,
            config.notify.preview_limit,
        );
        let report = notifier.dispatch(digest.text()).await;
        log_notify_report(&report);
        Some(report)
    };

    log_summary(&result, notify.as_ref());
    Ok(RunReport { result, notify })
}

fn log_notify_report(report: &NotifyReport) {
    for (kind, outcome) in &report.outcomes {
        match outcome {
            ChannelOutcome::Delivered => log::info!("{} notified", kind),
            ChannelOutcome::Skipped => log::info!("{} not configured, skipped", kind),
            ChannelOutcome::Failed(reason) => log::warn!("{} notify failed: {}", kind, reason),
        }
    }
}

fn log_summary(result: &RunResult, notify: Option<&NotifyReport>) {
    console::summary(
        "Run complete",
        &[
            ("listing rows", result.stats.listing_rows.to_string()),
            ("skipped rows", result.stats.skipped_rows.to_string()),
            ("matched", result.matched.len().to_string()),
            ("new matched", result.newly_matched.len().to_string()),
            (
                "detail failures",
                result.stats.detail_failures.len().to_string(),
            ),
            (
                "channels delivered",
                notify.map_or(0, NotifyReport::delivered).to_string(),
            ),
        ],
    );
    for failure in &result.stats.detail_failures {
        console::sub_item(&format!(
            "detail failed: {} {} ({})",
            failure.company_id, failure.subject, failure.error
        ));
    }
}
