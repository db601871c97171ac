// src/services/notifier.rs

//! Push notifications for newly matched announcements.
//!
//! A run renders one digest and hands it to every configured channel. Each
//! channel is tried on its own; a failure is reported back, never raised.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{LineConfig, MatchedAnnouncement, NotifyConfig, TelegramConfig};
use crate::utils::http::{create_notify_client, endpoint};

/// Bounded text summary of new matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    text: String,
}

impl Digest {
    /// Render a digest listing at most `preview_limit` items.
    pub fn build(date_label: &str, items: &[MatchedAnnouncement], preview_limit: usize) -> Self {
        let mut lines = Vec::with_capacity(items.len().min(preview_limit) + 2);
        lines.push(format!(
            "📣 MOPS 新公告命中 {} 筆（{}）",
            items.len(),
            date_label
        ));

        for item in items.iter().take(preview_limit) {
            let ann = &item.announcement;
            lines.push(format!(
                "- {} {} {} {}（{}）",
                ann.company_id,
                ann.company_name,
                ann.speech_time,
                ann.subject,
                item.matched_keywords.join(",")
            ));
        }

        if items.len() > preview_limit {
            lines.push(format!("... 另有 {} 筆", items.len() - preview_limit));
        }

        Self {
            text: lines.join("\n"),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Notification channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Telegram,
    Line,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Line => "line",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    /// Credentials not configured
    Skipped,
    Failed(String),
}

/// A push message sink.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Whether credentials are present.
    fn is_configured(&self) -> bool;

    /// Deliver one text message.
    async fn send(&self, text: &str) -> Result<()>;
}

/// Per-channel results of a dispatch.
#[derive(Debug, Clone, Default)]
pub struct NotifyReport {
    pub outcomes: Vec<(ChannelKind, ChannelOutcome)>,
}

impl NotifyReport {
    pub fn outcome(&self, kind: ChannelKind) -> Option<&ChannelOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn delivered(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Delivered))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&ChannelOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Fans a digest out to all channels.
#[derive(Default)]
pub struct Notifier {
    channels: Vec<Box<dyn NotifyChannel>>,
}

impl Notifier {
    /// Build the Telegram and LINE channels from configuration.
    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        let client = create_notify_client(config.timeout_secs)?;
        Ok(Self::new(vec![
            Box::new(TelegramChannel::new(client.clone(), &config.telegram)),
            Box::new(LineChannel::new(client, &config.line)),
        ]))
    }

    pub fn new(channels: Vec<Box<dyn NotifyChannel>>) -> Self {
        Self { channels }
    }

    /// Send the text to every channel, one after another.
    pub async fn dispatch(&self, text: &str) -> NotifyReport {
        let mut report = NotifyReport::default();
        for channel in &self.channels {
            let kind = channel.kind();
            let outcome = if !channel.is_configured() {
                log::debug!("{} not configured, skipping", kind);
                ChannelOutcome::Skipped
            } else {
                match channel.send(text).await {
                    Ok(()) => ChannelOutcome::Delivered,
                    Err(e) => ChannelOutcome::Failed(e.to_string()),
                }
            };
            report.outcomes.push((kind, outcome));
        }
        report
    }
}

/// Telegram Bot API `sendMessage`.
pub struct TelegramChannel {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    async fn send(&self, text: &str) -> Result<()> {
        let url = endpoint(&self.api_base, &format!("bot{}/sendMessage", self.bot_token))?;
        self.client
            .post(url)
            .json(&json!({ "chat_id": self.chat_id, "text": text }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            // The URL embeds the bot token.
            .map_err(|e| AppError::notification(self.kind().as_str(), e.without_url()))?;
        Ok(())
    }
}

/// LINE Messaging API push message.
pub struct LineChannel {
    client: Client,
    api_base: String,
    channel_access_token: String,
    to: String,
}

impl LineChannel {
    pub fn new(client: Client, config: &LineConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            channel_access_token: config.channel_access_token.clone(),
            to: config.to.clone(),
        }
    }
}

#[async_trait]
impl NotifyChannel for LineChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Line
    }

    fn is_configured(&self) -> bool {
        !self.channel_access_token.is_empty() && !self.to.is_empty()
    }

    async fn send(&self, text: &str) -> Result<()> {
        let url = endpoint(&self.api_base, "v2/bot/message/push")?;
        self.client
            .post(url)
            .bearer_auth(&self.channel_access_token)
            .json(&json!({
                "to": self.to,
                "messages": [{ "type": "text", "text": text }]
            }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::notification(self.kind().as_str(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Announcement, DetailParams, IdentityKey};
    use crate::utils::time::taipei_now;
    use std::sync::{Arc, Mutex};

    fn item(company_id: &str, subject: &str, keywords: &[&str]) -> MatchedAnnouncement {
        MatchedAnnouncement {
            key: IdentityKey::new(format!("1140102|sii|{company_id}|1")),
            announcement: Announcement {
                speech_date: "114/01/02".into(),
                speech_time: "17:32:17".into(),
                company_id: company_id.into(),
                company_name: "豐達科".into(),
                subject: subject.into(),
                detail_params: DetailParams::default(),
            },
            matched_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            detail: serde_json::Value::Null,
            fetched_at: taipei_now(),
        }
    }

    #[test]
    fn test_digest_lines() {
        let items = vec![item("3004", "公司進行庫藏股轉讓", &["庫藏股", "轉讓"])];
        let digest = Digest::build("114/01/02", &items, 10);
        assert_eq!(
            digest.text(),
            concat!(
                "📣 MOPS 新公告命中 1 筆（114/01/02）\n",
                "- 3004 豐達科 17:32:17 公司進行庫藏股轉讓（庫藏股,轉讓）"
            )
        );
    }

    #[test]
    fn test_digest_truncates_with_summary() {
        let items: Vec<_> = (0..13)
            .map(|i| item(&format!("{}", 1000 + i), "減資", &["減資"]))
            .collect();
        let digest = Digest::build("114/01/02", &items, 10);
        let lines: Vec<&str> = digest.text().lines().collect();

        assert_eq!(lines.len(), 12);
        assert!(lines[0].contains("13 筆"));
        assert!(lines[10].starts_with("- 1009 "));
        assert_eq!(lines[11], "... 另有 3 筆");
    }

    #[test]
    fn test_digest_exact_limit_has_no_summary() {
        let items: Vec<_> = (0..10).map(|_| item("1101", "減資", &["減資"])).collect();
        let digest = Digest::build("114/01/02", &items, 10);
        assert_eq!(digest.text().lines().count(), 11);
        assert!(!digest.text().contains("另有"));
    }

    struct FakeChannel {
        kind: ChannelKind,
        configured: bool,
        fail: bool,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl NotifyChannel for FakeChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn send(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(AppError::notification(self.kind.as_str(), "503"));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_block_other_channel() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::new(vec![
            Box::new(FakeChannel {
                kind: ChannelKind::Telegram,
                configured: true,
                fail: true,
                sent: Arc::clone(&sent),
            }),
            Box::new(FakeChannel {
                kind: ChannelKind::Line,
                configured: true,
                fail: false,
                sent: Arc::clone(&sent),
            }),
        ]);

        let report = notifier.dispatch("hello").await;

        assert!(matches!(
            report.outcome(ChannelKind::Telegram),
            Some(ChannelOutcome::Failed(_))
        ));
        assert_eq!(
            report.outcome(ChannelKind::Line),
            Some(&ChannelOutcome::Delivered)
        );
        assert_eq!(report.delivered(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(*sent.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_unconfigured_channels_are_skipped() {
        let notifier = Notifier::from_config(&NotifyConfig::default()).unwrap();
        let report = notifier.dispatch("hello").await;

        assert_eq!(
            report.outcome(ChannelKind::Telegram),
            Some(&ChannelOutcome::Skipped)
        );
        assert_eq!(
            report.outcome(ChannelKind::Line),
            Some(&ChannelOutcome::Skipped)
        );
        assert_eq!(report.failed(), 0);
    }
}
