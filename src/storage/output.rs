//! Run outputs: a structured JSON document and a flattened CSV table.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::Result;
use crate::models::{ListingQuery, MatchedAnnouncement};
use crate::storage::write_atomic;
use crate::utils::time::{format_timestamp, taipei_format};

/// CSV header, in column order.
pub const CSV_COLUMNS: [&str; 12] = [
    "key",
    "speech_date",
    "speech_time",
    "company_id",
    "company_name",
    "subject",
    "matched_keywords",
    "enterDate",
    "marketKind",
    "serialNumber",
    "detail_json",
    "fetched_at_tw",
];

/// Run metadata written at the top of the JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta<'a> {
    #[serde(rename = "run_at_tw", with = "taipei_format")]
    pub run_at: DateTime<FixedOffset>,
    pub query: ListingQuery,
    pub keywords: &'a [String],
    pub matched_count: usize,
    pub new_matched_count: usize,
}

#[derive(Serialize)]
struct OutputDocument<'a> {
    meta: &'a RunMeta<'a>,
    items: &'a [MatchedAnnouncement],
}

/// Writes the JSON and CSV outputs of a run.
#[derive(Debug, Clone)]
pub struct OutputSink {
    json_path: PathBuf,
    csv_path: PathBuf,
}

impl OutputSink {
    pub fn new(json_path: impl Into<PathBuf>, csv_path: impl Into<PathBuf>) -> Self {
        Self {
            json_path: json_path.into(),
            csv_path: csv_path.into(),
        }
    }

    /// Write both documents for the given matches.
    pub async fn write(&self, meta: &RunMeta<'_>, matched: &[MatchedAnnouncement]) -> Result<()> {
        let doc = OutputDocument {
            meta,
            items: matched,
        };
        write_atomic(&self.json_path, &serde_json::to_vec_pretty(&doc)?).await?;
        log::info!(
            "Wrote {} items to {}",
            matched.len(),
            self.json_path.display()
        );

        write_atomic(&self.csv_path, render_csv(matched)?.as_bytes()).await?;
        log::info!("Wrote {} rows to {}", matched.len(), self.csv_path.display());
        Ok(())
    }
}

/// Render matches as CSV with a header row and CRLF line endings.
pub fn render_csv(matched: &[MatchedAnnouncement]) -> Result<String> {
    let mut out = String::new();
    push_record(&mut out, CSV_COLUMNS.iter().map(|c| c.to_string()));

    for item in matched {
        let ann = &item.announcement;
        let params = &ann.detail_params;
        push_record(
            &mut out,
            [
                item.key.to_string(),
                ann.speech_date.clone(),
                ann.speech_time.clone(),
                ann.company_id.clone(),
                ann.company_name.clone(),
                ann.subject.clone(),
                item.matched_keywords.join("|"),
                params.enter_date().unwrap_or_default(),
                params.market_kind().unwrap_or_default(),
                params.serial_number().unwrap_or_default(),
                serde_json::to_string(&item.detail)?,
                format_timestamp(&item.fetched_at),
            ],
        );
    }
    Ok(out)
}

fn push_record(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&field));
    }
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Announcement, DetailParams, IdentityKey};
    use crate::utils::time::taipei_offset;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> MatchedAnnouncement {
        let params: DetailParams = serde_json::from_value(json!({
            "enterDate": "1140102",
            "marketKind": "sii",
            "companyId": "3004",
            "serialNumber": 1
        }))
        .unwrap();
        MatchedAnnouncement {
            key: IdentityKey::new("1140102|sii|3004|1"),
            announcement: Announcement {
                speech_date: "114/01/02".into(),
                speech_time: "17:32:17".into(),
                company_id: "3004".into(),
                company_name: "豐達科".into(),
                subject: "公司進行庫藏股轉讓".into(),
                detail_params: params,
            },
            matched_keywords: vec!["庫藏股".into(), "轉讓".into()],
            detail: json!({"result": {"content": "說明, \"全文\""}}),
            fetched_at: taipei_offset()
                .with_ymd_and_hms(2025, 1, 2, 18, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_render_csv_header_and_row() {
        let csv = render_csv(&[sample()]).unwrap();
        let mut lines = csv.split("\r\n");

        assert_eq!(lines.next().unwrap(), CSV_COLUMNS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with(concat!(
            "1140102|sii|3004|1,114/01/02,17:32:17,3004,豐達科,",
            "公司進行庫藏股轉讓,庫藏股|轉讓,1140102,sii,1,"
        )));
        assert!(row.ends_with(",2025-01-02 18:00:00"));
        assert!(row.contains(r#""{""result"":{""content"":""說明, \""全文\""""}}""#));
    }

    #[test]
    fn test_render_csv_empty_has_header_only() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(csv, format!("{}\r\n", CSV_COLUMNS.join(",")));
    }

    #[tokio::test]
    async fn test_write_json_document() {
        let tmp = TempDir::new().unwrap();
        let sink = OutputSink::new(
            tmp.path().join("out/data.json"),
            tmp.path().join("out/data.csv"),
        );
        let keywords = vec!["庫藏股".to_string(), "轉讓".to_string()];
        let matched = vec![sample()];
        let meta = RunMeta {
            run_at: taipei_offset().with_ymd_and_hms(2025, 1, 2, 18, 0, 5).unwrap(),
            query: ListingQuery::from_date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
            keywords: &keywords,
            matched_count: 1,
            new_matched_count: 1,
        };

        sink.write(&meta, &matched).await.unwrap();

        let doc: serde_json::Value =
            serde_json::from_slice(&std::fs::read(tmp.path().join("out/data.json")).unwrap())
                .unwrap();
        assert_eq!(
            doc["meta"],
            json!({
                "run_at_tw": "2025-01-02 18:00:05",
                "query": {"year": "114", "month": "1", "day": "02"},
                "keywords": ["庫藏股", "轉讓"],
                "matched_count": 1,
                "new_matched_count": 1
            })
        );
        let item = &doc["items"][0];
        assert_eq!(item["key"], "1140102|sii|3004|1");
        assert_eq!(item["subject"], "公司進行庫藏股轉讓");
        assert_eq!(item["matched_keywords"], json!(["庫藏股", "轉讓"]));
        assert_eq!(item["detail_params"]["serialNumber"], 1);
        assert_eq!(item["fetched_at_tw"], "2025-01-02 18:00:00");
        assert!(tmp.path().join("out/data.csv").exists());
    }
}
