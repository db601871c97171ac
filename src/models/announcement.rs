//! Announcement data structures.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::utils::normalize_text;
use crate::utils::time::taipei_format;

/// Number of cells in a listing row.
pub const ROW_ARITY: usize = 6;

/// Detail lookup parameters attached to a listing row.
///
/// Kept as the upstream JSON object so the detail request body is exactly
/// what the listing handed out. The identity fields are read by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailParams(Map<String, Value>);

impl DetailParams {
    pub const ENTER_DATE: &'static str = "enterDate";
    pub const MARKET_KIND: &'static str = "marketKind";
    pub const COMPANY_ID: &'static str = "companyId";
    pub const SERIAL_NUMBER: &'static str = "serialNumber";

    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Scalar field coerced to a string. Null, arrays and objects are
    /// treated as absent.
    pub fn field(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn enter_date(&self) -> Option<String> {
        self.field(Self::ENTER_DATE)
    }

    pub fn market_kind(&self) -> Option<String> {
        self.field(Self::MARKET_KIND)
    }

    pub fn company_id(&self) -> Option<String> {
        self.field(Self::COMPANY_ID)
    }

    pub fn serial_number(&self) -> Option<String> {
        self.field(Self::SERIAL_NUMBER)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for DetailParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Stable dedup key of an announcement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the daily listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    /// Announcement date as listed (ROC calendar, e.g. `114/01/02`)
    pub speech_date: String,

    /// Announcement time as listed
    pub speech_time: String,

    pub company_id: String,

    pub company_name: String,

    /// Whitespace-normalized subject line
    pub subject: String,

    pub detail_params: DetailParams,
}

impl Announcement {
    /// Parse a raw listing row.
    ///
    /// Rows look like
    /// `["114/01/02", "17:32:17", "3004", "豐達科", "主旨", {"apiName": ..., "parameters": ...}]`.
    /// Extra trailing cells are ignored. A sixth cell that is not an object
    /// yields empty parameters; a `parameters` value that is not an object is
    /// rejected.
    pub fn from_row(row: &Value) -> Result<Self> {
        let cells = row
            .as_array()
            .ok_or_else(|| AppError::shape("listing row is not an array"))?;
        if cells.len() < ROW_ARITY {
            return Err(AppError::shape(format!(
                "listing row has {} cells, expected {}",
                cells.len(),
                ROW_ARITY
            )));
        }

        let detail_params = match cells[5].as_object().and_then(|meta| meta.get("parameters")) {
            None | Some(Value::Null) => DetailParams::default(),
            Some(Value::Object(map)) => DetailParams::new(map.clone()),
            Some(other) => {
                return Err(AppError::shape(format!(
                    "detail parameters are not an object: {other}"
                )));
            }
        };

        Ok(Self {
            speech_date: cell_text(&cells[0]),
            speech_time: cell_text(&cells[1]),
            company_id: cell_text(&cells[2]),
            company_name: cell_text(&cells[3]),
            subject: cell_text(&cells[4]),
            detail_params,
        })
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => normalize_text(s),
        Value::Null => String::new(),
        other => normalize_text(&other.to_string()),
    }
}

/// A listing row that hit at least one keyword, enriched with its detail.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedAnnouncement {
    pub key: IdentityKey,

    #[serde(flatten)]
    pub announcement: Announcement,

    /// Hits in keyword order, never empty
    pub matched_keywords: Vec<String>,

    /// Detail document as returned by the upstream
    pub detail: Value,

    #[serde(rename = "fetched_at_tw", with = "taipei_format")]
    pub fetched_at: DateTime<FixedOffset>,
}

/// A matched row whose detail lookup failed.
#[derive(Debug, Clone, Serialize)]
pub struct DetailFailure {
    pub key: IdentityKey,
    pub company_id: String,
    pub subject: String,
    pub error: String,
}

/// Counters for a single poll.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Rows returned by the listing
    pub listing_rows: usize,
    /// Rows rejected for shape
    pub skipped_rows: usize,
    /// Rows without any keyword hit
    pub unmatched_rows: usize,
    /// Matched rows dropped because their detail lookup failed
    pub detail_failures: Vec<DetailFailure>,
}

/// Outcome of a poll.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Every enriched match, in listing order
    pub matched: Vec<MatchedAnnouncement>,
    /// Matches whose key was absent from the ledger before this run
    pub newly_matched: Vec<MatchedAnnouncement>,
    pub stats: RunStats,
}
