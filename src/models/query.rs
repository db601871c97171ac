//! Listing query for a single day.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// Offset between the Gregorian and ROC (Minguo) calendars.
pub const ROC_YEAR_OFFSET: i32 = 1911;

/// Date parameters of the listing request.
///
/// The upstream expects the ROC year, an unpadded month and a two-digit day,
/// all as strings: `{"year": "115", "month": "1", "day": "04"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingQuery {
    date: NaiveDate,
}

impl ListingQuery {
    pub fn from_date(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn roc_year(&self) -> i32 {
        self.date.year() - ROC_YEAR_OFFSET
    }

    pub fn year_param(&self) -> String {
        self.roc_year().to_string()
    }

    pub fn month_param(&self) -> String {
        self.date.month().to_string()
    }

    pub fn day_param(&self) -> String {
        format!("{:02}", self.date.day())
    }

    /// Date in the listing's own notation, e.g. `115/01/04`.
    pub fn label(&self) -> String {
        format!(
            "{}/{:02}/{:02}",
            self.roc_year(),
            self.date.month(),
            self.date.day()
        )
    }
}

#[derive(Serialize)]
struct QueryPayload {
    year: String,
    month: String,
    day: String,
}

impl Serialize for ListingQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        QueryPayload {
            year: self.year_param(),
            month: self.month_param(),
            day: self.day_param(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(y: i32, m: u32, d: u32) -> ListingQuery {
        ListingQuery::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_params() {
        let q = query(2026, 1, 4);
        assert_eq!(q.year_param(), "115");
        assert_eq!(q.month_param(), "1");
        assert_eq!(q.day_param(), "04");
        assert_eq!(q.label(), "115/01/04");
    }

    #[test]
    fn test_serialized_payload() {
        let json = serde_json::to_value(query(2025, 12, 31)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"year": "114", "month": "12", "day": "31"})
        );
    }
}
