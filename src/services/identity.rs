// src/services/identity.rs

//! Identity keys for announcements.
//!
//! The listing's date/time/company columns repeat across amendments, so the
//! dedup unit is built from the detail lookup parameters instead:
//! `enterDate|marketKind|companyId|serialNumber`.

use crate::error::{AppError, Result};
use crate::models::{DetailParams, IdentityKey};

/// Separator between key components.
pub const KEY_DELIMITER: &str = "|";

/// The four identity fields of a detail parameter set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityFields {
    pub enter_date: Option<String>,
    pub market_kind: Option<String>,
    pub company_id: Option<String>,
    pub serial_number: Option<String>,
}

impl IdentityFields {
    pub fn from_params(params: &DetailParams) -> Self {
        Self {
            enter_date: params.enter_date(),
            market_kind: params.market_kind(),
            company_id: params.company_id(),
            serial_number: params.serial_number(),
        }
    }

    /// Names of the fields that are absent, in key order.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (DetailParams::ENTER_DATE, &self.enter_date),
            (DetailParams::MARKET_KIND, &self.market_kind),
            (DetailParams::COMPANY_ID, &self.company_id),
            (DetailParams::SERIAL_NUMBER, &self.serial_number),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Error out unless every field is present.
    pub fn require_complete(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::shape(format!(
                "detail parameters missing identity fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Join the fields into a key. Absent fields become empty tokens.
    pub fn to_key(&self) -> IdentityKey {
        let parts = [
            &self.enter_date,
            &self.market_kind,
            &self.company_id,
            &self.serial_number,
        ]
        .map(|v| v.as_deref().unwrap_or(""));
        IdentityKey::new(parts.join(KEY_DELIMITER))
    }
}

/// Build the identity key of a parameter set.
pub fn build_key(params: &DetailParams) -> IdentityKey {
    IdentityFields::from_params(params).to_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn params(value: Value) -> DetailParams {
        serde_json::from_value(value).unwrap()
    }

    fn full() -> Value {
        json!({
            "enterDate": "1140102",
            "marketKind": "sii",
            "companyId": "3004",
            "serialNumber": 1,
            "step": 2
        })
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(build_key(&params(full())).as_str(), "1140102|sii|3004|1");
    }

    #[test]
    fn test_key_ignores_other_fields_and_order() {
        let reordered = params(json!({
            "serialNumber": 1,
            "companyId": "3004",
            "other": "x",
            "marketKind": "sii",
            "enterDate": "1140102"
        }));
        assert_eq!(build_key(&reordered), build_key(&params(full())));
    }

    #[test]
    fn test_each_field_changes_key() {
        let base = build_key(&params(full()));
        for (field, value) in [
            ("enterDate", json!("1140103")),
            ("marketKind", json!("otc")),
            ("companyId", json!("3005")),
            ("serialNumber", json!(2)),
        ] {
            let mut changed = full();
            changed[field] = value;
            assert_ne!(build_key(&params(changed)), base, "field {field}");
        }
    }

    #[test]
    fn test_missing_fields_are_empty_tokens() {
        let partial = params(json!({"companyId": "3004"}));
        assert_eq!(build_key(&partial).as_str(), "||3004|");
        assert_eq!(build_key(&DetailParams::default()).as_str(), "|||");
    }

    #[test]
    fn test_missing_and_require_complete() {
        let fields = IdentityFields::from_params(&params(json!({
            "enterDate": "1140102",
            "companyId": "3004"
        })));
        assert_eq!(fields.missing(), vec!["marketKind", "serialNumber"]);
        assert!(fields.require_complete().is_err());

        let complete = IdentityFields::from_params(&params(full()));
        assert!(complete.require_complete().is_ok());
    }
}
