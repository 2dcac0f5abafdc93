//! Company-register status as supplied by an external lookup, and the code lists used to
//! present it. Display texts follow the register's own Swedish wording.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const DEREGISTRATION_REASONS: &[(&str, &str)] = &[
    ("AKEJH", "Aktiekapitalet inte höjts"),
    ("ARSEED", "Årsredovisning saknas"),
    ("AVREG", "Avregistrerad"),
    ("BABAKEJH", "Ombildat till bankaktiebolag eller aktiekapitalet inte höjts"),
    ("DELAV", "Delning"),
    ("DOM", "Beslut av domstol"),
    ("FUAV", "Fusion"),
    ("GROMAV", "Gränsöverskridande ombildning"),
    ("KKAV", "Konkurs"),
    ("LIAV", "Likvidation"),
    ("NYINN", "Ny innehavare"),
    ("OMAV", "Ombildning"),
    ("OMBAB", "Ombildat till bankaktiebolag"),
    ("OVERK", "Overksamhet"),
    ("UTLKKLI", "Det utländska företagets likvidation eller konkurs"),
    ("VERKUPP", "Verksamheten har upphört"),
    ("VDSAK", "Verkställande direktör saknas"),
];

const PENDING_PROCEEDINGS: &[(&str, &str)] = &[
    ("AC", "Ackordsförhandling"),
    ("DEOL", "Överlåtande vid delning"),
    ("DEOT", "Övertagande vid delning"),
    ("FR", "Företagsrekonstruktion"),
    ("FUOL", "Överlåtande i fusion"),
    ("FUOT", "Övertagande i fusion"),
    ("GROM", "Gränsöverskridande ombildning"),
    ("KK", "Konkurs"),
    ("LI", "Likvidation"),
    ("OM", "Ombildning"),
    ("RES", "Resolution"),
];

pub const BANKRUPTCY_CODE: &str = "KK";
pub const LIQUIDATION_CODE: &str = "LI";

fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(code.trim()))
        .map(|(_, text)| *text)
}

/// Display text for a deregistration reason code. Unknown codes are returned as given.
pub fn deregistration_reason_text(code: &str) -> String {
    lookup(DEREGISTRATION_REASONS, code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

/// Display text for a pending winding-up or restructuring code. Unknown codes are returned as given.
pub fn proceeding_text(code: &str) -> String {
    lookup(PENDING_PROCEEDINGS, code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Proceeding {
    pub code: String,
    pub date: Option<NaiveDate>,
}

impl Proceeding {
    pub fn new(code: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            code: code.into(),
            date,
        }
    }

    pub fn text(&self) -> String {
        proceeding_text(&self.code)
    }
}

/// Register record for one organisation. Every field is optional; a missing field never
/// triggers a rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct RegistrationStatus {
    pub registration_date: Option<NaiveDate>,

    pub deregistration_date: Option<NaiveDate>,

    #[schemars(description = "Deregistration reason code, e.g. 'KKAV'")]
    pub deregistration_reason: Option<String>,

    pub pending_bankruptcy: Option<Proceeding>,

    pub pending_liquidation: Option<Proceeding>,

    #[schemars(description = "Whether the organisation has opted out of direct advertising")]
    pub advertising_block: Option<bool>,

    #[schemars(description = "False when the register marks the organisation as not conducting business")]
    pub active_organisation: Option<bool>,
}

impl RegistrationStatus {
    /// Sorts a register's list of pending proceedings into the bankruptcy and liquidation
    /// slots. Other proceedings are ignored; the last occurrence of a code wins.
    pub fn with_proceedings(mut self, proceedings: impl IntoIterator<Item = Proceeding>) -> Self {
        for proceeding in proceedings {
            if proceeding.code.eq_ignore_ascii_case(BANKRUPTCY_CODE) {
                self.pending_bankruptcy = Some(proceeding);
            } else if proceeding.code.eq_ignore_ascii_case(LIQUIDATION_CODE) {
                self.pending_liquidation = Some(proceeding);
            }
        }
        self
    }

    /// Either a deregistration date or a reason code marks the organisation as deregistered.
    pub fn is_deregistered(&self) -> bool {
        self.deregistration_date.is_some()
            || self
                .deregistration_reason
                .as_deref()
                .is_some_and(|code| !code.trim().is_empty())
    }

    pub fn deregistration_reason_text(&self) -> Option<String> {
        self.deregistration_reason
            .as_deref()
            .map(deregistration_reason_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_lookup_with_fallback() {
        assert_eq!(deregistration_reason_text("KKAV"), "Konkurs");
        assert_eq!(deregistration_reason_text("fuav"), "Fusion");
        assert_eq!(deregistration_reason_text("XYZ"), "XYZ");
        assert_eq!(proceeding_text("LI"), "Likvidation");
        assert_eq!(proceeding_text("ZZ"), "ZZ");
    }

    #[test]
    fn test_with_proceedings_picks_bankruptcy_and_liquidation() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1);
        let status = RegistrationStatus::default().with_proceedings(vec![
            Proceeding::new("FR", None),
            Proceeding::new("KK", date),
        ]);
        assert_eq!(status.pending_bankruptcy.as_ref().map(Proceeding::text), Some("Konkurs".to_string()));
        assert_eq!(status.pending_bankruptcy.and_then(|p| p.date), date);
        assert!(status.pending_liquidation.is_none());
    }

    #[test]
    fn test_deserializes_partial_record() {
        let status: RegistrationStatus = serde_json::from_str(
            r#"{"deregistration_date": "2023-06-30", "deregistration_reason": "OVERK"}"#,
        )
        .unwrap();
        assert!(status.is_deregistered());
        assert_eq!(status.deregistration_reason_text().as_deref(), Some("Overksamhet"));
        assert_eq!(status.advertising_block, None);
    }

    #[test]
    fn test_reason_without_date_is_deregistered() {
        let status = RegistrationStatus {
            deregistration_reason: Some("KKAV".to_string()),
            ..Default::default()
        };
        assert!(status.is_deregistered());

        let blank = RegistrationStatus {
            deregistration_reason: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!blank.is_deregistered());
        assert!(!RegistrationStatus::default().is_deregistered());
    }
}
