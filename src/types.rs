//! Report records consumed by the settlement core.
//!
//! A [`Report`] is a read-only snapshot owned by the external data layer. Field names on the
//! wire follow the data layer's JSON shape (`reportID`, `hasOutstandingIOU`, ...).

use serde::{Deserialize, Serialize};

/// Snapshot of an IOU report as delivered by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "reportID")]
    pub report_id: u64,
    /// Chat thread this IOU is attached to.
    #[serde(rename = "chatReportID")]
    pub chat_report_id: u64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Known phone numbers of the person who is owed money, in preference order.
    #[serde(rename = "submitterPhoneNumbers", default)]
    pub submitter_phone_numbers: Vec<String>,
    #[serde(
        rename = "submitterPayPalMeAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub submitter_paypal_handle: Option<String>,
    /// Amount owed, in minor currency units.
    pub total: u64,
    /// Identity of the person who currently owes money.
    #[serde(rename = "managerEmail")]
    pub manager_identity: String,
    #[serde(rename = "hasOutstandingIOU")]
    pub has_outstanding_balance: bool,
}

impl Report {
    /// Returns the PayPal handle when one is set and not blank.
    pub fn paypal_handle(&self) -> Option<&str> {
        self.submitter_paypal_handle
            .as_deref()
            .map(str::trim)
            .filter(|handle| !handle.is_empty())
    }
}

/// The signed-in user on whose behalf the controller acts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: String,
}

impl Session {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    /// Whether this session is the designated payer of `report`.
    pub fn is_payer_of(&self, report: &Report) -> bool {
        !self.identity.is_empty() && self.identity == report.manager_identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_data_layer_shape() {
        let json = r#"{
            "reportID": 1001,
            "chatReportID": 55,
            "currency": "USD",
            "submitterPhoneNumbers": ["+12025550123"],
            "submitterPayPalMeAddress": "alice",
            "total": 2500,
            "managerEmail": "bob@example.com",
            "hasOutstandingIOU": true
        }"#;

        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.report_id, 1001);
        assert_eq!(report.chat_report_id, 55);
        assert_eq!(report.submitter_phone_numbers, vec!["+12025550123"]);
        assert_eq!(report.paypal_handle(), Some("alice"));
        assert!(report.has_outstanding_balance);
    }

    #[test]
    fn test_missing_optional_fields() {
        let json = r#"{
            "reportID": 1,
            "chatReportID": 2,
            "currency": "EUR",
            "total": 10,
            "managerEmail": "bob@example.com",
            "hasOutstandingIOU": false
        }"#;

        let report: Report = serde_json::from_str(json).unwrap();
        assert!(report.submitter_phone_numbers.is_empty());
        assert!(report.paypal_handle().is_none());
    }

    #[test]
    fn test_blank_paypal_handle_is_absent() {
        let json = r#"{
            "reportID": 1,
            "chatReportID": 2,
            "currency": "USD",
            "submitterPayPalMeAddress": "   ",
            "total": 10,
            "managerEmail": "bob@example.com",
            "hasOutstandingIOU": true
        }"#;

        let report: Report = serde_json::from_str(json).unwrap();
        assert!(report.paypal_handle().is_none());
    }

    #[test]
    fn test_session_payer_match() {
        let report = Report {
            report_id: 1,
            chat_report_id: 2,
            currency: "USD".to_string(),
            submitter_phone_numbers: vec![],
            submitter_paypal_handle: None,
            total: 10,
            manager_identity: "bob@example.com".to_string(),
            has_outstanding_balance: true,
        };
        assert!(Session::new("bob@example.com").is_payer_of(&report));
        assert!(!Session::new("alice@example.com").is_payer_of(&report));
        assert!(!Session::new("").is_payer_of(&report));
    }
}
