//! Interface to the remote settlement service.
//!
//! The controller issues one [`SettlementRequest`] per confirmed settle action through a
//! [`SettlementService`]; what the service does with it (moving money, updating balances,
//! reporting errors to the user) is its own business.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::Arc;

use crate::payment_method::PaymentMethod;
use crate::types::Report;

/// Settlement record sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    #[serde(rename = "reportID")]
    pub report_id: u64,
    #[serde(rename = "chatReportID")]
    pub chat_report_id: u64,
    pub payment_method_type: PaymentMethod,
    /// Minor currency units.
    pub amount: u64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_paypal_me_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_phone_number: Option<String>,
}

impl SettlementRequest {
    /// Builds the request for `report` paid with `method`.
    ///
    /// Only the address the method needs is attached: the PayPal handle for `PayPalLike`
    /// and `peer_app_phone` for `PeerApp`.
    pub fn for_report(report: &Report, method: PaymentMethod, peer_app_phone: Option<&str>) -> Self {
        let submitter_paypal_me_address = match method {
            PaymentMethod::PayPalLike => report.paypal_handle().map(str::to_string),
            _ => None,
        };
        let submitter_phone_number = match method {
            PaymentMethod::PeerApp => peer_app_phone.map(str::to_string),
            _ => None,
        };
        Self {
            report_id: report.report_id,
            chat_report_id: report.chat_report_id,
            payment_method_type: method,
            amount: report.total,
            currency: report.currency.clone(),
            submitter_paypal_me_address,
            submitter_phone_number,
        }
    }
}

/// Acknowledgement from the settlement service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    #[serde(rename = "reportID")]
    pub report_id: u64,
    pub payment_method_type: PaymentMethod,
    /// Service-side reference, when the service hands one back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Asynchronous interface to whatever actually settles an IOU.
///
/// Errors are opaque to the controller beyond pass/fail; the service reports details to the
/// user through its own channel.
pub trait SettlementService {
    /// The error type returned by this service.
    type Error: Debug + Display;

    /// Submits exactly one settlement. Implementations must not retry on their own.
    fn settle(
        &self,
        request: &SettlementRequest,
    ) -> impl Future<Output = Result<SettlementReceipt, Self::Error>> + Send;
}

impl<T: SettlementService> SettlementService for Arc<T> {
    type Error = T::Error;

    fn settle(
        &self,
        request: &SettlementRequest,
    ) -> impl Future<Output = Result<SettlementReceipt, Self::Error>> + Send {
        self.as_ref().settle(request)
    }
}
