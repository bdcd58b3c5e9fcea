//! Error types for the settlement core.
//!
//! Every error here is local and recoverable: the controller stays in a well-defined state
//! after returning any of them.

use serde::Serialize;
use std::fmt::{Display, Formatter};

use crate::payment_method::PaymentMethod;

/// Errors returned by [`crate::controller::SettlementController`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Payment method '{0}' is not currently available")]
    InvalidSelection(PaymentMethod),
    #[error("A settlement request is already in flight")]
    AlreadyInFlight,
    #[error("Settlement not allowed: {0}")]
    NotEligible(Ineligibility),
    #[error("Settlement request failed: {0}")]
    SettlementRequestFailure(String),
    #[error("Controller has been disposed")]
    Disposed,
}

/// Why the current session may not settle the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligibility {
    ReportNotLoaded,
    NoOutstandingBalance,
    NotThePayer,
}

impl Display for Ineligibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Ineligibility::ReportNotLoaded => write!(f, "report is still loading"),
            Ineligibility::NoOutstandingBalance => write!(f, "nothing is owed on this report"),
            Ineligibility::NotThePayer => write!(f, "only the payer can settle this report"),
        }
    }
}

/// Failure inside an [`crate::probe::AppAvailabilityProbe`]. Never surfaced past the probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Probe unavailable: {0}")]
    Unavailable(String),
}

/// Errors while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("env {0} not set")]
    Missing(&'static str),
    #[error("env {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
