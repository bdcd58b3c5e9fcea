//! Payment method resolution and settlement orchestration for IOU reports.
//!
//! Given a report, the session's feature flags and a probe for installed payment apps,
//! [`resolver::PaymentMethodResolver`] works out which settlement methods the payer may use
//! and [`controller::SettlementController`] holds the selection and issues the single
//! settlement request when the payer confirms.
//!
//! ```rust,ignore
//! use iou_settle::controller::SettlementController;
//! use iou_settle::probe::InstalledApps;
//! use iou_settle::resolver::PaymentMethodResolver;
//!
//! let controller = SettlementController::new(session, Arc::new(PaymentMethodResolver::default()),
//!     Arc::new(InstalledApps::from_list("venmo")), service);
//! controller.on_report_ready(report, &flags);
//! controller.wait_for_resolutions().await;
//! let receipt = controller.settle().await?;
//! ```

pub mod controller;
pub mod error;
pub mod flags;
pub mod from_env;
pub mod payment_method;
pub mod phone;
pub mod probe;
pub mod resolver;
pub mod settlement;
pub mod settlement_http;
pub mod types;
