//! Payment method eligibility.
//!
//! [`PaymentMethodResolver`] turns a report, the session's feature flags and the result of
//! an app probe into independent eligibility facts, and [`PaymentMethodResolver::merge`]
//! folds those facts into one [`PaymentMethodSet`]. The merge is a pure function of the
//! facts, so the controller can rerun it whenever any fact arrives, in any order.

use crate::flags::FeatureFlags;
use crate::payment_method::{PaymentMethod, PaymentMethodSet};
use crate::phone::{PhoneValidator, UsPhoneValidator};
use crate::probe::AppAvailabilityProbe;
use crate::types::Report;

pub const DEFAULT_PEER_APP_ID: &str = "venmo";
pub const DEFAULT_PEER_APP_CURRENCY: &str = "USD";
pub const DEFAULT_WALLET_CURRENCY: &str = "USD";
pub const DEFAULT_WALLET_FLAG: &str = "payWithWallet";

/// Network-specific constants used by eligibility checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Application id handed to the [`AppAvailabilityProbe`].
    pub peer_app_id: String,
    /// The only currency the peer app can move.
    pub peer_app_currency: String,
    /// The only currency the built-in wallet can settle.
    pub wallet_currency: String,
    /// Feature flag gating the built-in wallet.
    pub wallet_flag: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            peer_app_id: DEFAULT_PEER_APP_ID.to_string(),
            peer_app_currency: DEFAULT_PEER_APP_CURRENCY.to_string(),
            wallet_currency: DEFAULT_WALLET_CURRENCY.to_string(),
            wallet_flag: DEFAULT_WALLET_FLAG.to_string(),
        }
    }
}

pub struct PaymentMethodResolver {
    config: ResolverConfig,
    phone_validator: Box<dyn PhoneValidator>,
}

impl PaymentMethodResolver {
    /// Resolver using [`UsPhoneValidator`] for peer-app phone checks.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_phone_validator(config, UsPhoneValidator)
    }

    pub fn with_phone_validator(
        config: ResolverConfig,
        phone_validator: impl PhoneValidator + 'static,
    ) -> Self {
        Self {
            config,
            phone_validator: Box::new(phone_validator),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Methods available without any external check: `Manual`, plus `PayPalLike` when the
    /// submitter has a handle.
    pub fn resolve_baseline(&self, report: &Report) -> PaymentMethodSet {
        let paypal = report.paypal_handle().map(|_| PaymentMethod::PayPalLike);
        PaymentMethodSet::from_eligible(paypal)
    }

    /// The phone number a peer-app payment would be addressed to.
    ///
    /// `None` unless the report is in the peer app's currency and at least one submitter
    /// number passes the phone validator; the first passing number wins.
    pub fn peer_app_phone_number<'a>(&self, report: &'a Report) -> Option<&'a str> {
        if report.currency != self.config.peer_app_currency {
            return None;
        }
        report
            .submitter_phone_numbers
            .iter()
            .map(String::as_str)
            .find(|candidate| self.phone_validator.is_eligible_phone_number(candidate))
    }

    /// `PeerApp` if the report qualifies and the peer app is installed.
    ///
    /// The probe is only consulted once the cheap checks pass.
    pub async fn resolve_peer_app(
        &self,
        report: &Report,
        probe: &dyn AppAvailabilityProbe,
    ) -> Option<PaymentMethod> {
        self.peer_app_phone_number(report)?;
        if probe.is_available(&self.config.peer_app_id).await {
            Some(PaymentMethod::PeerApp)
        } else {
            tracing::debug!(
                "Peer app '{}' not available for report {}",
                self.config.peer_app_id,
                report.report_id
            );
            None
        }
    }

    /// `BuiltInWallet` iff the report is in the wallet currency and the wallet flag is on.
    pub fn resolve_wallet(&self, report: &Report, flags: &FeatureFlags) -> Option<PaymentMethod> {
        if report.currency == self.config.wallet_currency
            && flags.is_enabled(&self.config.wallet_flag)
        {
            Some(PaymentMethod::BuiltInWallet)
        } else {
            None
        }
    }

    /// Folds independently resolved facts into the final set.
    ///
    /// Wallet goes first, the peer app after the baseline methods, `Manual` last.
    pub fn merge(
        baseline: &PaymentMethodSet,
        wallet: Option<PaymentMethod>,
        peer_app: Option<PaymentMethod>,
    ) -> PaymentMethodSet {
        PaymentMethodSet::from_eligible(baseline.iter().chain(wallet).chain(peer_app))
    }

    /// Selection to use when the payer has not picked one.
    ///
    /// The wallet always wins when present. Otherwise a single non-manual method is preferred
    /// over `Manual`; with several to choose from the payer has to pick, so `Manual` stays.
    pub fn default_selection(methods: &PaymentMethodSet) -> PaymentMethod {
        if methods.contains(PaymentMethod::BuiltInWallet) {
            return PaymentMethod::BuiltInWallet;
        }
        let mut non_manual = methods.iter().filter(|m| *m != PaymentMethod::Manual);
        match (non_manual.next(), non_manual.next()) {
            (Some(only), None) => only,
            _ => PaymentMethod::Manual,
        }
    }
}

impl Default for PaymentMethodResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}
