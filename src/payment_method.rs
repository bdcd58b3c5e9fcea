//! Settlement methods and the ordered set offered to the payer.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Ways an IOU can be settled.
///
/// Variants are declared in display order; [`PaymentMethodSet`] relies on it.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// In-product wallet balance, gated by a feature flag.
    #[serde(rename = "wallet")]
    BuiltInWallet,
    /// Handle-based PayPal.me style transfer to the submitter.
    #[serde(rename = "paypal-me")]
    PayPalLike,
    /// Third-party person-to-person app addressed by phone number.
    #[serde(rename = "peer-app")]
    PeerApp,
    /// Settled outside the system.
    #[serde(rename = "elsewhere")]
    Manual,
}

impl PaymentMethod {
    /// Return all known [`PaymentMethod`] variants, in display order.
    pub fn variants() -> &'static [PaymentMethod] {
        &[
            PaymentMethod::BuiltInWallet,
            PaymentMethod::PayPalLike,
            PaymentMethod::PeerApp,
            PaymentMethod::Manual,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BuiltInWallet => "wallet",
            PaymentMethod::PayPalLike => "paypal-me",
            PaymentMethod::PeerApp => "peer-app",
            PaymentMethod::Manual => "elsewhere",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown payment method '{0}'")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::variants()
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

/// Ordered, duplicate-free list of payment methods.
///
/// Invariants: `Manual` is always present and always last, and `BuiltInWallet`, when present,
/// is always first. The only way to build one is [`PaymentMethodSet::from_eligible`], which
/// canonicalizes whatever it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PaymentMethodSet(Vec<PaymentMethod>);

impl PaymentMethodSet {
    /// Just `[Manual]`.
    pub fn manual_only() -> Self {
        Self(vec![PaymentMethod::Manual])
    }

    /// Builds the canonical set from any collection of eligible methods.
    ///
    /// Input order and repetition do not matter, so merging partial results in any arrival
    /// order yields the same set.
    pub fn from_eligible<I>(methods: I) -> Self
    where
        I: IntoIterator<Item = PaymentMethod>,
    {
        let mut methods: Vec<PaymentMethod> = methods
            .into_iter()
            .chain(std::iter::once(PaymentMethod::Manual))
            .collect();
        methods.sort_unstable();
        methods.dedup();
        Self(methods)
    }

    pub fn contains(&self, method: PaymentMethod) -> bool {
        self.0.contains(&method)
    }

    pub fn first(&self) -> PaymentMethod {
        self.0.first().copied().unwrap_or(PaymentMethod::Manual)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; `Manual` is always present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PaymentMethod> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[PaymentMethod] {
        &self.0
    }
}

impl Default for PaymentMethodSet {
    fn default() -> Self {
        Self::manual_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaymentMethod::*;

    #[test]
    fn test_manual_always_last() {
        let set = PaymentMethodSet::from_eligible([Manual, PeerApp, BuiltInWallet]);
        assert_eq!(set.as_slice(), &[BuiltInWallet, PeerApp, Manual]);
    }

    #[test]
    fn test_empty_input_is_manual_only() {
        let set = PaymentMethodSet::from_eligible([]);
        assert_eq!(set, PaymentMethodSet::manual_only());
        assert_eq!(set.first(), Manual);
    }

    #[test]
    fn test_duplicates_suppressed() {
        let set = PaymentMethodSet::from_eligible([PeerApp, PeerApp, Manual, Manual, PayPalLike]);
        assert_eq!(set.as_slice(), &[PayPalLike, PeerApp, Manual]);
    }

    #[test]
    fn test_every_subset_is_canonical() {
        // All 8 combinations of the optional methods, fed in reverse order.
        for mask in 0u8..8 {
            let picked: Vec<PaymentMethod> = [BuiltInWallet, PayPalLike, PeerApp]
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << *i) != 0)
                .map(|(_, m)| m)
                .rev()
                .collect();
            let set = PaymentMethodSet::from_eligible(picked.clone());

            assert_eq!(set.iter().filter(|m| *m == Manual).count(), 1);
            assert_eq!(set.as_slice().last(), Some(&Manual));
            if picked.contains(&BuiltInWallet) {
                assert_eq!(set.first(), BuiltInWallet);
            }
            assert_eq!(set.len(), picked.len() + 1);
        }
    }

    #[test]
    fn test_parse_round_trip_names() {
        for method in PaymentMethod::variants() {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), *method);
        }
        assert!("venmo".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_serialized_tags() {
        let set = PaymentMethodSet::from_eligible([BuiltInWallet, PayPalLike]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["wallet","paypal-me","elsewhere"]"#);
    }
}
