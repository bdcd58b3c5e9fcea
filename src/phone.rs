//! Phone number eligibility for phone-addressed payment networks.

use once_cell::sync::Lazy;
use regex::Regex;

/// Decides whether a phone number can receive payments on a given network.
///
/// Implementations are total: malformed input yields `false`, never an error.
pub trait PhoneValidator: Send + Sync {
    fn is_eligible_phone_number(&self, candidate: &str) -> bool;
}

/// North American Numbering Plan number, optionally prefixed with country code 1.
///
/// Groups are 3-3-4. A single space, dash or dot may separate groups, and parentheses may only
/// wrap the area code. Area code and exchange may not start with 0 or 1.
static US_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\+?1[ .-]?)?(?:\(([2-9][0-9]{2})\)|([2-9][0-9]{2}))[ .-]?[2-9][0-9]{2}[ .-]?[0-9]{4}$",
    )
    .expect("valid US phone regex")
});

/// Only accepts US numbers.
///
/// Anything outside the 3-3-4 layout (letters, extensions, other country codes, SMS login
/// suffixes, separators inside a group) rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsPhoneValidator;

impl PhoneValidator for UsPhoneValidator {
    fn is_eligible_phone_number(&self, candidate: &str) -> bool {
        let Some(captures) = US_PHONE.captures(candidate.trim()) else {
            return false;
        };
        match captures.get(1).or_else(|| captures.get(2)) {
            // N11 codes (211, 911, ...) are service codes, not area codes.
            Some(area) => !area.as_str().ends_with("11"),
            None => false,
        }
    }
}
