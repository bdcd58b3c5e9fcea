//! Feature flags (betas) enabled for the current session's cohort.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Flag that opts a cohort into every beta.
pub const FLAG_ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlags {
    names: HashSet<String>,
}

impl FeatureFlags {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list of flag names.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.names.contains(name) || self.names.contains(FLAG_ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_flag() {
        let flags = FeatureFlags::from_list("payWithWallet, newDot");
        assert!(flags.is_enabled("payWithWallet"));
        assert!(flags.is_enabled("newDot"));
        assert!(!flags.is_enabled("other"));
    }

    #[test]
    fn test_all_enables_everything() {
        let flags = FeatureFlags::new(["all"]);
        assert!(flags.is_enabled("payWithWallet"));
    }

    #[test]
    fn test_empty() {
        let flags = FeatureFlags::default();
        assert!(!flags.is_enabled("payWithWallet"));
        assert_eq!(FeatureFlags::from_list(""), FeatureFlags::default());
    }
}
