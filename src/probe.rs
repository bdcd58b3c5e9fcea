//! Device capability checks for external payment applications.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::ProbeError;

/// Asks whether an external payment application is installed on this device.
///
/// Probes may be slow, may fail, or may never resolve. Callers go through
/// [`AppAvailabilityProbe::is_available`], which treats any failure as "not installed".
#[async_trait]
pub trait AppAvailabilityProbe: Send + Sync {
    /// Raw probe. Errors stay internal to the probe layer.
    async fn probe(&self, app_id: &str) -> Result<bool, ProbeError>;

    /// Whether `app_id` is available, with failures mapped to `false`.
    async fn is_available(&self, app_id: &str) -> bool {
        match self.probe(app_id).await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!("App availability probe for '{}' failed: {}", app_id, e);
                false
            }
        }
    }
}

/// Probe backed by a fixed list of installed application ids.
#[derive(Debug, Clone, Default)]
pub struct InstalledApps {
    app_ids: HashSet<String>,
}

impl InstalledApps {
    pub fn new<I, S>(app_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            app_ids: app_ids
                .into_iter()
                .map(|id| id.into().trim().to_lowercase())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list such as `venmo, cashapp`.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn len(&self) -> usize {
        self.app_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.app_ids.is_empty()
    }
}

#[async_trait]
impl AppAvailabilityProbe for InstalledApps {
    async fn probe(&self, app_id: &str) -> Result<bool, ProbeError> {
        Ok(self.app_ids.contains(&app_id.trim().to_lowercase()))
    }
}
