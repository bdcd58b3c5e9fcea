use std::env;
use url::Url;

use crate::error::ConfigError;
use crate::flags::FeatureFlags;
use crate::probe::InstalledApps;
use crate::resolver::ResolverConfig;
use crate::types::Session;

pub const ENV_PEER_APP_ID: &str = "IOU_PEER_APP_ID";
pub const ENV_PEER_APP_CURRENCY: &str = "IOU_PEER_APP_CURRENCY";
pub const ENV_WALLET_CURRENCY: &str = "IOU_WALLET_CURRENCY";
pub const ENV_WALLET_FLAG: &str = "IOU_WALLET_FLAG";

pub const ENV_SESSION_IDENTITY: &str = "IOU_SESSION_IDENTITY";
pub const ENV_FLAGS: &str = "IOU_FLAGS";
pub const ENV_INSTALLED_APPS: &str = "IOU_INSTALLED_APPS";
pub const ENV_SETTLEMENT_URL: &str = "IOU_SETTLEMENT_URL";

pub const DEFAULT_SETTLEMENT_URL: &str = "http://127.0.0.1:8080/iou/settle";

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn currency_var(name: &'static str, default: String) -> Result<String, ConfigError> {
    let Some(value) = non_empty_var(name) else {
        return Ok(default);
    };
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: format!("'{value}' is not an ISO 4217 currency code"),
        })
    }
}

impl ResolverConfig {
    /// Reads overrides from the environment, falling back to [`ResolverConfig::default`]:
    /// - `IOU_PEER_APP_ID`: application id passed to the availability probe
    /// - `IOU_PEER_APP_CURRENCY`: currency the peer app can settle
    /// - `IOU_WALLET_CURRENCY`: currency the built-in wallet can settle
    /// - `IOU_WALLET_FLAG`: feature flag gating the wallet
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            peer_app_id: non_empty_var(ENV_PEER_APP_ID).unwrap_or(defaults.peer_app_id),
            peer_app_currency: currency_var(ENV_PEER_APP_CURRENCY, defaults.peer_app_currency)?,
            wallet_currency: currency_var(ENV_WALLET_CURRENCY, defaults.wallet_currency)?,
            wallet_flag: non_empty_var(ENV_WALLET_FLAG).unwrap_or(defaults.wallet_flag),
        })
    }
}

/// Session identity from `IOU_SESSION_IDENTITY`.
pub fn session_from_env() -> Result<Session, ConfigError> {
    non_empty_var(ENV_SESSION_IDENTITY)
        .map(Session::new)
        .ok_or(ConfigError::Missing(ENV_SESSION_IDENTITY))
}

/// Comma-separated flag names from `IOU_FLAGS`; empty when unset.
pub fn flags_from_env() -> FeatureFlags {
    FeatureFlags::from_list(&env::var(ENV_FLAGS).unwrap_or_default())
}

/// Comma-separated application ids from `IOU_INSTALLED_APPS`; empty when unset.
pub fn installed_apps_from_env() -> InstalledApps {
    InstalledApps::from_list(&env::var(ENV_INSTALLED_APPS).unwrap_or_default())
}

/// Settlement endpoint from `IOU_SETTLEMENT_URL`, or [`DEFAULT_SETTLEMENT_URL`].
pub fn settlement_url_from_env() -> Result<Url, ConfigError> {
    let raw = non_empty_var(ENV_SETTLEMENT_URL).unwrap_or_else(|| DEFAULT_SETTLEMENT_URL.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        name: ENV_SETTLEMENT_URL,
        reason: e.to_string(),
    })
}
