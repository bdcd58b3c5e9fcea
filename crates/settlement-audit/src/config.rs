use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audit trail settings, usually read from `config/settlement_audit.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub format: LogFormat,
    /// Also record settle attempts refused before reaching the settlement service.
    #[serde(default = "default_include_rejections")]
    pub include_rejections: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_include_rejections() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl AuditConfig {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(AuditError::TomlError)
    }

    pub fn from_env() -> Result<Self> {
        let default_paths = [
            "config/settlement_audit.toml",
            "settlement_audit.toml",
            ".settlement_audit.toml",
        ];

        for path in &default_paths {
            if std::path::Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: LogFormat::Json,
            include_rejections: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AuditConfig::from_toml("format = \"text\"").unwrap();
        assert!(config.enabled);
        assert!(config.include_rejections);
        assert_eq!(config.format, LogFormat::Text);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = AuditConfig::from_toml("").unwrap();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_format_rejected() {
        let result = AuditConfig::from_toml("format = \"xml\"");
        assert!(matches!(result, Err(AuditError::TomlError(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!(
            "settlement_audit_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "enabled = false\ninclude_rejections = false\n").unwrap();

        let config = AuditConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(!config.enabled);
        assert!(!config.include_rejections);
    }

    #[test]
    fn test_missing_file() {
        let result = AuditConfig::from_file("/nonexistent/settlement_audit.toml");
        match result {
            Err(AuditError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected IoError, got {:?}", other),
        }
    }
}
