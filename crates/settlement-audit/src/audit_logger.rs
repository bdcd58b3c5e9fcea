use crate::config::{AuditConfig, LogFormat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One settle attempt as seen by the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub report_id: u64,
    pub chat_report_id: u64,
    pub payment_method: String,
    pub amount: u64,
    pub currency: String,
    /// Rejection reason or service error, if any.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Requested,
    Succeeded,
    Failed,
    Rejected,
}

impl SettlementEvent {
    pub fn new(
        event_type: EventType,
        report_id: u64,
        chat_report_id: u64,
        payment_method: impl Into<String>,
        amount: u64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            report_id,
            chat_report_id,
            payment_method: payment_method.into(),
            amount,
            currency: currency.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub struct AuditLogger {
    config: AuditConfig,
}

impl AuditLogger {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Logs the event if the configuration asks for it. Returns whether anything was written.
    pub fn log_event(&self, event: &SettlementEvent) -> bool {
        let Some(line) = self.render(event) else {
            return false;
        };

        match event.event_type {
            EventType::Failed => {
                tracing::error!(target: "settlement_audit", "{}", line)
            }
            EventType::Rejected => {
                tracing::warn!(target: "settlement_audit", "{}", line)
            }
            EventType::Requested | EventType::Succeeded => {
                tracing::info!(target: "settlement_audit", "{}", line)
            }
        }
        true
    }

    /// Formats the event the way [`AuditLogger::log_event`] would write it.
    pub fn render(&self, event: &SettlementEvent) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        if event.event_type == EventType::Rejected && !self.config.include_rejections {
            return None;
        }

        let line = match self.config.format {
            LogFormat::Json => serde_json::to_string(event)
                .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize: {}"}}"#, e)),
            LogFormat::Text => Self::format_text(event),
        };
        Some(line)
    }

    fn format_text(event: &SettlementEvent) -> String {
        let mut message = format!(
            "[{}] {:?} - report {} (chat {}) | Method: {} | Amount: {} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            event.report_id,
            event.chat_report_id,
            event.payment_method,
            event.amount,
            event.currency
        );
        if let Some(detail) = &event.detail {
            message.push_str(" | ");
            message.push_str(detail);
        }
        message
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(event_type: EventType) -> SettlementEvent {
        SettlementEvent::new(event_type, 42, 7, "elsewhere", 1250, "USD")
    }

    #[test]
    fn test_json_render_contains_fields() {
        let logger = AuditLogger::default();
        let line = logger.render(&sample(EventType::Requested)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["report_id"], 42);
        assert_eq!(value["event_type"], "Requested");
        assert_eq!(value["payment_method"], "elsewhere");
    }

    #[test]
    fn test_text_render_includes_detail() {
        let logger = AuditLogger::new(AuditConfig {
            format: LogFormat::Text,
            ..AuditConfig::default()
        });
        let event = sample(EventType::Failed).with_detail("backend unavailable");
        let line = logger.render(&event).unwrap();
        assert!(line.contains("Failed - report 42 (chat 7)"));
        assert!(line.contains("Amount: 1250 USD"));
        assert!(line.ends_with("| backend unavailable"));
    }

    #[test]
    fn test_disabled_logger_skips_everything() {
        let logger = AuditLogger::new(AuditConfig {
            enabled: false,
            ..AuditConfig::default()
        });
        assert!(!logger.log_event(&sample(EventType::Succeeded)));
    }

    #[test]
    fn test_rejections_can_be_filtered() {
        let logger = AuditLogger::new(AuditConfig {
            include_rejections: false,
            ..AuditConfig::default()
        });
        assert!(logger.render(&sample(EventType::Rejected)).is_none());
        assert!(logger.render(&sample(EventType::Requested)).is_some());
    }
}
