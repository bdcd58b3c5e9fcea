pub mod audit_logger;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use audit_logger::{AuditLogger, EventType, SettlementEvent};
pub use config::{AuditConfig, LogFormat};
pub use error::{AuditError, Result};
