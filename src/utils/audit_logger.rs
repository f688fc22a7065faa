// Audit logging for authentication and link events
// Entries go to the `audit` tracing target as one JSON object per line
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    LoginSucceeded,
    LoginFailed,
    SessionOriginMismatch,
    Logout,
    AuthorizationDenied,
    ProfileUpdated,
    UserCreated,
    LinkCreated,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub identity: Option<String>,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, resource_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            identity: None,
            resource_id: None,
            resource_type: resource_type.to_string(),
            details: None,
            ip_address: None,
            timestamp: Utc::now(),
        }
    }

    pub fn identity(mut self, identity: Option<&str>) -> Self {
        self.identity = identity.map(String::from);
        self
    }

    pub fn resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn origin(mut self, ip: IpAddr) -> Self {
        self.ip_address = Some(ip.to_string());
        self
    }
}

pub struct AuditLogger;

impl AuditLogger {
    /// Emit an audit entry. Failures (denials, mismatches) log at warn.
    pub fn record(entry: AuditEntry) {
        let json_log = serde_json::to_string(&entry).unwrap_or_else(|e| {
            warn!("Failed to serialize audit log: {}", e);
            format!("{:?}", entry)
        });

        match entry.action {
            AuditAction::LoginFailed
            | AuditAction::SessionOriginMismatch
            | AuditAction::AuthorizationDenied => warn!(target: "audit", "{}", json_log),
            _ => info!(target: "audit", "{}", json_log),
        }
    }
}
