//! Audit trail sink. Delivery is fire-and-forget: a failing sink is logged
//! and never undoes the operation that produced the event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display};
use tracing::info;
use uuid::Uuid;

use crate::model::employee::EmployeeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    LeaveSubmitted,
    LeaveApproved,
    LeaveRejected,
    LeaveCancelled,
    BalanceAllocated,
    BalanceAdjusted,
    AttendanceMarked,
    AttendanceCorrected,
    HolidayCreated,
    HolidayDeleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub kind: AuditKind,
    /// `None` for system actions
    pub actor: Option<EmployeeId>,
    /// Affected record type, e.g. `LeaveRequest`
    pub subject: &'static str,
    pub object_id: u64,
    pub metadata: Value,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        kind: AuditKind,
        actor: Option<EmployeeId>,
        subject: &'static str,
        object_id: u64,
        metadata: Value,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            actor,
            subject,
            object_id,
            metadata,
            at,
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record_event(&self, event: &AuditEvent) -> anyhow::Result<()>;
}

/// Writes audit events to the application log.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record_event(&self, event: &AuditEvent) -> anyhow::Result<()> {
        info!(
            audit_id = %event.id,
            kind = %event.kind,
            actor = ?event.actor,
            subject = event.subject,
            object_id = event.object_id,
            metadata = %event.metadata,
            "audit"
        );
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryAuditSink {
    pub events: std::sync::Mutex<Vec<AuditEvent>>,
}

#[cfg(test)]
impl MemoryAuditSink {
    pub fn kinds(&self) -> Vec<AuditKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

#[cfg(test)]
impl AuditSink for MemoryAuditSink {
    fn record_event(&self, event: &AuditEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
pub struct FailingAuditSink;

#[cfg(test)]
impl AuditSink for FailingAuditSink {
    fn record_event(&self, _event: &AuditEvent) -> anyhow::Result<()> {
        anyhow::bail!("audit store unavailable")
    }
}
