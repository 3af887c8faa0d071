//! Write-through persistence of ledger changes.
//!
//! The in-process books answer every read. A mutation runs under a
//! per-employee async gate: the core operation updates the book, the rows it
//! touched go through a [`LedgerWriter`] in one transaction, and a failed
//! write puts the book back as it was before the gate is released.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::lock::Mutex;
use tracing::{debug, error};

use crate::domain::service::HrmService;
use crate::error::{HrmError, HrmResult, StorageError};
use crate::model::attendance::Attendance;
use crate::model::employee::EmployeeId;
use crate::model::holiday::Holiday;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::LeaveRequest;

/// One row to upsert, or a holiday to drop.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRow {
    Balance(LeaveBalance),
    Request(LeaveRequest),
    Attendance(Attendance),
    Holiday(Holiday),
    HolidayRemoved(NaiveDate),
}

/// Durable side of the ledger. `write` applies all rows or none.
pub trait LedgerWriter: Send + Sync {
    fn write<'a>(&'a self, rows: &'a [LedgerRow]) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// The request plus the balance it is charged against, when one exists.
pub fn request_rows(service: &HrmService, request: &LeaveRequest) -> Vec<LedgerRow> {
    let mut rows = vec![LedgerRow::Request(request.clone())];
    if let Some(balance) =
        service.balance(request.employee_id, &request.leave_type, request.ledger_year())
    {
        rows.push(LedgerRow::Balance(balance));
    }
    rows
}

pub fn balance_rows(_: &HrmService, balance: &LeaveBalance) -> Vec<LedgerRow> {
    vec![LedgerRow::Balance(balance.clone())]
}

pub fn attendance_rows(_: &HrmService, record: &Attendance) -> Vec<LedgerRow> {
    vec![LedgerRow::Attendance(record.clone())]
}

pub struct Store {
    writer: Arc<dyn LedgerWriter>,
    gates: DashMap<EmployeeId, Arc<Mutex<()>>>,
    calendar_gate: Mutex<()>,
}

impl Store {
    pub fn new(writer: Arc<dyn LedgerWriter>) -> Self {
        Self {
            writer,
            gates: DashMap::new(),
            calendar_gate: Mutex::new(()),
        }
    }

    fn gate(&self, employee: EmployeeId) -> Arc<Mutex<()>> {
        self.gates.entry(employee).or_default().clone()
    }

    /// Runs `op` against `employee`'s book and persists the rows `rows`
    /// derives from its result. Nothing `op` changed survives a failed write.
    pub async fn commit<T>(
        &self,
        service: &HrmService,
        employee: EmployeeId,
        op: impl FnOnce(&HrmService) -> HrmResult<T>,
        rows: impl FnOnce(&HrmService, &T) -> Vec<LedgerRow>,
    ) -> HrmResult<T> {
        let gate = self.gate(employee);
        let _held = gate.lock().await;

        let snapshot = service.books().snapshot(employee);
        let value = op(service)?;
        let rows = rows(service, &value);
        if let Err(e) = self.writer.write(&rows).await {
            error!(error = ?e, employee, rows = rows.len(), "Ledger write failed, rolling back");
            service.books().restore(employee, snapshot);
            return Err(StorageError::WriteFailed.into());
        }
        debug!(employee, rows = rows.len(), "Ledger rows persisted");
        Ok(value)
    }

    /// Calendar counterpart of [`Store::commit`]; `undo` reverts `op` when
    /// the write fails.
    pub async fn commit_calendar<T>(
        &self,
        op: impl FnOnce() -> HrmResult<T>,
        rows: impl FnOnce(&T) -> Vec<LedgerRow>,
        undo: impl FnOnce(&T),
    ) -> HrmResult<T> {
        let _held = self.calendar_gate.lock().await;

        let value = op()?;
        let rows = rows(&value);
        if let Err(e) = self.writer.write(&rows).await {
            error!(error = ?e, "Holiday write failed, rolling back");
            undo(&value);
            return Err(HrmError::from(StorageError::WriteFailed));
        }
        Ok(value)
    }
}
