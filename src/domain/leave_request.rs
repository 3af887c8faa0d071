//! Leave request lifecycle for one employee.
//!
//! ```text
//! PENDING ──approve──▶ APPROVED ──cancel──▶ CANCELLED
//!    │ └────reject───▶ REJECTED
//!    └──────cancel───▶ CANCELLED
//! ```
//!
//! Balances are charged only on approval, so a pending request never moves
//! the ledger. Every transition validates first and mutates last.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ledger::BalanceLedger;
use crate::error::{BalanceError, HrmResult, NotFoundError, StateError, ValidationError};
use crate::model::employee::EmployeeId;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, RequestId};
use crate::model::leave_type::LeaveType;

/// What an employee asks for.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveDraft {
    #[schema(example = "CL")]
    pub leave_type: String,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Only valid when start and end are the same day
    #[serde(default)]
    #[schema(example = false)]
    pub half_day: bool,
    #[schema(example = "Family function")]
    pub reason: String,
    #[serde(default)]
    #[schema(example = "leave_attachments/ticket.pdf", nullable = true)]
    pub attachment: Option<String>,
}

impl LeaveDraft {
    pub fn check_range(&self) -> HrmResult<()> {
        if self.start_date > self.end_date {
            return Err(ValidationError::DateRange {
                start: self.start_date,
                end: self.end_date,
            }
            .into());
        }
        if self.half_day && self.start_date != self.end_date {
            return Err(ValidationError::HalfDayRange.into());
        }
        Ok(())
    }

    /// Days charged for this draft given how many days of its range count.
    pub fn total_days(&self, counted_days: u32) -> Decimal {
        match (self.half_day, counted_days) {
            (_, 0) => Decimal::ZERO,
            (true, _) => Decimal::new(5, 1),
            (false, n) => Decimal::from(n),
        }
    }
}

fn invalid(request: &LeaveRequest, action: &'static str) -> StateError {
    StateError::InvalidTransition {
        id: request.id,
        from: request.status,
        action,
    }
}

#[derive(Debug, Clone, Default)]
pub struct LeaveRequests {
    requests: BTreeMap<RequestId, LeaveRequest>,
}

impl LeaveRequests {
    pub fn get(&self, id: RequestId) -> Option<&LeaveRequest> {
        self.requests.get(&id)
    }

    /// Places a stored request back as-is.
    pub fn load(&mut self, request: LeaveRequest) {
        self.requests.insert(request.id, request);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeaveRequest> {
        self.requests.values()
    }

    /// First pending or approved request intersecting `[start, end]`.
    pub fn overlapping(&self, start: NaiveDate, end: NaiveDate) -> Option<&LeaveRequest> {
        self.requests
            .values()
            .find(|r| r.status.holds_dates() && r.overlaps(start, end))
    }

    fn require_mut(&mut self, id: RequestId) -> HrmResult<&mut LeaveRequest> {
        self.requests
            .get_mut(&id)
            .ok_or_else(|| NotFoundError::LeaveRequest(id).into())
    }

    /// Validates `draft` against the employee's current requests and
    /// balances and records it as PENDING.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        id: RequestId,
        employee_id: EmployeeId,
        draft: LeaveDraft,
        leave_type: &LeaveType,
        counted_days: u32,
        ledger: &BalanceLedger,
        now: DateTime<Utc>,
    ) -> HrmResult<&LeaveRequest> {
        draft.check_range()?;

        let total_days = draft.total_days(counted_days);
        if total_days.is_zero() {
            return Err(ValidationError::NoCountableDays {
                start: draft.start_date,
                end: draft.end_date,
            }
            .into());
        }
        if let Some(max) = leave_type.max_consecutive_days {
            if total_days > Decimal::from(max) {
                return Err(ValidationError::ExceedsMaxConsecutiveDays {
                    leave_type: leave_type.code.clone(),
                    max,
                    requested: total_days,
                }
                .into());
            }
        }
        let has_attachment = draft
            .attachment
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());
        if leave_type.requires_documentation && !has_attachment {
            return Err(ValidationError::AttachmentRequired {
                leave_type: leave_type.code.clone(),
            }
            .into());
        }

        if let Some(existing) = self.overlapping(draft.start_date, draft.end_date) {
            return Err(ValidationError::Overlap {
                existing: existing.id,
                start: existing.start_date,
                end: existing.end_date,
            }
            .into());
        }

        if leave_type.is_paid {
            let year = draft.start_date.year();
            let available = ledger
                .available(&leave_type.code, year)
                .ok_or_else(|| BalanceError::NotFound {
                    leave_type: leave_type.code.clone(),
                    year,
                })?;
            if available < total_days {
                return Err(BalanceError::Insufficient {
                    available,
                    requested: total_days,
                }
                .into());
            }
        }

        let request = LeaveRequest {
            id,
            employee_id,
            leave_type: leave_type.code.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            total_days,
            half_day: draft.half_day,
            reason: draft.reason,
            attachment: draft.attachment.filter(|a| !a.trim().is_empty()),
            status: LeaveStatus::Pending,
            applied_at: now,
            approved_by: None,
            decision_at: None,
            manager_comments: String::new(),
            cancelled_at: None,
        };
        Ok(&*self.requests.entry(id).or_insert(request))
    }

    /// PENDING → APPROVED, charging the ledger. A failed charge leaves both
    /// the request and the ledger untouched.
    pub fn approve(
        &mut self,
        id: RequestId,
        leave_type: &LeaveType,
        ledger: &mut BalanceLedger,
        manager: EmployeeId,
        comments: String,
        now: DateTime<Utc>,
    ) -> HrmResult<&LeaveRequest> {
        let request = self.require_mut(id)?;
        if request.status != LeaveStatus::Pending {
            return Err(invalid(request, "approve").into());
        }
        ledger.deduct(leave_type, request.ledger_year(), request.total_days, now)?;

        request.status = LeaveStatus::Approved;
        request.approved_by = Some(manager);
        request.decision_at = Some(now);
        request.manager_comments = comments;
        Ok(&*request)
    }

    /// PENDING → REJECTED. No ledger interaction.
    pub fn reject(
        &mut self,
        id: RequestId,
        manager: EmployeeId,
        comments: String,
        now: DateTime<Utc>,
    ) -> HrmResult<&LeaveRequest> {
        let request = self.require_mut(id)?;
        if request.status != LeaveStatus::Pending {
            return Err(invalid(request, "reject").into());
        }
        request.status = LeaveStatus::Rejected;
        request.approved_by = Some(manager);
        request.decision_at = Some(now);
        request.manager_comments = comments;
        Ok(&*request)
    }

    /// PENDING or APPROVED → CANCELLED. Cancelling an approved request gives
    /// its days back to the ledger when an account exists.
    /// Returns the request and the status it was cancelled from.
    pub fn cancel(
        &mut self,
        id: RequestId,
        ledger: &mut BalanceLedger,
        now: DateTime<Utc>,
    ) -> HrmResult<(&LeaveRequest, LeaveStatus)> {
        let request = self.require_mut(id)?;
        let previous = request.status;
        match previous {
            LeaveStatus::Pending => {}
            LeaveStatus::Approved => {
                ledger.restore(
                    &request.leave_type,
                    request.ledger_year(),
                    request.total_days,
                    now,
                )?;
            }
            LeaveStatus::Rejected | LeaveStatus::Cancelled => {
                return Err(invalid(request, "cancel").into());
            }
        }
        request.status = LeaveStatus::Cancelled;
        request.cancelled_at = Some(now);
        Ok((&*request, previous))
    }
}
