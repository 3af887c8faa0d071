//! Entry points the HTTP layer calls.
//!
//! `HrmService` ties the per-employee books to the master data registries
//! and the audit sink. Every mutating call locks a single employee book,
//! mutates, then emits one audit event after the lock is released.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::domain::attendance::MarkOutcome;
use crate::domain::audit::{AuditEvent, AuditKind, AuditSink};
use crate::domain::book::Books;
use crate::domain::calendar::{self, HolidayLookup, LeavePolicy};
use crate::domain::catalog::LeaveTypeCatalog;
use crate::domain::clock::Clock;
use crate::domain::directory::EmployeeLookup;
use crate::domain::leave_request::LeaveDraft;
use crate::error::{BalanceError, HrmResult, NotFoundError};
use crate::model::attendance::{Attendance, AttendanceId, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeId};
use crate::model::leave_balance::{BalanceView, LeaveBalance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, RequestId};

pub struct HrmService {
    books: Books,
    catalog: Arc<LeaveTypeCatalog>,
    holidays: Arc<dyn HolidayLookup>,
    employees: Arc<dyn EmployeeLookup>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    policy: LeavePolicy,
}

impl HrmService {
    pub fn new(
        catalog: Arc<LeaveTypeCatalog>,
        holidays: Arc<dyn HolidayLookup>,
        employees: Arc<dyn EmployeeLookup>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        policy: LeavePolicy,
    ) -> Self {
        Self {
            books: Books::new(),
            catalog,
            holidays,
            employees,
            audit,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> LeavePolicy {
        self.policy
    }

    pub fn catalog(&self) -> &LeaveTypeCatalog {
        &self.catalog
    }

    pub fn holidays(&self) -> &dyn HolidayLookup {
        self.holidays.as_ref()
    }

    pub fn employees(&self) -> &dyn EmployeeLookup {
        self.employees.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn books(&self) -> &Books {
        &self.books
    }

    pub fn employee(&self, id: EmployeeId) -> HrmResult<Employee> {
        self.employees
            .employee(id)
            .ok_or_else(|| NotFoundError::Employee(id).into())
    }

    pub fn is_reporting_manager(&self, manager: EmployeeId, employee: EmployeeId) -> bool {
        self.employees.reports_to(employee) == Some(manager)
    }

    /// Hands an event to the audit sink. A sink failure is logged and
    /// otherwise ignored.
    pub fn record_event(
        &self,
        kind: AuditKind,
        actor: Option<EmployeeId>,
        subject: &'static str,
        object_id: u64,
        metadata: Value,
    ) {
        let event = AuditEvent::new(kind, actor, subject, object_id, metadata, self.clock.now());
        if let Err(e) = self.audit.record_event(&event) {
            warn!(error = %e, kind = %kind, object_id, "Audit sink rejected event");
        }
    }

    /* =========================
    Leave requests
    ========================= */

    #[instrument(skip(self, draft), fields(leave_type = %draft.leave_type))]
    pub fn submit_leave_request(
        &self,
        employee: EmployeeId,
        draft: LeaveDraft,
    ) -> HrmResult<LeaveRequest> {
        self.employee(employee)?;
        let leave_type = self.catalog.require(&draft.leave_type)?;
        draft.check_range()?;
        let counted = self
            .policy
            .count_days(draft.start_date, draft.end_date, self.holidays.as_ref());
        let now = self.clock.now();

        let request = self.books.with_book(employee, |book| -> HrmResult<LeaveRequest> {
            let id = self.books.next_request_id();
            book.requests
                .submit(id, employee, draft, &leave_type, counted, &book.balances, now)
                .cloned()
        })?;
        self.books.index_request(request.id, employee);

        info!(request_id = request.id, total_days = %request.total_days, "Leave request submitted");
        self.record_event(
            AuditKind::LeaveSubmitted,
            Some(employee),
            "LeaveRequest",
            request.id,
            json!({
                "leave_type": request.leave_type,
                "start_date": request.start_date,
                "end_date": request.end_date,
                "total_days": request.total_days,
            }),
        );
        Ok(request)
    }

    fn owner_of(&self, id: RequestId) -> HrmResult<EmployeeId> {
        self.books
            .request_owner(id)
            .ok_or_else(|| NotFoundError::LeaveRequest(id).into())
    }

    #[instrument(skip(self, comments))]
    pub fn approve_leave_request(
        &self,
        id: RequestId,
        manager: EmployeeId,
        comments: String,
    ) -> HrmResult<LeaveRequest> {
        let owner = self.owner_of(id)?;
        let now = self.clock.now();
        let request = self.books.with_book(owner, |book| -> HrmResult<LeaveRequest> {
            let code = book
                .requests
                .get(id)
                .map(|r| r.leave_type.clone())
                .ok_or(NotFoundError::LeaveRequest(id))?;
            let leave_type = self.catalog.require(&code)?;
            book.requests
                .approve(id, &leave_type, &mut book.balances, manager, comments, now)
                .cloned()
        })?;

        info!(request_id = id, employee = owner, "Leave request approved");
        self.record_event(
            AuditKind::LeaveApproved,
            Some(manager),
            "LeaveRequest",
            id,
            json!({
                "employee_id": owner,
                "leave_type": request.leave_type,
                "days_deducted": request.total_days,
                "comments": request.manager_comments,
            }),
        );
        Ok(request)
    }

    #[instrument(skip(self, comments))]
    pub fn reject_leave_request(
        &self,
        id: RequestId,
        manager: EmployeeId,
        comments: String,
    ) -> HrmResult<LeaveRequest> {
        let owner = self.owner_of(id)?;
        let now = self.clock.now();
        let request = self.books.with_book(owner, |book| {
            book.requests.reject(id, manager, comments, now).cloned()
        })?;

        info!(request_id = id, employee = owner, "Leave request rejected");
        self.record_event(
            AuditKind::LeaveRejected,
            Some(manager),
            "LeaveRequest",
            id,
            json!({ "employee_id": owner, "comments": request.manager_comments }),
        );
        Ok(request)
    }

    /// `actor` is recorded in the audit trail only; who may cancel is
    /// decided by the caller.
    #[instrument(skip(self))]
    pub fn cancel_leave_request(&self, id: RequestId, actor: EmployeeId) -> HrmResult<LeaveRequest> {
        let owner = self.owner_of(id)?;
        let now = self.clock.now();
        let (request, previous) = self.books.with_book(owner, |book| {
            book.requests
                .cancel(id, &mut book.balances, now)
                .map(|(request, previous)| (request.clone(), previous))
        })?;

        let restored = if previous == LeaveStatus::Approved {
            request.total_days
        } else {
            Decimal::ZERO
        };
        info!(request_id = id, from = %previous, restored = %restored, "Leave request cancelled");
        self.record_event(
            AuditKind::LeaveCancelled,
            Some(actor),
            "LeaveRequest",
            id,
            json!({ "previous_status": previous, "days_restored": restored }),
        );
        Ok(request)
    }

    pub fn get_leave_request(&self, id: RequestId) -> HrmResult<LeaveRequest> {
        let owner = self.owner_of(id)?;
        self.books
            .read_book(owner, |book| book.requests.get(id).cloned())
            .flatten()
            .ok_or_else(|| NotFoundError::LeaveRequest(id).into())
    }

    /// Requests of one employee, newest first.
    pub fn requests_for(&self, employee: EmployeeId, status: Option<LeaveStatus>) -> Vec<LeaveRequest> {
        let mut requests = self
            .books
            .read_book(employee, |book| {
                book.requests
                    .iter()
                    .filter(|r| status.is_none_or(|s| r.status == s))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        requests.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
        requests
    }

    /// Requests across the given employees, newest first.
    pub fn requests_for_all(
        &self,
        employees: &[EmployeeId],
        status: Option<LeaveStatus>,
    ) -> Vec<LeaveRequest> {
        let mut requests: Vec<LeaveRequest> = employees
            .iter()
            .flat_map(|e| self.requests_for(*e, status))
            .collect();
        requests.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
        requests
    }

    pub fn all_requests(&self, status: Option<LeaveStatus>) -> Vec<LeaveRequest> {
        self.requests_for_all(&self.books.employees(), status)
    }

    /// Pending requests of the manager's active direct reports.
    pub fn pending_for_team(&self, manager: EmployeeId) -> Vec<LeaveRequest> {
        let team = self.employees.team_of(manager);
        self.requests_for_all(&team, Some(LeaveStatus::Pending))
    }

    /* =========================
    Balances
    ========================= */

    #[instrument(skip(self))]
    pub fn allocate_balance(
        &self,
        employee: EmployeeId,
        leave_type: &str,
        year: i32,
        days: Decimal,
        actor: EmployeeId,
    ) -> HrmResult<LeaveBalance> {
        self.employee(employee)?;
        let leave_type = self.catalog.require(leave_type)?;
        let now = self.clock.now();
        let balance = self.books.with_book(employee, |book| {
            book.balances
                .allocate(self.books.next_balance_id(), &leave_type, year, days, now)
                .cloned()
        })?;

        info!(balance_id = balance.id, allocated = %days, "Leave balance allocated");
        self.record_event(
            AuditKind::BalanceAllocated,
            Some(actor),
            "LeaveBalance",
            balance.id,
            json!({
                "employee_id": employee,
                "leave_type": balance.leave_type,
                "year": year,
                "allocated": days,
            }),
        );
        Ok(balance)
    }

    #[instrument(skip(self))]
    pub fn adjust_balance(
        &self,
        employee: EmployeeId,
        leave_type: &str,
        year: i32,
        adjusted_to: Decimal,
        actor: EmployeeId,
    ) -> HrmResult<LeaveBalance> {
        let leave_type = self.catalog.require(leave_type)?;
        let now = self.clock.now();
        let (balance, previous) = self.books.with_book(employee, |book| -> HrmResult<_> {
            let previous = book
                .balances
                .get(&leave_type.code, year)
                .map(|b| b.adjusted)
                .unwrap_or_default();
            let balance = book.balances.adjust(&leave_type, year, adjusted_to, now)?;
            Ok((balance.clone(), previous))
        })?;

        info!(balance_id = balance.id, adjusted = %adjusted_to, "Leave balance adjusted");
        self.record_event(
            AuditKind::BalanceAdjusted,
            Some(actor),
            "LeaveBalance",
            balance.id,
            json!({
                "employee_id": employee,
                "leave_type": balance.leave_type,
                "year": year,
                "previous_adjusted": previous,
                "adjusted": adjusted_to,
                "available": balance.available(),
            }),
        );
        Ok(balance)
    }

    pub fn get_available_balance(
        &self,
        employee: EmployeeId,
        leave_type: &str,
        year: i32,
    ) -> HrmResult<Decimal> {
        self.books
            .read_book(employee, |book| book.balances.available(leave_type, year))
            .flatten()
            .ok_or_else(|| {
                BalanceError::NotFound {
                    leave_type: leave_type.to_string(),
                    year,
                }
                .into()
            })
    }

    pub fn balance(&self, employee: EmployeeId, leave_type: &str, year: i32) -> Option<LeaveBalance> {
        self.books
            .read_book(employee, |book| book.balances.get(leave_type, year).cloned())
            .flatten()
    }

    pub fn balances_for(&self, employee: EmployeeId, year: i32) -> Vec<BalanceView> {
        self.books
            .read_book(employee, |book| {
                book.balances.for_year(year).map(BalanceView::from).collect()
            })
            .unwrap_or_default()
    }

    /* =========================
    Attendance
    ========================= */

    #[instrument(skip(self))]
    pub fn mark_attendance(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        status: AttendanceStatus,
        marked_by: EmployeeId,
    ) -> HrmResult<Attendance> {
        self.employee(employee)?;
        let holiday = self.holidays.holiday_on(date);
        let today = self.clock.today();
        let now = self.clock.now();
        let (record, outcome) = self.books.with_book(employee, |book| {
            book.attendance
                .mark(
                    || self.books.next_attendance_id(),
                    date,
                    status,
                    marked_by,
                    holiday.as_ref(),
                    today,
                    now,
                )
                .map(|(record, outcome)| (record.clone(), outcome))
        })?;

        let overwrote_self_mark = matches!(
            outcome,
            MarkOutcome::Overwrote { was_self_marked: true }
        ) && !record.is_self_marked;
        match outcome {
            MarkOutcome::Created => {
                self.books.index_attendance(record.id, employee, date);
                debug!(attendance_id = record.id, "Attendance record created");
            }
            MarkOutcome::Overwrote { .. } if overwrote_self_mark => {
                warn!(attendance_id = record.id, marked_by, "Self-marked attendance overwritten");
            }
            MarkOutcome::Overwrote { .. } => {}
        }

        self.record_event(
            AuditKind::AttendanceMarked,
            Some(marked_by),
            "Attendance",
            record.id,
            json!({
                "employee_id": employee,
                "date": date,
                "status": record.status,
                "self_marked": record.is_self_marked,
                "overwrote_self_mark": overwrote_self_mark,
            }),
        );
        Ok(record)
    }

    #[instrument(skip(self, reason))]
    pub fn correct_attendance(
        &self,
        id: AttendanceId,
        admin: EmployeeId,
        status: AttendanceStatus,
        reason: &str,
    ) -> HrmResult<Attendance> {
        let (employee, date) = self
            .books
            .locate_attendance(id)
            .ok_or(NotFoundError::Attendance(id))?;
        let role = self.employees.role_of(admin);
        let now = self.clock.now();
        let (record, previous) = self.books.with_book(employee, |book| {
            let previous = book.attendance.on(date).map(|r| r.status);
            book.attendance
                .correct(id, date, admin, role, status, reason, now)
                .map(|record| (record.clone(), previous))
        })?;

        info!(attendance_id = id, employee, %date, "Attendance corrected");
        self.record_event(
            AuditKind::AttendanceCorrected,
            Some(admin),
            "Attendance",
            id,
            json!({
                "employee_id": employee,
                "date": date,
                "previous_status": previous,
                "status": record.status,
                "reason": record.correction_reason,
            }),
        );
        Ok(record)
    }

    pub fn get_attendance(&self, id: AttendanceId) -> HrmResult<Attendance> {
        let (employee, date) = self
            .books
            .locate_attendance(id)
            .ok_or(NotFoundError::Attendance(id))?;
        self.books
            .read_book(employee, |book| book.attendance.on(date).cloned())
            .flatten()
            .ok_or_else(|| NotFoundError::Attendance(id).into())
    }

    pub fn attendance_between(
        &self,
        employee: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Attendance> {
        self.books
            .read_book(employee, |book| book.attendance.between(start, end).cloned().collect())
            .unwrap_or_default()
    }

    /* =========================
    Startup
    ========================= */

    /// Seeds the books with stored ledger rows. Ids issued before the
    /// restart are never handed out again.
    pub fn load_ledger(
        &self,
        balances: Vec<LeaveBalance>,
        requests: Vec<LeaveRequest>,
        attendance: Vec<Attendance>,
    ) {
        self.books.observe_ids(
            balances.iter().map(|b| b.id).max().unwrap_or_default(),
            requests.iter().map(|r| r.id).max().unwrap_or_default(),
            attendance.iter().map(|a| a.id).max().unwrap_or_default(),
        );
        let counts = (balances.len(), requests.len(), attendance.len());

        for balance in balances {
            self.books
                .with_book(balance.employee_id, |book| book.balances.load(balance));
        }
        for request in requests {
            let (id, employee) = (request.id, request.employee_id);
            self.books
                .with_book(employee, |book| book.requests.load(request));
            self.books.index_request(id, employee);
        }
        for record in attendance {
            let (id, employee, date) = (record.id, record.employee_id, record.date);
            self.books
                .with_book(employee, |book| book.attendance.load(record));
            self.books.index_attendance(id, employee, date);
        }

        info!(
            balances = counts.0,
            requests = counts.1,
            attendance = counts.2,
            "Ledger loaded"
        );
    }

    /* =========================
    Calendar
    ========================= */

    pub fn working_days(&self, start: NaiveDate, end: NaiveDate, exclude_weekends: bool) -> u32 {
        let holidays = self.holidays.holidays_in_range(start, end);
        calendar::working_days(start, end, &holidays, exclude_weekends)
    }

    /// Days a request over `[start, end]` would be charged.
    pub fn leave_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        self.policy.count_days(start, end, self.holidays.as_ref())
    }
}
