//! In-process ledger state, partitioned by employee.
//!
//! Each employee owns one [`EmployeeBook`] behind its own mutex. A mutating
//! core operation locks exactly one book, so validation and mutation for the
//! same employee are serialized while different employees proceed in
//! parallel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use dashmap::DashMap;

use crate::domain::attendance::AttendanceSheet;
use crate::domain::leave_request::LeaveRequests;
use crate::domain::ledger::BalanceLedger;
use crate::model::attendance::AttendanceId;
use crate::model::employee::EmployeeId;
use crate::model::leave_request::RequestId;

#[derive(Debug, Clone)]
pub struct EmployeeBook {
    pub balances: BalanceLedger,
    pub requests: LeaveRequests,
    pub attendance: AttendanceSheet,
}

impl EmployeeBook {
    fn new(employee_id: EmployeeId) -> Self {
        Self {
            balances: BalanceLedger::new(employee_id),
            requests: LeaveRequests::default(),
            attendance: AttendanceSheet::new(employee_id),
        }
    }
}

#[derive(Default)]
pub struct Books {
    books: DashMap<EmployeeId, Arc<Mutex<EmployeeBook>>>,
    request_owner: DashMap<RequestId, EmployeeId>,
    attendance_owner: DashMap<AttendanceId, (EmployeeId, NaiveDate)>,
    balance_seq: AtomicU64,
    request_seq: AtomicU64,
    attendance_seq: AtomicU64,
}

impl Books {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, employee: EmployeeId) -> Arc<Mutex<EmployeeBook>> {
        // clone out so the shard lock is released before the book is locked
        self.books
            .entry(employee)
            .or_insert_with(|| Arc::new(Mutex::new(EmployeeBook::new(employee))))
            .clone()
    }

    /// Runs `f` with the employee's book locked, creating the book on first use.
    pub fn with_book<R>(&self, employee: EmployeeId, f: impl FnOnce(&mut EmployeeBook) -> R) -> R {
        let book = self.book(employee);
        // a panic mid-operation leaves the book as it was before the failing
        // mutation; every mutation validates before it writes
        let mut guard = book.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Read access to an existing book. `None` when the employee has no
    /// ledger state yet.
    pub fn read_book<R>(&self, employee: EmployeeId, f: impl FnOnce(&EmployeeBook) -> R) -> Option<R> {
        let book = self.books.get(&employee).map(|entry| entry.value().clone())?;
        let guard = book.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&guard))
    }

    /// Copy of the employee's book, `None` when it does not exist yet.
    pub fn snapshot(&self, employee: EmployeeId) -> Option<EmployeeBook> {
        self.read_book(employee, EmployeeBook::clone)
    }

    /// Puts back a book taken with [`Books::snapshot`]; `None` resets the
    /// employee to an empty book.
    pub fn restore(&self, employee: EmployeeId, snapshot: Option<EmployeeBook>) {
        self.with_book(employee, |book| {
            *book = snapshot.unwrap_or_else(|| EmployeeBook::new(employee));
        });
    }

    pub fn employees(&self) -> Vec<EmployeeId> {
        let mut ids: Vec<EmployeeId> = self.books.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn next_balance_id(&self) -> u64 {
        self.balance_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_request_id(&self) -> RequestId {
        self.request_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_attendance_id(&self) -> AttendanceId {
        self.attendance_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Moves the sequences past ids loaded from storage.
    pub fn observe_ids(&self, balance: u64, request: RequestId, attendance: AttendanceId) {
        self.balance_seq.fetch_max(balance, Ordering::Relaxed);
        self.request_seq.fetch_max(request, Ordering::Relaxed);
        self.attendance_seq.fetch_max(attendance, Ordering::Relaxed);
    }

    pub fn index_request(&self, id: RequestId, employee: EmployeeId) {
        self.request_owner.insert(id, employee);
    }

    pub fn request_owner(&self, id: RequestId) -> Option<EmployeeId> {
        self.request_owner.get(&id).map(|owner| *owner)
    }

    pub fn index_attendance(&self, id: AttendanceId, employee: EmployeeId, date: NaiveDate) {
        self.attendance_owner.insert(id, (employee, date));
    }

    pub fn locate_attendance(&self, id: AttendanceId) -> Option<(EmployeeId, NaiveDate)> {
        self.attendance_owner.get(&id).map(|entry| *entry)
    }
}
