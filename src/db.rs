use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use sqlx::MySqlPool;
use tracing::info;

use crate::domain::calendar::HolidayCalendar;
use crate::domain::catalog::LeaveTypeCatalog;
use crate::domain::directory::EmployeeDirectory;
use crate::domain::service::HrmService;
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_type::LeaveType;
use crate::model::role::Role;
use crate::store::{LedgerRow, LedgerWriter};

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: u64,
    employee_code: String,
    full_name: String,
    role: String,
    reporting_manager_id: Option<u64>,
    is_active: bool,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = anyhow::Error;

    fn try_from(row: EmployeeRow) -> anyhow::Result<Self> {
        let role = Role::from_str(&row.role)
            .map_err(|_| anyhow!("employee {} has unknown role {:?}", row.id, row.role))?;
        Ok(Employee {
            id: row.id,
            employee_code: row.employee_code,
            full_name: row.full_name,
            role,
            reporting_manager_id: row.reporting_manager_id,
            is_active: row.is_active,
        })
    }
}

/// Fills the in-process registries from the master tables. Managers are
/// loaded before their reports so the reporting-cycle check sees the chain.
pub async fn load_master_data(
    pool: &MySqlPool,
    holidays: &HolidayCalendar,
    catalog: &LeaveTypeCatalog,
    directory: &EmployeeDirectory,
) -> anyhow::Result<()> {
    let leave_types = sqlx::query_as::<_, LeaveType>(
        r#"SELECT id, code, name, is_paid, requires_documentation,
                  max_consecutive_days, description
           FROM leave_types ORDER BY id"#,
    )
    .fetch_all(pool)
    .await
    .context("loading leave types")?;
    let leave_type_count = leave_types.len();
    for leave_type in leave_types {
        catalog.register(leave_type)?;
    }

    let rows = sqlx::query_as::<_, Holiday>(
        r#"SELECT id, date, name, is_optional, description FROM holidays ORDER BY date"#,
    )
    .fetch_all(pool)
    .await
    .context("loading holidays")?;
    let holiday_count = rows.len();
    for holiday in rows {
        holidays.load(holiday);
    }

    let rows = sqlx::query_as::<_, EmployeeRow>(
        r#"SELECT id, employee_code, full_name, role, reporting_manager_id, is_active
           FROM employees ORDER BY reporting_manager_id IS NOT NULL, id"#,
    )
    .fetch_all(pool)
    .await
    .context("loading employees")?;
    let employee_count = rows.len();
    for row in rows {
        directory.upsert(Employee::try_from(row)?)?;
    }

    info!(
        leave_types = leave_type_count,
        holidays = holiday_count,
        employees = employee_count,
        "Master data loaded"
    );
    Ok(())
}

#[derive(sqlx::FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: Decimal,
    half_day: bool,
    reason: String,
    attachment: Option<String>,
    status: String,
    applied_at: DateTime<Utc>,
    approved_by: Option<u64>,
    decision_at: Option<DateTime<Utc>>,
    manager_comments: String,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = anyhow::Error;

    fn try_from(row: LeaveRequestRow) -> anyhow::Result<Self> {
        let status = LeaveStatus::from_str(&row.status)
            .map_err(|_| anyhow!("leave request {} has unknown status {:?}", row.id, row.status))?;
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: row.leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            total_days: row.total_days,
            half_day: row.half_day,
            reason: row.reason,
            attachment: row.attachment,
            status,
            applied_at: row.applied_at,
            approved_by: row.approved_by,
            decision_at: row.decision_at,
            manager_comments: row.manager_comments,
            cancelled_at: row.cancelled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    status: String,
    marked_by: u64,
    is_self_marked: bool,
    correction_reason: String,
    marked_at: DateTime<Utc>,
    corrected_at: Option<DateTime<Utc>>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = anyhow::Error;

    fn try_from(row: AttendanceRow) -> anyhow::Result<Self> {
        let status = AttendanceStatus::from_str(&row.status)
            .map_err(|_| anyhow!("attendance {} has unknown status {:?}", row.id, row.status))?;
        Ok(Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            status,
            marked_by: row.marked_by,
            is_self_marked: row.is_self_marked,
            correction_reason: row.correction_reason,
            marked_at: row.marked_at,
            corrected_at: row.corrected_at,
        })
    }
}

/// Reloads balances, requests and attendance into the service's books.
pub async fn load_ledgers(pool: &MySqlPool, service: &HrmService) -> anyhow::Result<()> {
    let balances = sqlx::query_as::<_, LeaveBalance>(
        r#"SELECT id, employee_id, leave_type, year, allocated, used, adjusted,
                  created_at, updated_at
           FROM leave_balances ORDER BY id"#,
    )
    .fetch_all(pool)
    .await
    .context("loading leave balances")?;

    let requests = sqlx::query_as::<_, LeaveRequestRow>(
        r#"SELECT id, employee_id, leave_type, start_date, end_date, total_days, half_day,
                  reason, attachment, status, applied_at, approved_by, decision_at,
                  manager_comments, cancelled_at
           FROM leave_requests ORDER BY id"#,
    )
    .fetch_all(pool)
    .await
    .context("loading leave requests")?
    .into_iter()
    .map(LeaveRequest::try_from)
    .collect::<anyhow::Result<Vec<_>>>()?;

    let attendance = sqlx::query_as::<_, AttendanceRow>(
        r#"SELECT id, employee_id, date, status, marked_by, is_self_marked,
                  correction_reason, marked_at, corrected_at
           FROM attendance ORDER BY id"#,
    )
    .fetch_all(pool)
    .await
    .context("loading attendance")?
    .into_iter()
    .map(Attendance::try_from)
    .collect::<anyhow::Result<Vec<_>>>()?;

    service.load_ledger(balances, requests, attendance);
    Ok(())
}

/// Upserts ledger rows into MySQL, one transaction per batch.
pub struct MySqlLedgerWriter {
    pool: MySqlPool,
}

impl MySqlLedgerWriter {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl LedgerWriter for MySqlLedgerWriter {
    fn write<'a>(&'a self, rows: &'a [LedgerRow]) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            for row in rows {
                match row {
                    LedgerRow::Balance(b) => {
                        sqlx::query(
                            r#"
                            INSERT INTO leave_balances
                                (id, employee_id, leave_type, year, allocated, used, adjusted,
                                 created_at, updated_at)
                            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                            ON DUPLICATE KEY UPDATE
                                allocated = VALUES(allocated),
                                used = VALUES(used),
                                adjusted = VALUES(adjusted),
                                updated_at = VALUES(updated_at)
                            "#,
                        )
                        .bind(b.id)
                        .bind(b.employee_id)
                        .bind(&b.leave_type)
                        .bind(b.year)
                        .bind(b.allocated)
                        .bind(b.used)
                        .bind(b.adjusted)
                        .bind(b.created_at)
                        .bind(b.updated_at)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("saving leave balance {}", b.id))?;
                    }
                    LedgerRow::Request(r) => {
                        sqlx::query(
                            r#"
                            INSERT INTO leave_requests
                                (id, employee_id, leave_type, start_date, end_date, total_days,
                                 half_day, reason, attachment, status, applied_at, approved_by,
                                 decision_at, manager_comments, cancelled_at)
                            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                            ON DUPLICATE KEY UPDATE
                                status = VALUES(status),
                                approved_by = VALUES(approved_by),
                                decision_at = VALUES(decision_at),
                                manager_comments = VALUES(manager_comments),
                                cancelled_at = VALUES(cancelled_at)
                            "#,
                        )
                        .bind(r.id)
                        .bind(r.employee_id)
                        .bind(&r.leave_type)
                        .bind(r.start_date)
                        .bind(r.end_date)
                        .bind(r.total_days)
                        .bind(r.half_day)
                        .bind(&r.reason)
                        .bind(&r.attachment)
                        .bind(r.status.as_ref())
                        .bind(r.applied_at)
                        .bind(r.approved_by)
                        .bind(r.decision_at)
                        .bind(&r.manager_comments)
                        .bind(r.cancelled_at)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("saving leave request {}", r.id))?;
                    }
                    LedgerRow::Attendance(a) => {
                        sqlx::query(
                            r#"
                            INSERT INTO attendance
                                (id, employee_id, date, status, marked_by, is_self_marked,
                                 correction_reason, marked_at, corrected_at)
                            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                            ON DUPLICATE KEY UPDATE
                                status = VALUES(status),
                                marked_by = VALUES(marked_by),
                                is_self_marked = VALUES(is_self_marked),
                                correction_reason = VALUES(correction_reason),
                                marked_at = VALUES(marked_at),
                                corrected_at = VALUES(corrected_at)
                            "#,
                        )
                        .bind(a.id)
                        .bind(a.employee_id)
                        .bind(a.date)
                        .bind(a.status.as_ref())
                        .bind(a.marked_by)
                        .bind(a.is_self_marked)
                        .bind(&a.correction_reason)
                        .bind(a.marked_at)
                        .bind(a.corrected_at)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("saving attendance {}", a.id))?;
                    }
                    LedgerRow::Holiday(h) => {
                        sqlx::query(
                            r#"
                            INSERT INTO holidays (id, date, name, is_optional, description)
                            VALUES (?, ?, ?, ?, ?)
                            "#,
                        )
                        .bind(h.id)
                        .bind(h.date)
                        .bind(&h.name)
                        .bind(h.is_optional)
                        .bind(&h.description)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("saving holiday {}", h.date))?;
                    }
                    LedgerRow::HolidayRemoved(date) => {
                        sqlx::query("DELETE FROM holidays WHERE date = ?")
                            .bind(date)
                            .execute(&mut *tx)
                            .await
                            .with_context(|| format!("removing holiday {date}"))?;
                    }
                }
            }
            tx.commit().await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> EmployeeRow {
        EmployeeRow {
            id: 7,
            employee_code: "EMP-007".into(),
            full_name: "Dana Reyes".into(),
            role: role.into(),
            reporting_manager_id: Some(2),
            is_active: true,
        }
    }

    #[test]
    fn employee_rows_parse_their_role() {
        let employee = Employee::try_from(row("MANAGER")).unwrap();
        assert_eq!(employee.role, Role::Manager);
        assert_eq!(employee.reporting_manager_id, Some(2));

        let err = Employee::try_from(row("HR")).unwrap_err();
        assert!(err.to_string().contains("unknown role"));
    }

    fn request_row(status: &str) -> LeaveRequestRow {
        LeaveRequestRow {
            id: 11,
            employee_id: 7,
            leave_type: "CL".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            total_days: Decimal::new(5, 1),
            half_day: true,
            reason: "dentist".into(),
            attachment: None,
            status: status.into(),
            applied_at: Utc::now(),
            approved_by: None,
            decision_at: None,
            manager_comments: String::new(),
            cancelled_at: None,
        }
    }

    #[test]
    fn stored_statuses_parse_back() {
        let request = LeaveRequest::try_from(request_row("APPROVED")).unwrap();
        assert_eq!(request.status, LeaveStatus::Approved);
        assert_eq!(request.status.as_ref(), "APPROVED");
        assert!(LeaveRequest::try_from(request_row("approved")).is_err());

        let row = AttendanceRow {
            id: 3,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            status: "HALF_DAY".into(),
            marked_by: 1,
            is_self_marked: false,
            correction_reason: "late badge".into(),
            marked_at: Utc::now(),
            corrected_at: None,
        };
        let record = Attendance::try_from(row).unwrap();
        assert_eq!(record.status, AttendanceStatus::HalfDay);
        assert_eq!(record.status.as_ref(), "HALF_DAY");
    }
}
