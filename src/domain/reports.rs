//! Monthly leave and attendance reports.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use strum::Display;
use utoipa::ToSchema;

use crate::domain::calendar::{is_weekend, working_days};
use crate::domain::service::HrmService;
use crate::error::{HrmResult, ValidationError};
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::EmployeeId;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// First and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> HrmResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(ValidationError::InvalidMonth { year, month })?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .ok_or(ValidationError::InvalidMonth { year, month })?;
    Ok((first, last))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LeaveTypeBreakdown {
    pub applied: u32,
    pub approved: u32,
    pub rejected: u32,
    pub pending: u32,
    pub cancelled: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeLeaveSummary {
    #[schema(example = 1000)]
    pub employee_id: EmployeeId,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    /// Keyed by leave type code
    pub leave_breakdown: BTreeMap<String, LeaveTypeBreakdown>,
    /// Sum of `total_days` over approved requests touching the month
    #[schema(example = 3.0, value_type = f64)]
    pub total_leaves_taken: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveSummaryReport {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
    pub summary: Vec<EmployeeLeaveSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeAttendanceSummary {
    #[schema(example = 1000)]
    pub employee_id: EmployeeId,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    pub present_days: u32,
    pub wfh_days: u32,
    pub half_days: u32,
    #[schema(value_type = f64)]
    pub absent_days: Decimal,
    #[schema(value_type = f64)]
    pub on_leave: Decimal,
    pub holidays: u32,
    pub total_working_days: u32,
    #[schema(example = 95.45, value_type = f64)]
    pub attendance_percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceSummaryReport {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
    pub total_working_days: u32,
    pub summary: Vec<EmployeeAttendanceSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Holiday,
    OnLeave,
    Present,
    Wfh,
    HalfDay,
    Absent,
    Future,
    Unmarked,
}

impl From<AttendanceStatus> for DayStatus {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => DayStatus::Present,
            AttendanceStatus::Wfh => DayStatus::Wfh,
            AttendanceStatus::HalfDay => DayStatus::HalfDay,
            AttendanceStatus::Absent => DayStatus::Absent,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CalendarDay {
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: DayStatus,
    pub is_weekend: bool,
    /// Holiday name or leave type code, when relevant
    #[schema(nullable = true)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyCalendar {
    pub employee_id: EmployeeId,
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

fn approved_in(requests: &[LeaveRequest], first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = &LeaveRequest> {
    requests
        .iter()
        .filter(move |r| r.status == LeaveStatus::Approved && r.overlaps(first, last))
}

impl HrmService {
    /// Per employee and leave type, counts of requests touching the month.
    pub fn leave_summary(
        &self,
        employees: &[EmployeeId],
        year: i32,
        month: u32,
    ) -> HrmResult<LeaveSummaryReport> {
        let (first, last) = month_bounds(year, month)?;
        let codes: Vec<String> = self.catalog().all().into_iter().map(|t| t.code).collect();

        let mut summary = Vec::with_capacity(employees.len());
        for id in employees {
            let employee = self.employee(*id)?;
            let requests: Vec<LeaveRequest> = self
                .requests_for(*id, None)
                .into_iter()
                .filter(|r| r.overlaps(first, last))
                .collect();

            let mut leave_breakdown: BTreeMap<String, LeaveTypeBreakdown> = codes
                .iter()
                .map(|code| (code.clone(), LeaveTypeBreakdown::default()))
                .collect();
            for request in &requests {
                let entry = leave_breakdown.entry(request.leave_type.clone()).or_default();
                entry.applied += 1;
                match request.status {
                    LeaveStatus::Pending => entry.pending += 1,
                    LeaveStatus::Approved => entry.approved += 1,
                    LeaveStatus::Rejected => entry.rejected += 1,
                    LeaveStatus::Cancelled => entry.cancelled += 1,
                }
            }

            summary.push(EmployeeLeaveSummary {
                employee_id: employee.id,
                employee_code: employee.employee_code,
                full_name: employee.full_name,
                leave_breakdown,
                total_leaves_taken: approved_in(&requests, first, last)
                    .map(|r| r.total_days)
                    .sum(),
            });
        }

        Ok(LeaveSummaryReport {
            year,
            month,
            summary,
        })
    }

    /// Working days of the month exclude holidays and, when configured,
    /// weekends. Approved leave counts only on working days inside the month.
    pub fn attendance_summary(
        &self,
        employees: &[EmployeeId],
        year: i32,
        month: u32,
    ) -> HrmResult<AttendanceSummaryReport> {
        let (first, last) = month_bounds(year, month)?;
        let exclude_weekends = self.policy().exclude_weekends;
        let holidays = self.holidays().holidays_in_range(first, last);
        let total_working_days = working_days(first, last, &holidays, exclude_weekends);
        let working = Decimal::from(total_working_days);

        let mut summary = Vec::with_capacity(employees.len());
        for id in employees {
            let employee = self.employee(*id)?;

            let (mut present_days, mut wfh_days, mut half_days) = (0u32, 0u32, 0u32);
            for record in self.attendance_between(*id, first, last) {
                match record.status {
                    AttendanceStatus::Present => present_days += 1,
                    AttendanceStatus::Wfh => wfh_days += 1,
                    AttendanceStatus::HalfDay => half_days += 1,
                    AttendanceStatus::Absent => {}
                }
            }

            let requests = self.requests_for(*id, Some(LeaveStatus::Approved));
            let on_leave: Decimal = approved_in(&requests, first, last)
                .map(|r| {
                    let start = r.start_date.max(first);
                    let end = r.end_date.min(last);
                    let days = Decimal::from(working_days(start, end, &holidays, exclude_weekends));
                    if r.half_day { days / Decimal::TWO } else { days }
                })
                .sum();

            let attended = Decimal::from(present_days + wfh_days) + Decimal::from(half_days) / Decimal::TWO;
            let absent_days = (working
                - Decimal::from(present_days + wfh_days + half_days)
                - on_leave)
                .max(Decimal::ZERO);
            let attendance_percentage = if working.is_zero() {
                Decimal::ZERO
            } else {
                (attended / working * Decimal::ONE_HUNDRED).round_dp(2)
            };

            summary.push(EmployeeAttendanceSummary {
                employee_id: employee.id,
                employee_code: employee.employee_code,
                full_name: employee.full_name,
                present_days,
                wfh_days,
                half_days,
                absent_days,
                on_leave,
                holidays: holidays.len() as u32,
                total_working_days,
                attendance_percentage,
            });
        }

        Ok(AttendanceSummaryReport {
            year,
            month,
            total_working_days,
            summary,
        })
    }

    /// One entry per day of the month. A holiday wins over approved leave,
    /// which wins over a mark; unmarked days after today are FUTURE.
    pub fn monthly_calendar(
        &self,
        employee: EmployeeId,
        year: i32,
        month: u32,
    ) -> HrmResult<MonthlyCalendar> {
        self.employee(employee)?;
        let (first, last) = month_bounds(year, month)?;
        let today = self.today();
        let requests = self.requests_for(employee, Some(LeaveStatus::Approved));
        let records = self.attendance_between(employee, first, last);

        let days = first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|date| {
                let (status, label) = if let Some(holiday) = self.holidays().holiday_on(date) {
                    (DayStatus::Holiday, Some(holiday.name))
                } else if let Some(leave) = requests.iter().find(|r| r.covers(date)) {
                    (DayStatus::OnLeave, Some(leave.leave_type.clone()))
                } else if let Some(record) = records.iter().find(|r| r.date == date) {
                    (record.status.into(), None)
                } else if date > today {
                    (DayStatus::Future, None)
                } else {
                    (DayStatus::Unmarked, None)
                };
                CalendarDay {
                    date,
                    status,
                    is_weekend: is_weekend(date),
                    label,
                }
            })
            .collect();

        Ok(MonthlyCalendar {
            employee_id: employee,
            year: first.year(),
            month: first.month(),
            days,
        })
    }

    /// Approved leave of `employees` intersecting `[from, to]`; an open bound
    /// is unbounded. Ordered by start date.
    pub fn team_calendar(
        &self,
        employees: &[EmployeeId],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<LeaveRequest> {
        let start = from.unwrap_or(NaiveDate::MIN);
        let end = to.unwrap_or(NaiveDate::MAX);
        let mut leaves: Vec<LeaveRequest> = self
            .requests_for_all(employees, Some(LeaveStatus::Approved))
            .into_iter()
            .filter(|r| r.overlaps(start, end))
            .collect();
        leaves.sort_by_key(|r| (r.start_date, r.employee_id));
        leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service::tests::{ADMIN, ALICE, BOB, MANAGER, d, draft, fixture};
    use crate::error::HrmError;
    use rust_decimal_macros::dec;

    #[test]
    fn month_bounds_handle_december_and_leap_years() {
        assert_eq!(month_bounds(2026, 12).unwrap(), (d(2026, 12, 1), d(2026, 12, 31)));
        assert_eq!(month_bounds(2028, 2).unwrap().1, d(2028, 2, 29));
        assert_eq!(
            month_bounds(2026, 13),
            Err(HrmError::from(ValidationError::InvalidMonth { year: 2026, month: 13 }))
        );
    }

    #[test]
    fn leave_summary_counts_by_status() {
        let service = fixture(d(2026, 2, 20)).service;
        service.allocate_balance(ALICE, "CL", 2026, dec!(10), ADMIN).unwrap();
        let approved = service
            .submit_leave_request(ALICE, draft("CL", d(2026, 3, 2), d(2026, 3, 4)))
            .unwrap();
        service.approve_leave_request(approved.id, MANAGER, String::new()).unwrap();
        let rejected = service
            .submit_leave_request(ALICE, draft("LWP", d(2026, 3, 9), d(2026, 3, 9)))
            .unwrap();
        service.reject_leave_request(rejected.id, MANAGER, String::new()).unwrap();
        service
            .submit_leave_request(ALICE, draft("CL", d(2026, 3, 16), d(2026, 3, 16)))
            .unwrap();
        // outside the month
        service
            .submit_leave_request(ALICE, draft("CL", d(2026, 4, 6), d(2026, 4, 6)))
            .unwrap();

        let report = service.leave_summary(&[ALICE, BOB], 2026, 3).unwrap();
        let alice = &report.summary[0];
        assert_eq!(
            alice.leave_breakdown["CL"],
            LeaveTypeBreakdown {
                applied: 2,
                approved: 1,
                rejected: 0,
                pending: 1,
                cancelled: 0
            }
        );
        assert_eq!(alice.leave_breakdown["LWP"].rejected, 1);
        assert_eq!(alice.total_leaves_taken, dec!(3));
        assert_eq!(report.summary[1].leave_breakdown["CL"], LeaveTypeBreakdown::default());
    }

    #[test]
    fn attendance_summary_derives_absence_and_percentage() {
        // March 2026 has 22 weekdays and no holidays in the fixture
        let service = fixture(d(2026, 3, 31)).service;
        for day in [2, 3, 4, 5] {
            service
                .mark_attendance(ALICE, d(2026, 3, day), AttendanceStatus::Present, ADMIN)
                .unwrap();
        }
        service
            .mark_attendance(ALICE, d(2026, 3, 6), AttendanceStatus::Wfh, ADMIN)
            .unwrap();
        service
            .mark_attendance(ALICE, d(2026, 3, 9), AttendanceStatus::HalfDay, ADMIN)
            .unwrap();

        service.allocate_balance(ALICE, "CL", 2026, dec!(10), ADMIN).unwrap();
        // Fri 2026-03-27 .. Tue 2026-03-31, three working days
        let leave = service
            .submit_leave_request(ALICE, draft("CL", d(2026, 3, 27), d(2026, 3, 31)))
            .unwrap();
        service.approve_leave_request(leave.id, MANAGER, String::new()).unwrap();

        let report = service.attendance_summary(&[ALICE], 2026, 3).unwrap();
        assert_eq!(report.total_working_days, 22);
        let alice = &report.summary[0];
        assert_eq!((alice.present_days, alice.wfh_days, alice.half_days), (4, 1, 1));
        assert_eq!(alice.on_leave, dec!(3));
        assert_eq!(alice.absent_days, dec!(13));
        // (4 + 1 + 0.5) / 22 * 100
        assert_eq!(alice.attendance_percentage, dec!(25.00));
    }

    #[test]
    fn attendance_summary_excludes_holidays() {
        let service = fixture(d(2026, 1, 31)).service;
        let report = service.attendance_summary(&[BOB], 2026, 1).unwrap();
        // 22 weekdays in January 2026 minus Republic Day
        assert_eq!(report.total_working_days, 21);
        assert_eq!(report.summary[0].holidays, 1);
        assert_eq!(report.summary[0].absent_days, dec!(21));
        assert_eq!(report.summary[0].attendance_percentage, Decimal::ZERO);
    }

    #[test]
    fn calendar_precedence() {
        let service = fixture(d(2026, 1, 27)).service;
        service.allocate_balance(ALICE, "CL", 2026, dec!(10), ADMIN).unwrap();
        // covers the Republic Day holiday on Monday 2026-01-26
        let leave = service
            .submit_leave_request(ALICE, draft("CL", d(2026, 1, 23), d(2026, 1, 27)))
            .unwrap();
        service.approve_leave_request(leave.id, MANAGER, String::new()).unwrap();
        service
            .mark_attendance(ALICE, d(2026, 1, 22), AttendanceStatus::Wfh, ADMIN)
            .unwrap();

        let calendar = service.monthly_calendar(ALICE, 2026, 1).unwrap();
        let status_on = |day: u32| calendar.days[day as usize - 1].status;
        assert_eq!(calendar.days.len(), 31);
        assert_eq!(status_on(26), DayStatus::Holiday);
        assert_eq!(status_on(23), DayStatus::OnLeave);
        assert_eq!(status_on(27), DayStatus::OnLeave);
        assert_eq!(status_on(22), DayStatus::Wfh);
        assert_eq!(status_on(21), DayStatus::Unmarked);
        assert_eq!(status_on(28), DayStatus::Future);
        assert!(calendar.days[23].is_weekend);
        assert_eq!(calendar.days[25].label.as_deref(), Some("Republic Day"));
    }

    #[test]
    fn team_calendar_lists_approved_leave_in_window() {
        let service = fixture(d(2026, 2, 20)).service;
        for (who, start, end) in [
            (ALICE, d(2026, 3, 9), d(2026, 3, 10)),
            (BOB, d(2026, 3, 2), d(2026, 3, 3)),
            (BOB, d(2026, 4, 6), d(2026, 4, 6)),
        ] {
            let request = service.submit_leave_request(who, draft("LWP", start, end)).unwrap();
            service.approve_leave_request(request.id, MANAGER, String::new()).unwrap();
        }
        service
            .submit_leave_request(ALICE, draft("LWP", d(2026, 3, 16), d(2026, 3, 16)))
            .unwrap();

        let march = service.team_calendar(&[ALICE, BOB], Some(d(2026, 3, 1)), Some(d(2026, 3, 31)));
        let owners: Vec<EmployeeId> = march.iter().map(|r| r.employee_id).collect();
        assert_eq!(owners, vec![BOB, ALICE]);
        assert_eq!(service.team_calendar(&[ALICE, BOB], None, None).len(), 3);
    }
}
