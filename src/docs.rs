use crate::api::attendance::{CorrectAttendance, MarkAttendance};
use crate::api::calendar::WorkingDays;
use crate::api::holiday::CreateHoliday;
use crate::api::leave_balance::{AdjustBalance, AllocateBalance};
use crate::api::leave_request::{DecisionBody, LeaveFilter, LeaveListResponse};
use crate::domain::leave_request::LeaveDraft;
use crate::domain::reports::{
    AttendanceSummaryReport, CalendarDay, DayStatus, EmployeeAttendanceSummary,
    EmployeeLeaveSummary, LeaveSummaryReport, LeaveTypeBreakdown, MonthlyCalendar,
};
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave_balance::{BalanceView, LeaveBalance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_type::LeaveType;
use crate::model::role::Role;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave & Attendance API",
        version = "1.0.0",
        description = r#"
## Leave and attendance core

### Key Features
- **Leave requests**: submit, approve, reject and cancel, with balance holds
- **Leave balances**: yearly allocation and admin adjustments per leave type
- **Attendance**: daily self-marking, admin marking and audited corrections
- **Holiday calendar**: declared holidays excluded from leave and attendance counts
- **Reports**: monthly leave and attendance summaries

### Security
Every endpoint requires a **JWT Bearer** access token. Allocation, adjustment,
corrections and the holiday calendar are admin only; leave decisions belong to
the reporting manager or an admin.

### Response Format
- JSON bodies; errors carry `{ "message", "code" }`
- Pagination on the leave list
"#,
    ),
    paths(
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::pending_leaves,
        crate::api::leave_request::team_calendar,

        crate::api::leave_balance::my_balances,
        crate::api::leave_balance::employee_balances,
        crate::api::leave_balance::allocate_balance,
        crate::api::leave_balance::adjust_balance,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::correct_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_calendar,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::report::leave_summary,
        crate::api::report::attendance_summary,

        crate::api::calendar::working_days
    ),
    components(
        schemas(
            LeaveDraft,
            LeaveRequest,
            LeaveStatus,
            LeaveFilter,
            LeaveListResponse,
            DecisionBody,
            LeaveType,
            LeaveBalance,
            BalanceView,
            AllocateBalance,
            AdjustBalance,
            Attendance,
            AttendanceStatus,
            MarkAttendance,
            CorrectAttendance,
            Holiday,
            CreateHoliday,
            Employee,
            Role,
            LeaveTypeBreakdown,
            EmployeeLeaveSummary,
            LeaveSummaryReport,
            EmployeeAttendanceSummary,
            AttendanceSummaryReport,
            DayStatus,
            CalendarDay,
            MonthlyCalendar,
            WorkingDays
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request lifecycle"),
        (name = "Balance", description = "Leave balance ledger"),
        (name = "Attendance", description = "Daily attendance ledger"),
        (name = "Holiday", description = "Holiday calendar"),
        (name = "Report", description = "Monthly summaries"),
        (name = "Calendar", description = "Working days and calendars"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
