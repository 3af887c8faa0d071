use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::employee::EmployeeId;

pub type RequestId = u64;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Pending and approved requests hold their dates.
    pub fn holds_dates(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: RequestId,

    #[schema(example = 1000)]
    pub employee_id: EmployeeId,

    #[schema(example = "CL")]
    pub leave_type: String,

    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,

    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,

    /// Fixed at submission
    #[schema(example = 3.0, value_type = f64)]
    pub total_days: Decimal,

    #[schema(example = false)]
    pub half_day: bool,

    #[schema(example = "Family function")]
    pub reason: String,

    #[schema(example = "leave_attachments/ticket.pdf", nullable = true)]
    pub attachment: Option<String>,

    pub status: LeaveStatus,

    #[schema(example = "2026-02-20T09:30:00Z", format = "date-time", value_type = String)]
    pub applied_at: DateTime<Utc>,

    #[schema(example = 10, nullable = true)]
    pub approved_by: Option<EmployeeId>,

    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub decision_at: Option<DateTime<Utc>>,

    #[schema(example = "")]
    pub manager_comments: String,

    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// Inclusive interval intersection with `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Ledger year the request is charged against.
    pub fn ledger_year(&self) -> i32 {
        use chrono::Datelike;
        self.start_date.year()
    }
}
