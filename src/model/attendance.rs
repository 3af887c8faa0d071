use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::employee::EmployeeId;

pub type AttendanceId = u64;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Wfh,
    HalfDay,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: AttendanceId,

    #[schema(example = 1000)]
    pub employee_id: EmployeeId,

    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = 1000)]
    pub marked_by: EmployeeId,

    #[schema(example = true)]
    pub is_self_marked: bool,

    #[schema(example = "")]
    pub correction_reason: String,

    #[schema(example = "2026-03-02T09:00:00Z", format = "date-time", value_type = String)]
    pub marked_at: DateTime<Utc>,

    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub corrected_at: Option<DateTime<Utc>>,
}
