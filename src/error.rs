use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::{Display, From};
use rust_decimal::Decimal;
use serde_json::json;

use crate::model::attendance::AttendanceId;
use crate::model::employee::EmployeeId;
use crate::model::leave_request::{LeaveStatus, RequestId};

pub type HrmResult<T> = Result<T, HrmError>;

/// Rejected input; nothing was mutated.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ValidationError {
    #[display(fmt = "start date {} is after end date {}", start, end)]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[display(
        fmt = "leave request overlaps with existing request {} ({} to {})",
        existing,
        start,
        end
    )]
    Overlap {
        existing: RequestId,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[display(fmt = "no countable leave days between {} and {}", start, end)]
    NoCountableDays { start: NaiveDate, end: NaiveDate },

    #[display(fmt = "half-day leave must start and end on the same date")]
    HalfDayRange,

    #[display(
        fmt = "{} allows at most {} consecutive days, requested {}",
        leave_type,
        max,
        requested
    )]
    ExceedsMaxConsecutiveDays {
        leave_type: String,
        max: u32,
        requested: Decimal,
    },

    #[display(fmt = "{} leave requires a supporting document", leave_type)]
    AttachmentRequired { leave_type: String },

    #[display(fmt = "a holiday is already declared on {}", date)]
    DuplicateHoliday { date: NaiveDate },

    #[display(fmt = "leave type code {} is already registered", code)]
    DuplicateLeaveType { code: String },

    #[display(fmt = "day amount must not be negative, got {}", amount)]
    NegativeAmount { amount: Decimal },

    #[display(
        fmt = "day amount {} must be within 1000 days and use at most one decimal place",
        amount
    )]
    AmountOutOfRange { amount: Decimal },

    #[display(fmt = "correction reason must be at least 5 characters long")]
    CorrectionReasonTooShort,

    #[display(fmt = "{}-{} is not a valid month", year, month)]
    InvalidMonth { year: i32, month: u32 },

    #[display(fmt = "employee {} cannot report to {}: reporting cycle", employee, manager)]
    ReportingCycle {
        employee: EmployeeId,
        manager: EmployeeId,
    },
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum BalanceError {
    #[display(
        fmt = "insufficient balance. Available: {}, Requested: {}",
        available,
        requested
    )]
    Insufficient {
        available: Decimal,
        requested: Decimal,
    },

    #[display(fmt = "no leave balance found for {} in {}", leave_type, year)]
    NotFound { leave_type: String, year: i32 },

    #[display(
        fmt = "available balance cannot be negative for paid leave, would be {}",
        available
    )]
    Negative { available: Decimal },

    #[display(fmt = "leave balance already allocated for {} in {}", leave_type, year)]
    DuplicateAllocation { leave_type: String, year: i32 },
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum StateError {
    #[display(fmt = "cannot {} leave request {} in status {}", action, id, from)]
    InvalidTransition {
        id: RequestId,
        from: LeaveStatus,
        action: &'static str,
    },
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum AttendanceError {
    #[display(fmt = "cannot mark attendance on a holiday: {} ({})", date, name)]
    HolidayConflict { date: NaiveDate, name: String },

    #[display(
        fmt = "employees can only mark attendance for today, not {}",
        date
    )]
    AdminOnlyDate { date: NaiveDate },

    #[display(fmt = "attendance for {} was marked by an admin and cannot be re-marked", date)]
    LockedByAdmin { date: NaiveDate },
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum PermissionError {
    #[display(fmt = "only admins can correct attendance (actor {})", actor)]
    AdminRequired { actor: EmployeeId },
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum NotFoundError {
    #[display(fmt = "leave request {} not found", _0)]
    LeaveRequest(RequestId),
    #[display(fmt = "attendance record {} not found", _0)]
    Attendance(AttendanceId),
    #[display(fmt = "leave type {} not found", _0)]
    LeaveType(String),
    #[display(fmt = "employee {} not found", _0)]
    Employee(EmployeeId),
    #[display(fmt = "no holiday on {}", _0)]
    Holiday(NaiveDate),
}

/// The durable write behind a mutation failed; the mutation was undone.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum StorageError {
    #[display(fmt = "changes could not be saved, please retry")]
    WriteFailed,
}

#[derive(Debug, Display, From, Clone, PartialEq)]
pub enum HrmError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),
    #[display(fmt = "{}", _0)]
    Balance(BalanceError),
    #[display(fmt = "{}", _0)]
    State(StateError),
    #[display(fmt = "{}", _0)]
    Attendance(AttendanceError),
    #[display(fmt = "{}", _0)]
    Permission(PermissionError),
    #[display(fmt = "{}", _0)]
    NotFound(NotFoundError),
    #[display(fmt = "{}", _0)]
    Storage(StorageError),
}

impl std::error::Error for HrmError {}

impl HrmError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            HrmError::Validation(ValidationError::DateRange { .. }) => "DATE_RANGE",
            HrmError::Validation(ValidationError::Overlap { .. }) => "OVERLAP",
            HrmError::Validation(ValidationError::AmountOutOfRange { .. }) => "AMOUNT_OUT_OF_RANGE",
            HrmError::Validation(_) => "VALIDATION",
            HrmError::Balance(BalanceError::Insufficient { .. }) => "INSUFFICIENT_BALANCE",
            HrmError::Balance(BalanceError::NotFound { .. }) => "BALANCE_NOT_FOUND",
            HrmError::Balance(BalanceError::Negative { .. }) => "NEGATIVE_BALANCE",
            HrmError::Balance(BalanceError::DuplicateAllocation { .. }) => "DUPLICATE_ALLOCATION",
            HrmError::State(_) => "INVALID_TRANSITION",
            HrmError::Attendance(AttendanceError::HolidayConflict { .. }) => "HOLIDAY_CONFLICT",
            HrmError::Attendance(AttendanceError::AdminOnlyDate { .. }) => "ADMIN_ONLY_DATE",
            HrmError::Attendance(AttendanceError::LockedByAdmin { .. }) => "LOCKED_BY_ADMIN",
            HrmError::Permission(_) => "PERMISSION_DENIED",
            HrmError::NotFound(_) => "NOT_FOUND",
            HrmError::Storage(_) => "STORAGE_UNAVAILABLE",
        }
    }
}

impl ResponseError for HrmError {
    fn status_code(&self) -> StatusCode {
        match self {
            HrmError::Validation(_) => StatusCode::BAD_REQUEST,
            HrmError::Balance(BalanceError::DuplicateAllocation { .. }) => StatusCode::CONFLICT,
            HrmError::Balance(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HrmError::State(_) => StatusCode::CONFLICT,
            HrmError::Attendance(AttendanceError::AdminOnlyDate { .. }) => StatusCode::FORBIDDEN,
            HrmError::Attendance(_) => StatusCode::CONFLICT,
            HrmError::Permission(_) => StatusCode::FORBIDDEN,
            HrmError::NotFound(_) => StatusCode::NOT_FOUND,
            HrmError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string(),
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn balance_errors_map_to_unprocessable() {
        let err: HrmError = BalanceError::Insufficient {
            available: dec!(2),
            requested: dec!(3),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(
            err.to_string(),
            "insufficient balance. Available: 2, Requested: 3"
        );
    }

    #[test]
    fn duplicate_allocation_is_a_conflict() {
        let err: HrmError = BalanceError::DuplicateAllocation {
            leave_type: "CL".into(),
            year: 2026,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_transition_names_the_status() {
        let err: HrmError = StateError::InvalidTransition {
            id: 7,
            from: LeaveStatus::Rejected,
            action: "approve",
        }
        .into();
        assert_eq!(err.to_string(), "cannot approve leave request 7 in status REJECTED");
    }

    #[test]
    fn storage_failures_are_retryable() {
        let err: HrmError = StorageError::WriteFailed.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "STORAGE_UNAVAILABLE");

        let err: HrmError = ValidationError::AmountOutOfRange { amount: Decimal::MAX }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "AMOUNT_OUT_OF_RANGE");
    }
}
