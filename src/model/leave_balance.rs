use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::employee::EmployeeId;

/// One (employee, leave type, year) account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: EmployeeId,

    #[schema(example = "CL")]
    pub leave_type: String,

    #[schema(example = 2026)]
    pub year: i32,

    #[schema(example = 10.0, value_type = f64)]
    pub allocated: Decimal,

    #[schema(example = 3.0, value_type = f64)]
    pub used: Decimal,

    /// Signed admin correction, set directly rather than accumulated
    #[schema(example = 0.0, value_type = f64)]
    pub adjusted: Decimal,

    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    pub fn available(&self) -> Decimal {
        self.allocated
            .saturating_add(self.adjusted)
            .saturating_sub(self.used)
    }
}

/// Balance as reported to callers, with the derived `available` figure.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceView {
    #[schema(example = 1000)]
    pub employee_id: EmployeeId,
    #[schema(example = "CL")]
    pub leave_type: String,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 10.0, value_type = f64)]
    pub allocated: Decimal,
    #[schema(example = 3.0, value_type = f64)]
    pub used: Decimal,
    #[schema(example = 0.0, value_type = f64)]
    pub adjusted: Decimal,
    #[schema(example = 7.0, value_type = f64)]
    pub available: Decimal,
}

impl From<&LeaveBalance> for BalanceView {
    fn from(balance: &LeaveBalance) -> Self {
        Self {
            employee_id: balance.employee_id,
            leave_type: balance.leave_type.clone(),
            year: balance.year,
            allocated: balance.allocated,
            used: balance.used,
            adjusted: balance.adjusted,
            available: balance.available(),
        }
    }
}
