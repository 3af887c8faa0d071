use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

pub type EmployeeId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "employee_code": "EMP-001",
        "full_name": "John Doe",
        "role": "EMPLOYEE",
        "reporting_manager_id": 10,
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1000)]
    pub id: EmployeeId,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub full_name: String,

    pub role: Role,

    /// Direct reporting manager, if any
    #[schema(example = 10, nullable = true)]
    pub reporting_manager_id: Option<EmployeeId>,

    #[schema(example = true)]
    pub is_active: bool,
}

impl Employee {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
