use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Leave type master data (CL, SL, EL, LWP, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "CL")]
    pub code: String,

    #[schema(example = "Casual Leave")]
    pub name: String,

    #[schema(example = true)]
    pub is_paid: bool,

    /// An attachment reference must accompany requests of this type
    #[schema(example = false)]
    pub requires_documentation: bool,

    /// Longest single request allowed, in days
    #[schema(example = 5, nullable = true)]
    pub max_consecutive_days: Option<u32>,

    #[schema(example = "")]
    pub description: String,
}
