use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "2026-01-26", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "Republic Day")]
    pub name: String,

    #[schema(example = false)]
    pub is_optional: bool,

    #[schema(example = "")]
    pub description: String,
}
