use crate::api::visible_employees;
use crate::auth::auth::AuthUser;
use crate::domain::reports::{AttendanceSummaryReport, LeaveSummaryReport};
use crate::domain::service::HrmService;
use crate::model::employee::EmployeeId;
use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// Defaults to the current month
    pub month: Option<u32>,
    /// Narrow the report to one employee
    pub employee_id: Option<EmployeeId>,
}

impl ReportQuery {
    fn period(&self, service: &HrmService) -> (i32, u32) {
        let today = service.today();
        (
            self.year.unwrap_or(today.year()),
            self.month.unwrap_or(today.month()),
        )
    }
}

/// Monthly leave summary
#[utoipa::path(
    get,
    path = "/api/report/leave-summary",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per employee and leave type request counts", body = LeaveSummaryReport),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn leave_summary(
    auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let employees = visible_employees(&auth, &service, query.employee_id)?;
    let (year, month) = query.period(&service);
    let report = service.leave_summary(&employees, year, month)?;
    Ok(HttpResponse::Ok().json(report))
}

/// Monthly attendance summary
#[utoipa::path(
    get,
    path = "/api/report/attendance-summary",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per employee attendance figures", body = AttendanceSummaryReport),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let employees = visible_employees(&auth, &service, query.employee_id)?;
    let (year, month) = query.period(&service);
    let report = service.attendance_summary(&employees, year, month)?;
    Ok(HttpResponse::Ok().json(report))
}
