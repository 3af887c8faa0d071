use crate::api::require_view;
use crate::auth::auth::AuthUser;
use crate::domain::reports::{MonthlyCalendar, month_bounds};
use crate::domain::service::HrmService;
use crate::model::attendance::{Attendance, AttendanceId, AttendanceStatus};
use crate::model::employee::EmployeeId;
use crate::store::{Store, attendance_rows};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    /// Defaults to the caller; marking for someone else is admin only
    #[schema(example = 1000, nullable = true)]
    pub employee_id: Option<EmployeeId>,
    /// Defaults to today
    #[schema(example = "2026-03-02", format = "date", value_type = String, nullable = true)]
    pub date: Option<NaiveDate>,
    pub status: AttendanceStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct CorrectAttendance {
    pub status: AttendanceStatus,
    #[schema(example = "forgot to mark WFH")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
pub struct MonthQuery {
    /// Defaults to the caller
    pub employee_id: Option<EmployeeId>,
    /// Defaults to the current year
    pub year: Option<i32>,
    /// Defaults to the current month
    pub month: Option<u32>,
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Attendance),
        (status = 403, description = "Self-marking is for today only, or not an admin"),
        (status = 404, description = "Unknown employee"),
        (status = 409, description = "Holiday, or already marked by an admin"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let body = payload.into_inner();
    let employee_id = body.employee_id.unwrap_or(auth.employee_id);
    auth.require_employee(employee_id)?;
    let date = body.date.unwrap_or_else(|| service.today());

    let record = store
        .commit(
            &service,
            employee_id,
            |service| service.mark_attendance(employee_id, date, body.status, auth.employee_id),
            attendance_rows,
        )
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Correct an attendance record (admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/correct",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance record to correct")
    ),
    request_body = CorrectAttendance,
    responses(
        (status = 200, description = "Attendance corrected", body = Attendance),
        (status = 400, description = "Reason too short"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Attendance record not found"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn correct_attendance(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    path: web::Path<AttendanceId>,
    payload: web::Json<CorrectAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let owner = service.get_attendance(id)?.employee_id;
    let body = payload.into_inner();
    let record = store
        .commit(
            &service,
            owner,
            |service| service.correct_attendance(id, auth.employee_id, body.status, &body.reason),
            attendance_rows,
        )
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Attendance records for a month
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(MonthQuery),
    responses(
        (status = 200, description = "Marked days of the month", body = Vec<Attendance>),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = query.employee_id.unwrap_or(auth.employee_id);
    require_view(&auth, &service, employee_id)?;

    let today = service.today();
    let (first, last) = month_bounds(
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month()),
    )?;
    Ok(HttpResponse::Ok().json(service.attendance_between(employee_id, first, last)))
}

/// Day-by-day attendance calendar
#[utoipa::path(
    get,
    path = "/api/attendance/calendar",
    params(MonthQuery),
    responses(
        (status = 200, description = "One entry per day of the month", body = MonthlyCalendar),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn attendance_calendar(
    auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = query.employee_id.unwrap_or(auth.employee_id);
    require_view(&auth, &service, employee_id)?;

    let today = service.today();
    let calendar = service.monthly_calendar(
        employee_id,
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month()),
    )?;
    Ok(HttpResponse::Ok().json(calendar))
}
