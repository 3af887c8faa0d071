use crate::auth::auth::AuthUser;
use crate::domain::audit::AuditKind;
use crate::domain::calendar::HolidayCalendar;
use crate::domain::service::HrmService;
use crate::error::{HrmError, NotFoundError};
use crate::model::holiday::Holiday;
use crate::store::{LedgerRow, Store};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2026-08-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Independence Day")]
    pub name: String,
    #[serde(default)]
    #[schema(example = false)]
    pub is_optional: bool,
    #[serde(default)]
    #[schema(example = "")]
    pub description: String,
}

#[derive(Deserialize, IntoParams)]
pub struct HolidayQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// Holidays of a year
#[utoipa::path(
    get,
    path = "/api/holiday",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holidays ordered by date", body = Vec<Holiday>)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    service: web::Data<HrmService>,
    calendar: web::Data<HolidayCalendar>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| service.today().year());
    Ok(HttpResponse::Ok().json(calendar.for_year(year)))
}

/// Declare a holiday (admin)
#[utoipa::path(
    post,
    path = "/api/holiday",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday declared", body = Holiday),
        (status = 400, description = "A holiday already exists on that date"),
        (status = 403, description = "Admin only"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    service: web::Data<HrmService>,
    calendar: web::Data<HolidayCalendar>,
    store: web::Data<Store>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let body = payload.into_inner();
    let holiday = store
        .commit_calendar(
            || calendar.declare(body.date, body.name, body.is_optional, body.description),
            |holiday| vec![LedgerRow::Holiday(holiday.clone())],
            |holiday| {
                calendar.remove(holiday.date);
            },
        )
        .await?;

    tracing::info!(date = %holiday.date, name = %holiday.name, "Holiday declared");
    service.record_event(
        AuditKind::HolidayCreated,
        Some(auth.employee_id),
        "Holiday",
        holiday.id,
        json!({ "date": holiday.date, "name": holiday.name }),
    );
    Ok(HttpResponse::Created().json(holiday))
}

/// Remove a holiday (admin)
#[utoipa::path(
    delete,
    path = "/api/holiday/{date}",
    params(
        ("date" = String, Path, description = "Date of the holiday, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Holiday removed", body = Holiday),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No holiday on that date"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    service: web::Data<HrmService>,
    calendar: web::Data<HolidayCalendar>,
    store: web::Data<Store>,
    path: web::Path<NaiveDate>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = path.into_inner();
    let holiday = store
        .commit_calendar(
            || calendar.remove(date).ok_or(HrmError::from(NotFoundError::Holiday(date))),
            |holiday| vec![LedgerRow::HolidayRemoved(holiday.date)],
            |holiday| calendar.load(holiday.clone()),
        )
        .await?;

    tracing::info!(%date, name = %holiday.name, "Holiday removed");
    service.record_event(
        AuditKind::HolidayDeleted,
        Some(auth.employee_id),
        "Holiday",
        holiday.id,
        json!({ "date": holiday.date, "name": holiday.name }),
    );
    Ok(HttpResponse::Ok().json(holiday))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{bearer, config, failing_store, memory_store, state};
    use crate::domain::calendar::HolidayLookup;
    use crate::domain::service::tests::{ADMIN, ALICE, d};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::Value;

    #[actix_web::test]
    async fn admins_manage_the_calendar() {
        let (service, calendar) = state(d(2026, 3, 2));
        let (store, writer) = memory_store();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .app_data(service.clone())
                .app_data(calendar.clone())
                .app_data(store)
                .route("/api/holiday", web::get().to(list_holidays))
                .route("/api/holiday", web::post().to(create_holiday))
                .route("/api/holiday/{date}", web::delete().to(delete_holiday)),
        )
        .await;

        let holiday = json!({ "date": "2026-08-15", "name": "Independence Day" });
        let req = test::TestRequest::post()
            .uri("/api/holiday")
            .insert_header(bearer(ALICE, Role::Employee))
            .set_json(&holiday)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/holiday")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(&holiday)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        assert!(calendar.is_holiday(d(2026, 8, 15)));

        let req = test::TestRequest::post()
            .uri("/api/holiday")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(&holiday)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/holiday?year=2026")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        let listed: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);

        let req = test::TestRequest::delete()
            .uri("/api/holiday/2026-08-15")
            .insert_header(bearer(ADMIN, Role::Admin))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/api/holiday/2026-08-15")
            .insert_header(bearer(ADMIN, Role::Admin))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let rows = writer.rows();
        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], LedgerRow::Holiday(h) if h.name == "Independence Day"));
        assert_eq!(rows[1], LedgerRow::HolidayRemoved(d(2026, 8, 15)));
    }

    #[actix_web::test]
    async fn unsaved_calendar_changes_are_reverted() {
        let (service, calendar) = state(d(2026, 3, 2));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .app_data(service.clone())
                .app_data(calendar.clone())
                .app_data(failing_store())
                .route("/api/holiday", web::post().to(create_holiday))
                .route("/api/holiday/{date}", web::delete().to(delete_holiday)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/holiday")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(json!({ "date": "2026-08-15", "name": "Independence Day" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(!calendar.is_holiday(d(2026, 8, 15)));

        let req = test::TestRequest::delete()
            .uri("/api/holiday/2026-01-26")
            .insert_header(bearer(ADMIN, Role::Admin))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(calendar.is_holiday(d(2026, 1, 26)));
    }
}
