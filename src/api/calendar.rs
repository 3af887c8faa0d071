use crate::auth::auth::AuthUser;
use crate::domain::service::HrmService;
use crate::error::{HrmError, ValidationError};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct RangeQuery {
    #[param(value_type = String, format = Date)]
    pub start: NaiveDate,
    #[param(value_type = String, format = Date)]
    pub end: NaiveDate,
    /// Defaults to the configured policy
    pub exclude_weekends: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkingDays {
    /// Days that are neither holidays nor (optionally) weekends
    pub working_days: u32,
    /// What a leave request over the same range would be charged
    pub leave_days: u32,
}

/// Count working days in a date range
#[utoipa::path(
    get,
    path = "/api/calendar/working-days",
    params(RangeQuery),
    responses(
        (status = 200, description = "Day counts for the inclusive range", body = WorkingDays),
        (status = 400, description = "Start after end")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn working_days(
    _auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    if query.start > query.end {
        return Err(HrmError::from(ValidationError::DateRange {
            start: query.start,
            end: query.end,
        })
        .into());
    }
    let exclude_weekends = query
        .exclude_weekends
        .unwrap_or(service.policy().exclude_weekends);

    Ok(HttpResponse::Ok().json(WorkingDays {
        working_days: service.working_days(query.start, query.end, exclude_weekends),
        leave_days: service.leave_days(query.start, query.end),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{bearer, config, state};
    use crate::domain::service::tests::{ALICE, d};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::Value;

    #[actix_web::test]
    async fn counts_around_republic_day() {
        let (service, _) = state(d(2026, 1, 5));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .app_data(service)
                .route("/api/calendar/working-days", web::get().to(working_days)),
        )
        .await;

        // Sat 24th to Fri 30th, Monday 26th is a holiday
        let req = test::TestRequest::get()
            .uri("/api/calendar/working-days?start=2026-01-24&end=2026-01-30")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["working_days"], 4);
        assert_eq!(body["leave_days"], 4);

        let req = test::TestRequest::get()
            .uri("/api/calendar/working-days?start=2026-01-24&end=2026-01-30&exclude_weekends=false")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["working_days"], 6);

        let req = test::TestRequest::get()
            .uri("/api/calendar/working-days?start=2026-01-30&end=2026-01-24")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
