use crate::api::require_view;
use crate::auth::auth::AuthUser;
use crate::domain::service::HrmService;
use crate::model::employee::EmployeeId;
use crate::model::leave_balance::{BalanceView, LeaveBalance};
use crate::store::{Store, balance_rows};
use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct AllocateBalance {
    #[schema(example = 1000)]
    pub employee_id: EmployeeId,
    #[schema(example = "CL")]
    pub leave_type: String,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 12.0, value_type = f64)]
    pub days: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustBalance {
    #[schema(example = 1000)]
    pub employee_id: EmployeeId,
    #[schema(example = "CL")]
    pub leave_type: String,
    #[schema(example = 2026)]
    pub year: i32,
    /// New value of the signed adjustment, replacing the previous one
    #[schema(example = -1.5, value_type = f64)]
    pub adjusted: Decimal,
}

#[derive(Deserialize, IntoParams)]
pub struct YearQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// Balances of the caller
#[utoipa::path(
    get,
    path = "/api/balance",
    params(YearQuery),
    responses(
        (status = 200, description = "Leave balances for the year", body = Vec<BalanceView>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn my_balances(
    auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| service.today().year());
    Ok(HttpResponse::Ok().json(service.balances_for(auth.employee_id, year)))
}

/// Balances of one employee
#[utoipa::path(
    get,
    path = "/api/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balances to fetch"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Leave balances for the year", body = Vec<BalanceView>),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn employee_balances(
    auth: AuthUser,
    service: web::Data<HrmService>,
    path: web::Path<EmployeeId>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    require_view(&auth, &service, employee_id)?;

    let year = query.year.unwrap_or_else(|| service.today().year());
    Ok(HttpResponse::Ok().json(service.balances_for(employee_id, year)))
}

/* =========================
Allocate balance (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/balance",
    request_body = AllocateBalance,
    responses(
        (status = 201, description = "Balance allocated", body = LeaveBalance),
        (status = 400, description = "Negative, oversized or too finely divided amount"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown employee or leave type"),
        (status = 409, description = "Already allocated for this year"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn allocate_balance(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    payload: web::Json<AllocateBalance>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let body = payload.into_inner();
    let balance = store
        .commit(
            &service,
            body.employee_id,
            |service| {
                service.allocate_balance(
                    body.employee_id,
                    &body.leave_type,
                    body.year,
                    body.days,
                    auth.employee_id,
                )
            },
            balance_rows,
        )
        .await?;
    Ok(HttpResponse::Created().json(balance))
}

/* =========================
Adjust balance (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/balance/adjust",
    request_body = AdjustBalance,
    responses(
        (status = 200, description = "Balance adjusted", body = LeaveBalance),
        (status = 400, description = "Oversized or too finely divided amount"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown leave type"),
        (status = 422, description = "No balance, or paid balance would go negative"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn adjust_balance(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    payload: web::Json<AdjustBalance>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let body = payload.into_inner();
    let balance = store
        .commit(
            &service,
            body.employee_id,
            |service| {
                service.adjust_balance(
                    body.employee_id,
                    &body.leave_type,
                    body.year,
                    body.adjusted,
                    auth.employee_id,
                )
            },
            balance_rows,
        )
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{bearer, config, memory_store, state};
    use crate::domain::service::tests::{ADMIN, ALICE, BOB, d};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn admins_allocate_and_employees_read() {
        let (service, _) = state(d(2026, 2, 20));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .app_data(service.clone())
                .app_data(memory_store().0)
                .route("/api/balance", web::get().to(my_balances))
                .route("/api/balance", web::post().to(allocate_balance))
                .route("/api/balance/adjust", web::put().to(adjust_balance))
                .route("/api/balance/{employee_id}", web::get().to(employee_balances)),
        )
        .await;

        let allocation = json!({ "employee_id": ALICE, "leave_type": "CL", "year": 2026, "days": 12 });
        let req = test::TestRequest::post()
            .uri("/api/balance")
            .insert_header(bearer(ALICE, Role::Employee))
            .set_json(&allocation)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/balance")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(&allocation)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/balance")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(&allocation)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::put()
            .uri("/api/balance/adjust")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(json!({ "employee_id": ALICE, "leave_type": "CL", "year": 2026, "adjusted": -2 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/balance?year=2026")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body[0]["available"], json!(10.0));

        let req = test::TestRequest::get()
            .uri(&format!("/api/balance/{ALICE}"))
            .insert_header(bearer(BOB, Role::Employee))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn out_of_range_amounts_are_bad_requests() {
        let (service, _) = state(d(2026, 2, 20));
        let (store, writer) = memory_store();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .app_data(service.clone())
                .app_data(store)
                .route("/api/balance", web::get().to(my_balances))
                .route("/api/balance", web::post().to(allocate_balance))
                .route("/api/balance/adjust", web::put().to(adjust_balance)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/balance")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(json!({ "employee_id": ALICE, "leave_type": "CL", "year": 2026, "days": 1e20 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "AMOUNT_OUT_OF_RANGE");

        let req = test::TestRequest::post()
            .uri("/api/balance")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(json!({ "employee_id": ALICE, "leave_type": "CL", "year": 2026, "days": 12 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::put()
            .uri("/api/balance/adjust")
            .insert_header(bearer(ADMIN, Role::Admin))
            .set_json(json!({ "employee_id": ALICE, "leave_type": "CL", "year": 2026, "adjusted": -1e25 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        // the employee's ledger is still usable after the rejected inputs
        let req = test::TestRequest::get()
            .uri("/api/balance?year=2026")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body[0]["available"], json!(12.0));
        assert_eq!(writer.rows().len(), 1);
    }
}
