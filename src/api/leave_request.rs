use crate::api::{require_view, visible_employees};
use crate::auth::auth::AuthUser;
use crate::domain::leave_request::LeaveDraft;
use crate::domain::service::HrmService;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, RequestId};
use crate::store::{Store, request_rows};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "PENDING")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct DecisionBody {
    #[serde(default)]
    #[schema(example = "Enjoy your break")]
    pub comments: String,
}

#[derive(Deserialize, IntoParams)]
pub struct WindowQuery {
    /// Inclusive window start
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Inclusive window end
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

/// Reporting manager of the owner, or an admin. Nobody decides their own request.
fn require_decider(
    auth: &AuthUser,
    service: &HrmService,
    request: &LeaveRequest,
) -> actix_web::Result<()> {
    if request.employee_id == auth.employee_id {
        return Err(actix_web::error::ErrorForbidden(
            "Cannot decide your own leave request",
        ));
    }
    if auth.is_admin() || service.is_reporting_manager(auth.employee_id, request.employee_id) {
        Ok(())
    } else {
        Err(actix_web::error::ErrorForbidden(
            "Only the reporting manager or an admin may decide",
        ))
    }
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveDraft,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates, overlap or leave type constraint"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown leave type"),
        (status = 422, description = "No balance or insufficient balance"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    payload: web::Json<LeaveDraft>,
) -> actix_web::Result<impl Responder> {
    let draft = payload.into_inner();
    let request = store
        .commit(
            &service,
            auth.employee_id,
            |service| service.submit_leave_request(auth.employee_id, draft),
            request_rows,
        )
        .await?;
    Ok(HttpResponse::Created().json(request))
}

/* =========================
Approve leave (manager/admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 403, description = "Not the reporting manager"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is not pending"),
        (status = 422, description = "Insufficient balance"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    path: web::Path<RequestId>,
    payload: web::Json<DecisionBody>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = service.get_leave_request(leave_id)?;
    require_decider(&auth, &service, &request)?;

    let comments = payload.into_inner().comments;
    let approved = store
        .commit(
            &service,
            request.employee_id,
            |service| service.approve_leave_request(leave_id, auth.employee_id, comments),
            request_rows,
        )
        .await?;
    Ok(HttpResponse::Ok().json(approved))
}

/* =========================
Reject leave (manager/admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 403, description = "Not the reporting manager"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is not pending"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    path: web::Path<RequestId>,
    payload: web::Json<DecisionBody>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = service.get_leave_request(leave_id)?;
    require_decider(&auth, &service, &request)?;

    let comments = payload.into_inner().comments;
    let rejected = store
        .commit(
            &service,
            request.employee_id,
            |service| service.reject_leave_request(leave_id, auth.employee_id, comments),
            request_rows,
        )
        .await?;
    Ok(HttpResponse::Ok().json(rejected))
}

/* =========================
Cancel leave (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already rejected or cancelled"),
        (status = 503, description = "Change could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<HrmService>,
    store: web::Data<Store>,
    path: web::Path<RequestId>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = service.get_leave_request(leave_id)?;
    if request.employee_id != auth.employee_id {
        return Err(actix_web::error::ErrorForbidden(
            "Only the requester may cancel a leave request",
        ));
    }

    let cancelled = store
        .commit(
            &service,
            request.employee_id,
            |service| service.cancel_leave_request(leave_id, auth.employee_id),
            request_rows,
        )
        .await?;
    Ok(HttpResponse::Ok().json(cancelled))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<HrmService>,
    path: web::Path<RequestId>,
) -> actix_web::Result<impl Responder> {
    let request = service.get_leave_request(path.into_inner())?;
    require_view(&auth, &service, request.employee_id)?;
    Ok(HttpResponse::Ok().json(request))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    let employees = visible_employees(&auth, &service, query.employee_id)?;
    let leaves = service.requests_for_all(&employees, query.status);
    let total = leaves.len();
    let offset = (page as usize - 1).saturating_mul(per_page as usize);
    let data = leaves
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Pending requests awaiting the caller's decision
#[utoipa::path(
    get,
    path = "/api/leave/pending",
    responses(
        (status = 200, description = "Pending requests of the caller's team", body = Vec<LeaveRequest>),
        (status = 403, description = "Manager/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    service: web::Data<HrmService>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let pending = if auth.is_admin() {
        service
            .all_requests(Some(LeaveStatus::Pending))
            .into_iter()
            .filter(|r| r.employee_id != auth.employee_id)
            .collect()
    } else {
        service.pending_for_team(auth.employee_id)
    };
    Ok(HttpResponse::Ok().json(pending))
}

/// Approved leave of the caller's team
#[utoipa::path(
    get,
    path = "/api/leave/team-calendar",
    params(WindowQuery),
    responses(
        (status = 200, description = "Approved leave in the window", body = Vec<LeaveRequest>),
        (status = 403, description = "Manager/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn team_calendar(
    auth: AuthUser,
    service: web::Data<HrmService>,
    query: web::Query<WindowQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let employees = visible_employees(&auth, &service, None)?;
    let leaves = service.team_calendar(&employees, query.from, query.to);
    Ok(HttpResponse::Ok().json(leaves))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{bearer, config, failing_store, memory_store, state};
    use crate::store::LedgerRow;
    use crate::domain::service::tests::{ADMIN, ALICE, BOB, MANAGER, d, draft};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    macro_rules! app {
        ($service:expr) => {
            app!($service, memory_store().0)
        };
        ($service:expr, $store:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new(config()))
                    .app_data($service.clone())
                    .app_data($store.clone())
                    .service(
                        web::scope("/api/leave")
                            .route("", web::post().to(submit_leave))
                            .route("", web::get().to(leave_list))
                            .route("/pending", web::get().to(pending_leaves))
                            .route("/{id}", web::get().to(get_leave))
                            .route("/{id}/approve", web::put().to(approve_leave))
                            .route("/{id}/reject", web::put().to(reject_leave))
                            .route("/{id}/cancel", web::put().to(cancel_leave)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn submit_approve_and_cancel_over_http() {
        let (service, _) = state(d(2026, 2, 20));
        service.allocate_balance(ALICE, "CL", 2026, dec!(10), ADMIN).unwrap();
        let app = app!(service);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(ALICE, Role::Employee))
            .set_json(json!({
                "leave_type": "CL",
                "start_date": "2026-03-02",
                "end_date": "2026-03-04",
                "reason": "family function"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["status"], "PENDING");
        let id = created["id"].as_u64().unwrap();

        // a colleague cannot approve
        let req = test::TestRequest::put()
            .uri(&format!("/api/leave/{id}/approve"))
            .insert_header(bearer(BOB, Role::Employee))
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&format!("/api/leave/{id}/approve"))
            .insert_header(bearer(MANAGER, Role::Manager))
            .set_json(json!({ "comments": "ok" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert_eq!(service.get_available_balance(ALICE, "CL", 2026), Ok(dec!(7)));

        // only the owner cancels
        let req = test::TestRequest::put()
            .uri(&format!("/api/leave/{id}/cancel"))
            .insert_header(bearer(MANAGER, Role::Manager))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&format!("/api/leave/{id}/cancel"))
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert_eq!(service.get_available_balance(ALICE, "CL", 2026), Ok(dec!(10)));
    }

    #[actix_web::test]
    async fn domain_errors_carry_status_and_code() {
        let (service, _) = state(d(2026, 2, 20));
        let app = app!(service);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(ALICE, Role::Employee))
            .set_json(json!({
                "leave_type": "CL",
                "start_date": "2026-03-02",
                "end_date": "2026-03-02",
                "reason": "dentist"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "BALANCE_NOT_FOUND");

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(ALICE, Role::Employee))
            .set_json(json!({
                "leave_type": "LWP",
                "start_date": "2026-03-05",
                "end_date": "2026-03-02",
                "reason": "dentist"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/leave/999")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/leave").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn listing_is_scoped_by_role() {
        let (service, _) = state(d(2026, 2, 20));
        for (who, day) in [(ALICE, 2), (BOB, 3)] {
            service
                .submit_leave_request(who, draft("LWP", d(2026, 3, day), d(2026, 3, day)))
                .unwrap();
        }
        let app = app!(service);

        let req = test::TestRequest::get()
            .uri("/api/leave")
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["total"], 1);

        let req = test::TestRequest::get()
            .uri("/api/leave/pending")
            .insert_header(bearer(MANAGER, Role::Manager))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/leave?employee_id={BOB}"))
            .insert_header(bearer(ALICE, Role::Employee))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn pages_past_the_end_are_empty() {
        let (service, _) = state(d(2026, 2, 20));
        service
            .submit_leave_request(ALICE, draft("LWP", d(2026, 3, 2), d(2026, 3, 2)))
            .unwrap();
        let app = app!(service);

        for uri in [
            "/api/leave?page=2",
            "/api/leave?page=4294967295&per_page=100",
            "/api/leave?page=4294967295&per_page=4294967295",
        ] {
            let req = test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer(ALICE, Role::Employee))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["total"], 1);
            assert!(body["data"].as_array().unwrap().is_empty(), "{uri}");
        }
    }

    #[actix_web::test]
    async fn decisions_are_written_through() {
        let (service, _) = state(d(2026, 2, 20));
        service.allocate_balance(ALICE, "CL", 2026, dec!(10), ADMIN).unwrap();
        let (store, writer) = memory_store();
        let app = app!(service, store);

        let req = test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(bearer(ALICE, Role::Employee))
            .set_json(json!({
                "leave_type": "CL",
                "start_date": "2026-03-02",
                "end_date": "2026-03-02",
                "reason": "dentist"
            }))
            .to_request();
        let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let id = created["id"].as_u64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/leave/{id}/reject"))
            .insert_header(bearer(MANAGER, Role::Manager))
            .set_json(json!({ "comments": "quarter end" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let statuses: Vec<LeaveStatus> = writer
            .rows()
            .into_iter()
            .filter_map(|row| match row {
                LedgerRow::Request(r) if r.id == id => Some(r.status),
                _ => None,
            })
            .collect();
        assert_eq!(statuses, vec![LeaveStatus::Pending, LeaveStatus::Rejected]);
    }

    #[actix_web::test]
    async fn unsaved_approval_is_undone() {
        let (service, _) = state(d(2026, 2, 20));
        service.allocate_balance(ALICE, "CL", 2026, dec!(10), ADMIN).unwrap();
        let request = service
            .submit_leave_request(ALICE, draft("CL", d(2026, 3, 2), d(2026, 3, 4)))
            .unwrap();
        let app = app!(service, failing_store());

        let req = test::TestRequest::put()
            .uri(&format!("/api/leave/{}/approve", request.id))
            .insert_header(bearer(MANAGER, Role::Manager))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "STORAGE_UNAVAILABLE");

        assert_eq!(
            service.get_leave_request(request.id).unwrap().status,
            LeaveStatus::Pending
        );
        assert_eq!(service.get_available_balance(ALICE, "CL", 2026), Ok(dec!(10)));
    }
}
