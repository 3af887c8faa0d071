use crate::{
    api::{attendance, calendar, holiday, leave_balance, leave_request, report},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Milliseconds between replenished requests for a per-minute budget.
fn request_interval_ms(requests_per_min: u32) -> u64 {
    (60_000 / u64::from(requests_per_min.max(1))).max(1)
}

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(request_interval_ms(requests_per_min))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("limiter period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let decision_limiter = Arc::new(build_limiter(config.rate_decision_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::submit_leave)),
                    )
                    // fixed segments before /{id}
                    .service(
                        web::resource("/pending").route(web::get().to(leave_request::pending_leaves)),
                    )
                    .service(
                        web::resource("/team-calendar")
                            .route(web::get().to(leave_request::team_calendar)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    .service(
                        web::resource("/{id}/approve")
                            .wrap(decision_limiter.clone())
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .wrap(decision_limiter.clone())
                            .route(web::put().to(leave_request::reject_leave)),
                    )
                    .service(
                        web::resource("/{id}/cancel")
                            .wrap(decision_limiter.clone())
                            .route(web::put().to(leave_request::cancel_leave)),
                    ),
            )
            .service(
                web::scope("/balance")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_balance::my_balances))
                            .route(web::post().to(leave_balance::allocate_balance)),
                    )
                    .service(
                        web::resource("/adjust").route(web::put().to(leave_balance::adjust_balance)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(leave_balance::employee_balances)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::mark_attendance)),
                    )
                    .service(
                        web::resource("/calendar")
                            .route(web::get().to(attendance::attendance_calendar)),
                    )
                    .service(
                        web::resource("/{id}/correct")
                            .route(web::put().to(attendance::correct_attendance)),
                    ),
            )
            .service(
                web::scope("/holiday")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(
                        web::resource("/{date}").route(web::delete().to(holiday::delete_holiday)),
                    ),
            )
            .service(
                web::scope("/report")
                    .service(
                        web::resource("/leave-summary").route(web::get().to(report::leave_summary)),
                    )
                    .service(
                        web::resource("/attendance-summary")
                            .route(web::get().to(report::attendance_summary)),
                    ),
            )
            .service(
                web::scope("/calendar").service(
                    web::resource("/working-days").route(web::get().to(calendar::working_days)),
                ),
            ),
    );
}

// API REQUEST
//  └─ Authorization: Bearer access_token
//       └─ decision endpoints (approve / reject / cancel) carry their own limiter

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_interval_spreads_the_minute() {
        assert_eq!(request_interval_ms(60), 1_000);
        assert_eq!(request_interval_ms(20), 3_000);
        assert_eq!(request_interval_ms(0), 60_000);
        assert_eq!(request_interval_ms(120_000), 1);
    }

    #[test]
    fn limiters_build_for_any_budget() {
        for per_min in [0, 1, 60, 60_000, u32::MAX] {
            build_limiter(per_min);
        }
    }
}
