pub mod attendance;
pub mod calendar;
pub mod holiday;
pub mod leave_balance;
pub mod leave_request;
pub mod report;

use crate::auth::auth::AuthUser;
use crate::domain::service::HrmService;
use crate::model::employee::EmployeeId;
use crate::model::role::Role;

/// Whether `auth` may read `employee`'s records: the employee, their
/// reporting manager, or an admin.
pub(crate) fn can_view(auth: &AuthUser, service: &HrmService, employee: EmployeeId) -> bool {
    auth.employee_id == employee
        || auth.role == Role::Admin
        || service.is_reporting_manager(auth.employee_id, employee)
}

pub(crate) fn require_view(
    auth: &AuthUser,
    service: &HrmService,
    employee: EmployeeId,
) -> actix_web::Result<()> {
    if can_view(auth, service, employee) {
        Ok(())
    } else {
        Err(actix_web::error::ErrorForbidden("Not allowed to view this employee"))
    }
}

/// Employees a report or listing covers for the caller: admins see everyone
/// (or the requested employee), managers their active team plus themselves,
/// everyone else only themselves.
pub(crate) fn visible_employees(
    auth: &AuthUser,
    service: &HrmService,
    requested: Option<EmployeeId>,
) -> actix_web::Result<Vec<EmployeeId>> {
    if let Some(employee) = requested {
        require_view(auth, service, employee)?;
        return Ok(vec![employee]);
    }
    let employees = match auth.role {
        Role::Admin => service.employees().active_employees(),
        Role::Manager => {
            let mut team = service.employees().team_of(auth.employee_id);
            team.push(auth.employee_id);
            team.sort_unstable();
            team
        }
        Role::Employee => vec![auth.employee_id],
    };
    Ok(employees)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use actix_web::web::Data;
    use chrono::NaiveDate;

    use crate::auth::jwt::generate_access_token;
    use crate::config::Config;
    use crate::domain::calendar::{DayCountMode, HolidayCalendar};
    use crate::domain::service::tests::fixture;
    use crate::domain::service::HrmService;
    use crate::model::employee::EmployeeId;
    use crate::model::role::Role;
    use crate::store::Store;
    use crate::store::tests::{FailingLedgerWriter, MemoryLedgerWriter};

    pub const SECRET: &str = "test-secret";

    pub fn config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".into(),
            database_url: "mysql://localhost/test".into(),
            jwt_secret: SECRET.into(),
            api_prefix: "/api".into(),
            rate_protected_per_min: 1000,
            rate_decision_per_min: 120,
            leave_day_count: DayCountMode::Working,
            exclude_weekends: true,
            log_dir: "logs".into(),
        }
    }

    pub fn state(today: NaiveDate) -> (Data<HrmService>, Data<HolidayCalendar>) {
        let fixture = fixture(today);
        (
            Data::new(fixture.service),
            Data::from(Arc::clone(&fixture.holidays)),
        )
    }

    pub fn memory_store() -> (Data<Store>, Arc<MemoryLedgerWriter>) {
        let writer = Arc::new(MemoryLedgerWriter::default());
        (Data::new(Store::new(writer.clone())), writer)
    }

    pub fn failing_store() -> Data<Store> {
        Data::new(Store::new(Arc::new(FailingLedgerWriter)))
    }

    pub fn bearer(employee: EmployeeId, role: Role) -> (String, String) {
        let token = generate_access_token(format!("user{employee}"), employee, role.id(), SECRET, 900);
        ("Authorization".into(), format!("Bearer {token}"))
    }
}
