use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::{HrmResult, ValidationError};
use crate::model::employee::{Employee, EmployeeId};
use crate::model::role::Role;

/// Employee and role lookups the core consumes.
pub trait EmployeeLookup: Send + Sync {
    fn employee(&self, id: EmployeeId) -> Option<Employee>;

    fn role_of(&self, id: EmployeeId) -> Option<Role> {
        self.employee(id).map(|e| e.role)
    }

    fn reports_to(&self, id: EmployeeId) -> Option<EmployeeId> {
        self.employee(id).and_then(|e| e.reporting_manager_id)
    }

    /// Active direct reports of `manager`.
    fn team_of(&self, manager: EmployeeId) -> Vec<EmployeeId>;

    fn active_employees(&self) -> Vec<EmployeeId>;
}

#[derive(Default)]
pub struct EmployeeDirectory {
    employees: RwLock<HashMap<EmployeeId, Employee>>,
}

impl EmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an employee. A reporting chain that leads back to
    /// the employee, directly or through other managers, is rejected.
    pub fn upsert(&self, employee: Employee) -> HrmResult<()> {
        let mut employees = self.employees.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(manager) = employee.reporting_manager_id {
            let mut cursor = Some(manager);
            let mut hops = 0usize;
            while let Some(current) = cursor {
                if current == employee.id || hops > employees.len() {
                    return Err(ValidationError::ReportingCycle {
                        employee: employee.id,
                        manager,
                    }
                    .into());
                }
                cursor = employees.get(&current).and_then(|e| e.reporting_manager_id);
                hops += 1;
            }
        }
        employees.insert(employee.id, employee);
        Ok(())
    }
}

impl EmployeeLookup for EmployeeDirectory {
    fn employee(&self, id: EmployeeId) -> Option<Employee> {
        self.employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn team_of(&self, manager: EmployeeId) -> Vec<EmployeeId> {
        let mut team: Vec<EmployeeId> = self
            .employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|e| e.is_active && e.reporting_manager_id == Some(manager))
            .map(|e| e.id)
            .collect();
        team.sort_unstable();
        team
    }

    fn active_employees(&self) -> Vec<EmployeeId> {
        let mut ids: Vec<EmployeeId> = self
            .employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|e| e.is_active)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
