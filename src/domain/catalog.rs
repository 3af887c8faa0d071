use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::error::{HrmResult, NotFoundError, ValidationError};
use crate::model::leave_type::LeaveType;

/// Leave type master data keyed by code.
#[derive(Default)]
pub struct LeaveTypeCatalog {
    types: RwLock<BTreeMap<String, LeaveType>>,
}

impl LeaveTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, leave_type: LeaveType) -> HrmResult<()> {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if types.contains_key(&leave_type.code) {
            return Err(ValidationError::DuplicateLeaveType {
                code: leave_type.code,
            }
            .into());
        }
        types.insert(leave_type.code.clone(), leave_type);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<LeaveType> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .cloned()
    }

    pub fn require(&self, code: &str) -> HrmResult<LeaveType> {
        self.get(code)
            .ok_or_else(|| NotFoundError::LeaveType(code.to_string()).into())
    }

    pub fn all(&self) -> Vec<LeaveType> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HrmError;

    fn casual() -> LeaveType {
        LeaveType {
            id: 1,
            code: "CL".into(),
            name: "Casual Leave".into(),
            is_paid: true,
            requires_documentation: false,
            max_consecutive_days: None,
            description: String::new(),
        }
    }

    #[test]
    fn codes_are_unique() {
        let catalog = LeaveTypeCatalog::new();
        catalog.register(casual()).unwrap();
        assert_eq!(
            catalog.register(casual()),
            Err(HrmError::from(ValidationError::DuplicateLeaveType { code: "CL".into() }))
        );
        assert_eq!(catalog.require("CL").unwrap().name, "Casual Leave");
        assert_eq!(
            catalog.require("XX"),
            Err(HrmError::from(NotFoundError::LeaveType("XX".into())))
        );
    }
}
