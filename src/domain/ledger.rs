//! Per-employee leave balance ledger.
//!
//! Every account is keyed by (leave type code, year). `used` only moves up
//! through [`BalanceLedger::deduct`] and down through [`BalanceLedger::restore`];
//! admins set `adjusted` outright. For paid leave types no mutation may leave
//! `available` below zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{BalanceError, HrmResult, ValidationError};
use crate::model::employee::EmployeeId;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_type::LeaveType;

/// Largest day figure an admin may allocate or set as an adjustment. Such
/// figures also carry at most one decimal place.
pub const MAX_DAYS: Decimal = Decimal::ONE_THOUSAND;

fn non_negative(amount: Decimal) -> HrmResult<()> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { amount }.into());
    }
    Ok(())
}

fn in_range(amount: Decimal) -> HrmResult<()> {
    if amount.abs() > MAX_DAYS || amount.normalize().scale() > 1 {
        return Err(ValidationError::AmountOutOfRange { amount }.into());
    }
    Ok(())
}

fn checked(sum: Option<Decimal>, amount: Decimal) -> HrmResult<Decimal> {
    sum.ok_or_else(|| ValidationError::AmountOutOfRange { amount }.into())
}

#[derive(Debug, Clone)]
pub struct BalanceLedger {
    employee_id: EmployeeId,
    accounts: BTreeMap<(String, i32), LeaveBalance>,
}

impl BalanceLedger {
    pub fn new(employee_id: EmployeeId) -> Self {
        Self {
            employee_id,
            accounts: BTreeMap::new(),
        }
    }

    pub fn get(&self, leave_type: &str, year: i32) -> Option<&LeaveBalance> {
        self.accounts.get(&(leave_type.to_string(), year))
    }

    pub fn available(&self, leave_type: &str, year: i32) -> Option<Decimal> {
        self.get(leave_type, year).map(LeaveBalance::available)
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &LeaveBalance> {
        self.accounts.values().filter(move |b| b.year == year)
    }

    /// Places a stored account back in the ledger as-is.
    pub fn load(&mut self, balance: LeaveBalance) {
        self.accounts
            .insert((balance.leave_type.clone(), balance.year), balance);
    }

    /// Opens the account for (type, year). Each key can be allocated once.
    pub fn allocate(
        &mut self,
        id: u64,
        leave_type: &LeaveType,
        year: i32,
        days: Decimal,
        now: DateTime<Utc>,
    ) -> HrmResult<&LeaveBalance> {
        non_negative(days)?;
        in_range(days)?;
        let key = (leave_type.code.clone(), year);
        if self.accounts.contains_key(&key) {
            return Err(BalanceError::DuplicateAllocation {
                leave_type: leave_type.code.clone(),
                year,
            }
            .into());
        }
        let balance = LeaveBalance {
            id,
            employee_id: self.employee_id,
            leave_type: leave_type.code.clone(),
            year,
            allocated: days,
            used: Decimal::ZERO,
            adjusted: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        Ok(&*self.accounts.entry(key).or_insert(balance))
    }

    /// Books `days` as used. Paid types must have an account with enough
    /// headroom; unpaid types never block and are booked only when an
    /// account exists.
    pub fn deduct(
        &mut self,
        leave_type: &LeaveType,
        year: i32,
        days: Decimal,
        now: DateTime<Utc>,
    ) -> HrmResult<()> {
        non_negative(days)?;
        let Some(balance) = self.accounts.get_mut(&(leave_type.code.clone(), year)) else {
            if leave_type.is_paid {
                return Err(BalanceError::NotFound {
                    leave_type: leave_type.code.clone(),
                    year,
                }
                .into());
            }
            return Ok(());
        };
        let used = checked(balance.used.checked_add(days), days)?;
        if leave_type.is_paid {
            let entitled = checked(balance.allocated.checked_add(balance.adjusted), days)?;
            if used > entitled {
                return Err(BalanceError::Insufficient {
                    available: balance.available(),
                    requested: days,
                }
                .into());
            }
        }
        balance.used = used;
        balance.updated_at = now;
        Ok(())
    }

    /// Gives back `days`, clamping `used` at zero. Returns `false` when no
    /// account exists, which is not an error.
    pub fn restore(
        &mut self,
        leave_type: &str,
        year: i32,
        days: Decimal,
        now: DateTime<Utc>,
    ) -> HrmResult<bool> {
        non_negative(days)?;
        let Some(balance) = self.accounts.get_mut(&(leave_type.to_string(), year)) else {
            return Ok(false);
        };
        balance.used = checked(balance.used.checked_sub(days), days)?.max(Decimal::ZERO);
        balance.updated_at = now;
        Ok(true)
    }

    /// Replaces `adjusted` with `adjusted_to`.
    pub fn adjust(
        &mut self,
        leave_type: &LeaveType,
        year: i32,
        adjusted_to: Decimal,
        now: DateTime<Utc>,
    ) -> HrmResult<&LeaveBalance> {
        in_range(adjusted_to)?;
        let balance = self
            .accounts
            .get_mut(&(leave_type.code.clone(), year))
            .ok_or_else(|| BalanceError::NotFound {
                leave_type: leave_type.code.clone(),
                year,
            })?;
        let available = checked(
            balance
                .allocated
                .checked_add(adjusted_to)
                .and_then(|entitled| entitled.checked_sub(balance.used)),
            adjusted_to,
        )?;
        if leave_type.is_paid && available < Decimal::ZERO {
            return Err(BalanceError::Negative { available }.into());
        }
        balance.adjusted = adjusted_to;
        balance.updated_at = now;
        Ok(&*balance)
    }
}
