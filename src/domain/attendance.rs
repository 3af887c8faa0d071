//! Daily attendance for one employee, one record per date.
//!
//! `mark` is an insert-or-overwrite keyed by date: a self-mark is allowed for
//! today only, anyone else may mark any non-holiday date. An employee may not
//! re-mark a day somebody else marked or corrected. `correct` is the admin
//! path that stamps correction metadata.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AttendanceError, HrmResult, NotFoundError, PermissionError, ValidationError};
use crate::model::attendance::{Attendance, AttendanceId, AttendanceStatus};
use crate::model::employee::EmployeeId;
use crate::model::holiday::Holiday;
use crate::model::role::Role;

const MIN_CORRECTION_REASON: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Created,
    Overwrote { was_self_marked: bool },
}

#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    employee_id: EmployeeId,
    records: BTreeMap<NaiveDate, Attendance>,
}

impl AttendanceSheet {
    pub fn new(employee_id: EmployeeId) -> Self {
        Self {
            employee_id,
            records: BTreeMap::new(),
        }
    }

    pub fn on(&self, date: NaiveDate) -> Option<&Attendance> {
        self.records.get(&date)
    }

    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &Attendance> {
        let range = if start <= end { start..=end } else { start..=start };
        self.records
            .range(range)
            .map(|(_, record)| record)
            .filter(move |r| r.date <= end)
    }

    /// `holiday` is the holiday declared on `date`, if any; `today` is the
    /// caller's current local date.
    #[allow(clippy::too_many_arguments)]
    pub fn mark(
        &mut self,
        next_id: impl FnOnce() -> AttendanceId,
        date: NaiveDate,
        status: AttendanceStatus,
        marked_by: EmployeeId,
        holiday: Option<&Holiday>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> HrmResult<(&Attendance, MarkOutcome)> {
        if let Some(holiday) = holiday {
            return Err(AttendanceError::HolidayConflict {
                date,
                name: holiday.name.clone(),
            }
            .into());
        }
        let is_self = marked_by == self.employee_id;
        if is_self && date != today {
            return Err(AttendanceError::AdminOnlyDate { date }.into());
        }

        match self.records.entry(date) {
            Entry::Occupied(slot) => {
                let existing = slot.into_mut();
                if is_self && !existing.is_self_marked {
                    return Err(AttendanceError::LockedByAdmin { date }.into());
                }
                let was_self_marked = existing.is_self_marked;
                existing.status = status;
                existing.marked_by = marked_by;
                existing.is_self_marked = is_self;
                existing.marked_at = now;
                Ok((&*existing, MarkOutcome::Overwrote { was_self_marked }))
            }
            Entry::Vacant(slot) => {
                let record = slot.insert(Attendance {
                    id: next_id(),
                    employee_id: self.employee_id,
                    date,
                    status,
                    marked_by,
                    is_self_marked: is_self,
                    correction_reason: String::new(),
                    marked_at: now,
                    corrected_at: None,
                });
                Ok((&*record, MarkOutcome::Created))
            }
        }
    }

    /// Places a stored record back on the sheet as-is.
    pub fn load(&mut self, record: Attendance) {
        self.records.insert(record.date, record);
    }

    /// Admin correction of the record on `date`.
    #[allow(clippy::too_many_arguments)]
    pub fn correct(
        &mut self,
        id: AttendanceId,
        date: NaiveDate,
        admin: EmployeeId,
        admin_role: Option<Role>,
        status: AttendanceStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> HrmResult<&Attendance> {
        if admin_role != Some(Role::Admin) {
            return Err(PermissionError::AdminRequired { actor: admin }.into());
        }
        let reason = reason.trim();
        if reason.chars().count() < MIN_CORRECTION_REASON {
            return Err(ValidationError::CorrectionReasonTooShort.into());
        }
        let record = self
            .records
            .get_mut(&date)
            .filter(|r| r.id == id)
            .ok_or(NotFoundError::Attendance(id))?;
        record.status = status;
        record.marked_by = admin;
        record.is_self_marked = false;
        record.correction_reason = reason.to_string();
        record.corrected_at = Some(now);
        Ok(&*record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HrmError;

    const EMP: EmployeeId = 1;
    const ADMIN: EmployeeId = 99;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2026, 3, 2)
    }

    fn mark(
        sheet: &mut AttendanceSheet,
        date: NaiveDate,
        status: AttendanceStatus,
        by: EmployeeId,
    ) -> HrmResult<(Attendance, MarkOutcome)> {
        sheet
            .mark(|| 1, date, status, by, None, today(), Utc::now())
            .map(|(r, o)| (r.clone(), o))
    }

    #[test]
    fn self_mark_is_today_only() {
        let mut sheet = AttendanceSheet::new(EMP);
        let (record, outcome) = mark(&mut sheet, today(), AttendanceStatus::Present, EMP).unwrap();
        assert!(record.is_self_marked);
        assert_eq!(outcome, MarkOutcome::Created);

        assert_eq!(
            mark(&mut sheet, d(2026, 3, 1), AttendanceStatus::Present, EMP).unwrap_err(),
            HrmError::from(AttendanceError::AdminOnlyDate { date: d(2026, 3, 1) })
        );
        assert!(sheet.on(d(2026, 3, 1)).is_none());
    }

    #[test]
    fn admin_marks_any_date() {
        let mut sheet = AttendanceSheet::new(EMP);
        let (record, _) = mark(&mut sheet, d(2026, 2, 20), AttendanceStatus::Wfh, ADMIN).unwrap();
        assert!(!record.is_self_marked);
        assert_eq!(record.marked_by, ADMIN);
    }

    #[test]
    fn holiday_blocks_marking() {
        let mut sheet = AttendanceSheet::new(EMP);
        let holiday = Holiday {
            id: 1,
            date: today(),
            name: "Founders Day".into(),
            is_optional: false,
            description: String::new(),
        };
        let err = sheet
            .mark(|| 1, today(), AttendanceStatus::Present, ADMIN, Some(&holiday), today(), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            HrmError::from(AttendanceError::HolidayConflict {
                date: today(),
                name: "Founders Day".into()
            })
        );
        assert!(sheet.on(today()).is_none());
    }

    #[test]
    fn remark_overwrites_in_place() {
        let mut sheet = AttendanceSheet::new(EMP);
        mark(&mut sheet, today(), AttendanceStatus::Absent, EMP).unwrap();
        let (record, outcome) = mark(&mut sheet, today(), AttendanceStatus::Wfh, EMP).unwrap();
        assert_eq!(record.status, AttendanceStatus::Wfh);
        assert_eq!(outcome, MarkOutcome::Overwrote { was_self_marked: true });

        let (record, outcome) = mark(&mut sheet, today(), AttendanceStatus::Present, ADMIN).unwrap();
        assert!(!record.is_self_marked);
        assert_eq!(outcome, MarkOutcome::Overwrote { was_self_marked: true });
        assert_eq!(sheet.between(today(), today()).count(), 1);
    }

    #[test]
    fn overwrite_keeps_the_record_id() {
        let mut sheet = AttendanceSheet::new(EMP);
        let mut ids = 10..;
        let (first, _) = sheet
            .mark(|| ids.next().unwrap(), today(), AttendanceStatus::Absent, EMP, None, today(), Utc::now())
            .map(|(r, o)| (r.clone(), o))
            .unwrap();
        let (second, outcome) = sheet
            .mark(|| ids.next().unwrap(), today(), AttendanceStatus::Present, ADMIN, None, today(), Utc::now())
            .map(|(r, o)| (r.clone(), o))
            .unwrap();
        assert_eq!(first.id, 10);
        assert_eq!(second.id, 10);
        assert_eq!(outcome, MarkOutcome::Overwrote { was_self_marked: true });
        assert_eq!(sheet.on(today()).unwrap().marked_by, ADMIN);
    }

    #[test]
    fn self_mark_cannot_replace_admin_mark() {
        let mut sheet = AttendanceSheet::new(EMP);
        mark(&mut sheet, today(), AttendanceStatus::HalfDay, ADMIN).unwrap();
        assert_eq!(
            mark(&mut sheet, today(), AttendanceStatus::Present, EMP).unwrap_err(),
            HrmError::from(AttendanceError::LockedByAdmin { date: today() })
        );
        assert_eq!(sheet.on(today()).unwrap().status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn correction_stamps_metadata() {
        let mut sheet = AttendanceSheet::new(EMP);
        let (record, _) = mark(&mut sheet, today(), AttendanceStatus::Absent, EMP).unwrap();
        let corrected = sheet
            .correct(
                record.id,
                today(),
                ADMIN,
                Some(Role::Admin),
                AttendanceStatus::Present,
                "forgot to mark WFH",
                Utc::now(),
            )
            .unwrap();
        assert_eq!(corrected.status, AttendanceStatus::Present);
        assert_eq!(corrected.marked_by, ADMIN);
        assert!(!corrected.is_self_marked);
        assert!(corrected.corrected_at.is_some());
        assert_eq!(corrected.correction_reason, "forgot to mark WFH");
    }

    #[test]
    fn correction_needs_admin_and_reason() {
        let mut sheet = AttendanceSheet::new(EMP);
        let (record, _) = mark(&mut sheet, today(), AttendanceStatus::Absent, EMP).unwrap();

        let err = sheet
            .correct(record.id, today(), 5, Some(Role::Manager), AttendanceStatus::Present, "typo fix", Utc::now())
            .unwrap_err();
        assert_eq!(err, HrmError::from(PermissionError::AdminRequired { actor: 5 }));

        let err = sheet
            .correct(record.id, today(), ADMIN, Some(Role::Admin), AttendanceStatus::Present, " ok ", Utc::now())
            .unwrap_err();
        assert_eq!(err, HrmError::from(ValidationError::CorrectionReasonTooShort));

        let err = sheet
            .correct(77, today(), ADMIN, Some(Role::Admin), AttendanceStatus::Present, "typo fix", Utc::now())
            .unwrap_err();
        assert_eq!(err, HrmError::from(NotFoundError::Attendance(77)));

        let untouched = sheet.on(today()).unwrap();
        assert!(untouched.is_self_marked);
        assert_eq!(untouched.status, AttendanceStatus::Absent);
    }
}
