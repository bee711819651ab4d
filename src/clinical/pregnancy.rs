//! Pregnancy dating from the last menstrual period (LMP).

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Trimester for a gestational age in weeks: 1 up to week 12, 2 up to
/// week 27, 3 after.
pub fn trimester(gestational_weeks: u32) -> u8 {
    match gestational_weeks {
        0..=12 => 1,
        13..=27 => 2,
        _ => 3,
    }
}

/// Completed weeks since the LMP, zero if the LMP is after `now`.
pub fn gestational_age_weeks(lmp: NaiveDate, now: NaiveDate) -> u32 {
    let days = (now - lmp).num_days().max(0);
    (days / 7) as u32
}

/// Estimated delivery date by Naegele's rule: add 7 days, subtract 3 months,
/// add 1 year, in that order.
///
/// Month and year steps keep the day-of-month and let it overflow into the
/// following month (31 May minus 3 months is 2 March, not 29 February).
/// Returns None only when the result is outside the supported calendar.
pub fn estimated_delivery_date(lmp: NaiveDate) -> Option<NaiveDate> {
    let date = lmp.checked_add_days(Days::new(7))?;
    let date = shift_months_rolling(date, -3)?;
    shift_months_rolling(date, 12)
}

/// Moves `date` by `months`, rolling an out-of-range day forward.
fn shift_months_rolling(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let total = date.year().checked_mul(12)? + date.month0() as i32 + months;
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12) as u32);
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    first.checked_add_days(Days::new(u64::from(date.day() - 1)))
}

// == Summary ==
/// Dating summary for a pregnancy on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PregnancySummary {
    pub last_menstrual_period: NaiveDate,
    pub gestational_weeks: u32,
    pub trimester: u8,
    pub estimated_delivery_date: Option<NaiveDate>,
}

pub fn summarize_pregnancy(lmp: NaiveDate, now: NaiveDate) -> PregnancySummary {
    let gestational_weeks = gestational_age_weeks(lmp, now);
    PregnancySummary {
        last_menstrual_period: lmp,
        gestational_weeks,
        trimester: trimester(gestational_weeks),
        estimated_delivery_date: estimated_delivery_date(lmp),
    }
}
