//! Age from a birth date.

use chrono::{Datelike, NaiveDate};

/// Whole months from `birth` to `now`, zero for future birth dates.
///
/// A month only counts once `now` reaches the birth day-of-month.
pub fn age_in_months(birth: NaiveDate, now: NaiveDate) -> u32 {
    let mut months =
        (now.year() - birth.year()) * 12 + now.month() as i32 - birth.month() as i32;
    if now.day() < birth.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Whole years from `birth` to `now`, zero for future birth dates.
pub fn age_in_years(birth: NaiveDate, now: NaiveDate) -> u32 {
    let mut years = now.year() - birth.year();
    if (now.month(), now.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}
