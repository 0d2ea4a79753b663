//! calendar arithmetic on plain dates

use chrono::{Datelike, Duration, NaiveDate};

use crate::errors::{BillingError, Result};

/// add `months` calendar months, keeping the day of month when the target
/// month has it and clamping to the month's last day otherwise
/// (jan 31 + 1 month = feb 28/29, never mar 2/3)
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    if months == 0 {
        return Ok(date);
    }

    let total = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    let year = i32::try_from(year).map_err(|_| out_of_range(date, months))?;
    let day = date.day().min(days_in_month(year, month));

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| out_of_range(date, months))
}

/// add whole days
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| BillingError::InvalidDate {
            message: format!("{} + {} days is out of range", date, days),
        })
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// same calendar month and year
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn out_of_range(date: NaiveDate, months: i32) -> BillingError {
    BillingError::InvalidDate {
        message: format!("{} + {} months is out of range", date, months),
    }
}
