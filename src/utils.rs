use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};

/// First day of the calendar month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.day0() as u64)
}

pub fn next_month_start(date: NaiveDate) -> Result<NaiveDate> {
    add_months(month_start(date), 1)
}

pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        ForecastError::DateError(format!("Cannot add {} months to {}", months, date))
    })
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Contiguous month starts following `last`, e.g. the three periods after 2023-12
/// are 2024-01, 2024-02 and 2024-03.
pub fn following_month_starts(last: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    let mut periods = Vec::with_capacity(count);
    let mut current = month_start(last);
    for _ in 0..count {
        current = next_month_start(current)?;
        periods.push(current);
    }
    Ok(periods)
}

/// Display label for a period, "MM/YYYY".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2023, 2, 17).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());

        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(month_start(date), date);
    }

    #[test]
    fn test_next_month_start() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        assert_eq!(
            next_month_start(date).unwrap(),
            NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()
        );

        let date = NaiveDate::from_ymd_opt(2023, 12, 15).unwrap();
        assert_eq!(
            next_month_start(date).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_months_between() {
        let start = NaiveDate::from_ymd_opt(2022, 11, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        assert_eq!(months_between(start, end), 3);
        assert_eq!(months_between(end, start), -3);
        assert_eq!(months_between(start, start), 0);
    }

    #[test]
    fn test_following_month_starts_crosses_year() {
        let last = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let periods = following_month_starts(last, 3).unwrap();
        assert_eq!(
            periods,
            vec![
                NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ]
        );
        assert!(following_month_starts(last, 0).unwrap().is_empty());

        let mid_month = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            following_month_starts(mid_month, 2).unwrap(),
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_month_label() {
        let date = NaiveDate::from_ymd_opt(2011, 3, 1).unwrap();
        assert_eq!(month_label(date), "03/2011");
    }
}
