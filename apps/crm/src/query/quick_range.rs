use chrono::{Datelike, Days, Local, NaiveDate};

/// A `{from, to}` pair of local calendar days; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One-click date ranges offered above the lead list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRange {
    /// Only today
    Today,
    /// From the first of the current month, open-ended
    ThisMonth,
    /// From the same day three months back, open-ended
    LastThreeMonths,
}

impl QuickRange {
    /// Computes the range relative to `today`
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use leaddesk_crm::query::QuickRange;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
    /// let range = QuickRange::LastThreeMonths.range_on(today);
    /// // Feb 31st does not exist and rolls over into March
    /// assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 3, 2));
    /// assert_eq!(range.to, None);
    /// ```
    pub fn range_on(self, today: NaiveDate) -> DateRange {
        match self {
            QuickRange::Today => DateRange {
                from: Some(today),
                to: Some(today),
            },
            QuickRange::ThisMonth => DateRange {
                from: today.with_day(1),
                to: None,
            },
            QuickRange::LastThreeMonths => DateRange {
                from: months_back(today, 3),
                to: None,
            },
        }
    }

    /// Computes the range relative to the viewer's local today
    pub fn range_now(self) -> DateRange {
        self.range_on(Local::now().date_naive())
    }
}

/// Moves `date` back by whole months, keeping the day number
///
/// A day missing from the target month overflows into the next one, the
/// way calendar constructors normalize out-of-range days.
fn months_back(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let index = date.year() * 12 + date.month0() as i32 - months as i32;
    let first = NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)?;
    first.checked_add_days(Days::new(u64::from(date.day0())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_is_a_single_day() {
        let range = QuickRange::Today.range_on(day(2024, 1, 1));
        assert_eq!(range.from, Some(day(2024, 1, 1)));
        assert_eq!(range.to, Some(day(2024, 1, 1)));
    }

    #[test]
    fn this_month_starts_on_the_first() {
        let range = QuickRange::ThisMonth.range_on(day(2024, 2, 29));
        assert_eq!(range.from, Some(day(2024, 2, 1)));
        assert_eq!(range.to, None);
    }

    #[test]
    fn last_three_months_keeps_day_number() {
        let range = QuickRange::LastThreeMonths.range_on(day(2024, 7, 15));
        assert_eq!(range.from, Some(day(2024, 4, 15)));
    }

    #[test]
    fn last_three_months_crosses_year_boundary() {
        let range = QuickRange::LastThreeMonths.range_on(day(2024, 1, 15));
        assert_eq!(range.from, Some(day(2023, 10, 15)));
    }

    #[test]
    fn missing_day_rolls_over() {
        assert_eq!(months_back(day(2023, 5, 31), 3), Some(day(2023, 3, 3)));
        assert_eq!(months_back(day(2024, 5, 31), 3), Some(day(2024, 3, 2)));
        assert_eq!(months_back(day(2024, 12, 31), 3), Some(day(2024, 10, 1)));
    }

    #[test]
    fn range_now_uses_local_today() {
        let range = QuickRange::Today.range_now();
        assert_eq!(range.from, range.to);
        assert!(range.from.is_some());
    }
}
