//! Trading calendar
//!
//! Decides which dates the scheduler may fire on. The shipped calendar
//! knows weekends plus a configured holiday list; anything smarter
//! (exchange half-days, ad-hoc closures) implements the same trait.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

pub trait TradingCalendar: Send + Sync {
    fn is_trading_day(&self, date: NaiveDate) -> bool;
}

/// Monday-to-Friday calendar minus configured holidays
pub struct WeekdayCalendar {
    holidays: HashSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }
}

impl TradingCalendar for WeekdayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekends_are_not_trading_days() {
        let cal = WeekdayCalendar::new([]);
        assert!(cal.is_trading_day(date(2026, 8, 28))); // Friday
        assert!(!cal.is_trading_day(date(2026, 8, 29))); // Saturday
        assert!(!cal.is_trading_day(date(2026, 8, 30))); // Sunday
        assert!(cal.is_trading_day(date(2026, 8, 31))); // Monday
    }

    #[test]
    fn holidays_are_excluded() {
        let cal = WeekdayCalendar::new([date(2026, 10, 1)]);
        assert!(!cal.is_trading_day(date(2026, 10, 1))); // Thursday, but a holiday
        assert!(cal.is_trading_day(date(2026, 10, 2)));
    }
}
