//! Calendar tagging of forecast target weeks

use chrono::{Datelike, NaiveDate};

use crate::types::SeasonalContext;

/// Inclusive (month, day) ranges, checked in order.
const CALENDAR: &[((u32, u32), (u32, u32), SeasonalContext)] = &[
    ((11, 20), (12, 2), SeasonalContext::MajorPromotionalPeriod),
    ((7, 10), (7, 20), SeasonalContext::MajorPromotionalPeriod),
    ((11, 1), (11, 19), SeasonalContext::HolidaySeason),
    ((12, 3), (12, 31), SeasonalContext::HolidaySeason),
    ((1, 1), (1, 31), SeasonalContext::PostHolidayReset),
    ((8, 1), (9, 7), SeasonalContext::BackToSchool),
];

pub struct SeasonalContextTagger;

impl SeasonalContextTagger {
    /// Tag a date by month and day only; the year never matters.
    pub fn tag(date: NaiveDate) -> SeasonalContext {
        let md = (date.month(), date.day());
        CALENDAR
            .iter()
            .find(|(start, end, _)| *start <= md && md <= *end)
            .map(|(_, _, ctx)| *ctx)
            .unwrap_or(SeasonalContext::Regular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(y: i32, m: u32, d: u32) -> SeasonalContext {
        SeasonalContextTagger::tag(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn boundaries() {
        assert_eq!(tag(2024, 11, 19), SeasonalContext::HolidaySeason);
        assert_eq!(tag(2024, 11, 20), SeasonalContext::MajorPromotionalPeriod);
        assert_eq!(tag(2024, 12, 2), SeasonalContext::MajorPromotionalPeriod);
        assert_eq!(tag(2024, 12, 3), SeasonalContext::HolidaySeason);
        assert_eq!(tag(2024, 12, 31), SeasonalContext::HolidaySeason);
        assert_eq!(tag(2025, 1, 1), SeasonalContext::PostHolidayReset);
        assert_eq!(tag(2025, 2, 1), SeasonalContext::Regular);
        assert_eq!(tag(2025, 7, 9), SeasonalContext::Regular);
        assert_eq!(tag(2025, 7, 15), SeasonalContext::MajorPromotionalPeriod);
        assert_eq!(tag(2025, 8, 1), SeasonalContext::BackToSchool);
        assert_eq!(tag(2025, 9, 7), SeasonalContext::BackToSchool);
        assert_eq!(tag(2025, 9, 8), SeasonalContext::Regular);
    }

    #[test]
    fn year_is_ignored() {
        assert_eq!(tag(2019, 11, 25), tag(2031, 11, 25));
    }
}
