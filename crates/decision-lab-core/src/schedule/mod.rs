//! Time gating over a curriculum year.
//!
//! Every function takes `now` as a local wall-clock time supplied by the
//! caller. Weeks start Monday 00:00; slot `d` of a week unlocks at midnight
//! `d` days after that.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::curriculum::CurriculumYear;
use crate::scenario::{Scenario, SCENARIOS_PER_WEEK};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Midnight on the Monday of `at`'s week. Sundays belong to the week before.
pub fn start_of_week_monday(at: NaiveDateTime) -> NaiveDateTime {
    let date = at.date();
    let offset = i64::from(date.weekday().num_days_from_monday());
    (date - Duration::days(offset)).and_time(NaiveTime::MIN)
}

/// Whole weeks between the Monday-aligned `start` and `now`; 0 before `start`.
pub fn week_index(start: NaiveDateTime, now: NaiveDateTime) -> usize {
    let elapsed = now
        .signed_duration_since(start_of_week_monday(start))
        .num_milliseconds();
    if elapsed < 0 {
        return 0;
    }
    (elapsed / WEEK_MS) as usize
}

/// Monday = 0 through Sunday = 6.
pub fn day_index(now: NaiveDateTime) -> usize {
    now.weekday().num_days_from_monday() as usize
}

/// Midnight `position` days after `week_start`.
pub fn unlock_instant(week_start: NaiveDateTime, position: usize) -> NaiveDateTime {
    (week_start.date() + Duration::days(position as i64)).and_time(NaiveTime::MIN)
}

pub fn is_unlocked(week_start: NaiveDateTime, position: usize, now: NaiveDateTime) -> bool {
    now >= unlock_instant(week_start, position)
}

/// `now` falls between Monday 00:00 and the end of Sunday of `week_start`'s week.
pub fn is_current_week(week_start: NaiveDateTime, now: NaiveDateTime) -> bool {
    let start = start_of_week_monday(week_start);
    now >= start && now < start + Duration::days(7)
}

/// Monday 00:00 of a zero-based week of `year`.
pub fn week_start(year: &CurriculumYear, week: usize) -> NaiveDateTime {
    start_of_week_monday(year.start_date) + Duration::days(7 * week as i64)
}

/// The year's current week, clamped to its range.
pub fn current_week(year: &CurriculumYear, now: NaiveDateTime) -> usize {
    week_index(year.start_date, now).min(year.week_count().saturating_sub(1))
}

pub fn current_week_slice(year: &CurriculumYear, now: NaiveDateTime) -> &[Scenario] {
    year.week(current_week(year, now))
}

pub fn today_scenario(year: &CurriculumYear, now: NaiveDateTime) -> Option<&Scenario> {
    let index = current_week(year, now) * SCENARIOS_PER_WEEK + day_index(now);
    year.scenarios.get(index)
}

/// Whether the scenario at a flat catalog index is open at `now`.
pub fn is_scenario_unlocked(year: &CurriculumYear, index: usize, now: NaiveDateTime) -> bool {
    let week = index / SCENARIOS_PER_WEEK;
    is_unlocked(week_start(year, week), index % SCENARIOS_PER_WEEK, now)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPreview {
    pub id: String,
    pub title: String,
    pub stakes: Vec<String>,
    pub unlock_at: NaiveDateTime,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekPreview {
    pub week: usize,
    pub week_start: NaiveDateTime,
    pub week_end: NaiveDate,
    pub current: bool,
    pub slots: Vec<SlotPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPreview {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub active: bool,
    pub weeks: Vec<WeekPreview>,
}

/// Every week of the year with its slots' unlock state at `now`.
pub fn year_preview(year: &CurriculumYear, now: NaiveDateTime) -> Vec<WeekPreview> {
    (0..year.week_count())
        .map(|week| {
            let start = week_start(year, week);
            let slots = year
                .week(week)
                .iter()
                .enumerate()
                .map(|(position, scenario)| SlotPreview {
                    id: scenario.id.clone(),
                    title: scenario.title.clone(),
                    stakes: scenario.stakes.clone(),
                    unlock_at: unlock_instant(start, position),
                    unlocked: is_unlocked(start, position, now),
                })
                .collect();
            WeekPreview {
                week,
                week_start: start,
                week_end: start.date() + Duration::days(6),
                current: is_current_week(start, now),
                slots,
            }
        })
        .collect()
}

/// Weeks grouped into the twelve calendar months from the start month.
///
/// A week belongs to the month its Monday falls in; weeks past the twelfth
/// month are left out. The month holding `now` is active, or the first
/// month when `now` is outside the range.
pub fn month_preview(year: &CurriculumYear, now: NaiveDateTime) -> Vec<MonthPreview> {
    let first = year.start_date.date().with_day(1).unwrap_or(year.start_date.date());
    let mut months: Vec<MonthPreview> = (0..12)
        .filter_map(|offset| first.checked_add_months(chrono::Months::new(offset)))
        .map(|month_start| MonthPreview {
            year: month_start.year(),
            month: month_start.month(),
            label: month_start.format("%B %Y").to_string(),
            active: false,
            weeks: Vec::new(),
        })
        .collect();

    for week in year_preview(year, now) {
        let (y, m) = (week.week_start.year(), week.week_start.month());
        if let Some(month) = months.iter_mut().find(|mp| mp.year == y && mp.month == m) {
            month.weeks.push(week);
        }
    }

    let active = months
        .iter()
        .position(|mp| mp.year == now.year() && mp.month == now.month())
        .unwrap_or(0);
    if let Some(month) = months.get_mut(active) {
        month.active = true;
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurriculumConfig;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn year() -> CurriculumYear {
        CurriculumYear::for_week_start(
            NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            &CurriculumConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_start_of_week_monday() {
        let monday = at(2026, 2, 2, 0, 0);
        assert_eq!(start_of_week_monday(at(2026, 2, 4, 15, 30)), monday);
        assert_eq!(start_of_week_monday(at(2026, 2, 2, 0, 0)), monday);
        // Sunday closes the week that started the Monday before
        assert_eq!(start_of_week_monday(at(2026, 2, 8, 23, 59)), monday);
        assert_eq!(start_of_week_monday(at(2026, 2, 9, 0, 0)), at(2026, 2, 9, 0, 0));
    }

    #[test]
    fn test_week_index() {
        let start = at(2026, 2, 2, 0, 0);
        assert_eq!(week_index(start, at(2026, 1, 20, 12, 0)), 0);
        assert_eq!(week_index(start, at(2026, 2, 8, 23, 59)), 0);
        assert_eq!(week_index(start, at(2026, 2, 9, 0, 0)), 1);
        assert_eq!(week_index(start, at(2026, 11, 9, 0, 0)), 40);
        // a mid-week start is aligned back to its Monday
        assert_eq!(week_index(at(2026, 2, 5, 9, 0), at(2026, 2, 9, 1, 0)), 1);
    }

    #[test]
    fn test_unlock_instants() {
        let week_start = at(2026, 2, 2, 0, 0);
        assert_eq!(unlock_instant(week_start, 0), week_start);
        assert_eq!(unlock_instant(week_start, 6), at(2026, 2, 8, 0, 0));
        assert!(is_unlocked(week_start, 1, at(2026, 2, 3, 0, 0)));
        assert!(!is_unlocked(week_start, 1, at(2026, 2, 2, 23, 59)));
    }

    #[test]
    fn test_is_current_week() {
        let week_start = at(2026, 2, 2, 0, 0);
        assert!(is_current_week(week_start, at(2026, 2, 8, 23, 59)));
        assert!(!is_current_week(week_start, at(2026, 2, 9, 0, 0)));
        assert!(!is_current_week(week_start, at(2026, 2, 1, 23, 59)));
    }

    #[test]
    fn test_current_week_slice_first_week() {
        let year = year();
        let slice = current_week_slice(&year, at(2026, 2, 2, 0, 0));
        assert_eq!(slice, &year.scenarios[0..7]);
    }

    #[test]
    fn test_today_scenario() {
        let year = year();
        assert_eq!(today_scenario(&year, at(2026, 2, 3, 9, 0)), Some(&year.scenarios[1]));
        assert_eq!(today_scenario(&year, at(2026, 2, 2, 9, 0)), Some(&year.scenarios[0]));
        // Sunday is the last slot of the week
        assert_eq!(today_scenario(&year, at(2026, 2, 15, 9, 0)), Some(&year.scenarios[13]));
    }

    #[test]
    fn test_week_slice_clamped() {
        let year = year();
        let before = current_week_slice(&year, at(2025, 6, 1, 0, 0));
        assert_eq!(before[0].id, "week1-scenario1");
        let after = current_week_slice(&year, at(2027, 6, 1, 0, 0));
        assert_eq!(after[0].id, "week40-scenario1");
        let today = today_scenario(&year, at(2027, 6, 1, 0, 0)).unwrap();
        assert!(today.id.starts_with("week40-"));
    }

    #[test]
    fn test_is_scenario_unlocked() {
        let year = year();
        let now = at(2026, 2, 10, 8, 0); // Tuesday of week 2
        assert!(is_scenario_unlocked(&year, 0, now));
        assert!(is_scenario_unlocked(&year, 8, now));
        assert!(!is_scenario_unlocked(&year, 9, now));
        assert!(!is_scenario_unlocked(&year, 14, now));
    }

    #[test]
    fn test_year_preview() {
        let year = year();
        let preview = year_preview(&year, at(2026, 2, 4, 12, 0));
        assert_eq!(preview.len(), 40);
        assert!(preview[0].current);
        assert!(!preview[1].current);
        assert_eq!(preview[0].week_end, NaiveDate::from_ymd_opt(2026, 2, 8).unwrap());
        let unlocked: Vec<bool> = preview[0].slots.iter().map(|s| s.unlocked).collect();
        assert_eq!(unlocked, vec![true, true, true, false, false, false, false]);
        assert!(preview[1].slots.iter().all(|s| !s.unlocked));
    }

    #[test]
    fn test_month_preview() {
        let year = year();
        let months = month_preview(&year, at(2026, 3, 10, 12, 0));
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].label, "February 2026");
        assert_eq!(months[11].label, "January 2027");
        assert_eq!(months[0].weeks.len(), 4);
        assert_eq!(months[1].weeks.len(), 5);
        assert!(months[1].active);
        assert_eq!(months.iter().filter(|m| m.active).count(), 1);
        // 40 weeks end in early November, inside the twelve-month window
        let total: usize = months.iter().map(|m| m.weeks.len()).sum();
        assert_eq!(total, 40);

        let outside = month_preview(&year, at(2030, 1, 1, 0, 0));
        assert!(outside[0].active);
    }

    proptest! {
        #[test]
        fn prop_unlock_is_monotonic(position in 0usize..7, a in 0i64..2_000_000, b in 0i64..2_000_000) {
            let week_start = at(2026, 2, 2, 0, 0);
            let base = at(2026, 1, 28, 0, 0);
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let early = base + Duration::seconds(early);
            let late = base + Duration::seconds(late);
            if is_unlocked(week_start, position, early) {
                prop_assert!(is_unlocked(week_start, position, late));
            }
        }

        #[test]
        fn prop_same_week_same_monday(day in 0i64..7, minutes in 0i64..1440) {
            let monday = at(2026, 2, 2, 0, 0);
            let moment = monday + Duration::days(day) + Duration::minutes(minutes);
            prop_assert_eq!(start_of_week_monday(moment), monday);
        }
    }
}
