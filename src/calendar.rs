//! Calendar helpers: which tasks belong to a given day

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::task::Task;

/// The first and last instants of a calendar day, in UTC. Both ends are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayBounds {
    day: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DayBounds {
    pub fn day(&self) -> NaiveDate          { self.day   }
    pub fn start(&self) -> &DateTime<Utc>   { &self.start }
    pub fn end(&self) -> &DateTime<Utc>     { &self.end   }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        &self.start <= instant && instant <= &self.end
    }
}

/// Returns `[day 00:00:00.000 UTC, day 23:59:59.999 UTC]`.
///
/// The year, month and day of `day` are used as UTC calendar fields, whatever the device's offset.
pub fn day_bounds_utc(day: NaiveDate) -> DayBounds {
    let midnight = day.and_hms_milli_opt(0, 0, 0, 0).unwrap(/* midnight exists on every calendar day */);
    let start = Utc.from_utc_datetime(&midnight);
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    DayBounds { day, start, end }
}

/// The calendar day the user sees for `instant`, e.g. on a date picker.
///
/// This uses the local calendar fields of `instant`, not the ones of its UTC conversion.
pub fn selected_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.naive_local().date()
}

/// Group tasks by the UTC day of their start date, for calendar markers.
///
/// Tasks without a start date do not belong to any day.
pub fn group_by_day(tasks: &[Task]) -> BTreeMap<NaiveDate, Vec<&Task>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(start) = task.start_date() {
            days.entry(start.date_naive()).or_default().push(task);
        }
    }
    days
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    use crate::task::TaskId;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bounds_cover_the_whole_utc_day() {
        let bounds = day_bounds_utc(ymd(2024, 12, 8));
        assert_eq!(bounds.start(), &at("2024-12-08T00:00:00Z"));
        assert_eq!(bounds.end(), &at("2024-12-08T23:59:59.999Z"));
        assert_eq!(bounds.day(), ymd(2024, 12, 8));

        assert!(bounds.contains(&at("2024-12-08T00:00:00Z")));
        assert!(bounds.contains(&at("2024-12-08T23:59:59.999Z")));
        assert!(bounds.contains(&at("2024-12-08T12:34:56Z")));
        assert!(bounds.contains(&at("2024-12-07T23:59:59.999Z")) == false);
        assert!(bounds.contains(&at("2024-12-09T00:00:00Z")) == false);
    }

    #[test]
    fn bounds_across_month_and_leap_day() {
        let bounds = day_bounds_utc(ymd(2024, 2, 29));
        assert_eq!(bounds.start(), &at("2024-02-29T00:00:00Z"));
        assert_eq!(bounds.end(), &at("2024-02-29T23:59:59.999Z"));

        let bounds = day_bounds_utc(ymd(2024, 12, 31));
        assert!(bounds.contains(&at("2025-01-01T00:00:00Z")) == false);
    }

    #[test]
    fn device_offset_does_not_shift_the_day() {
        // A device in UTC-5 picks December 8th late in the evening: this is already December 9th in UTC
        let utc_minus_5 = FixedOffset::west_opt(5 * 3600).unwrap();
        let picked = utc_minus_5.from_local_datetime(
            &ymd(2024, 12, 8).and_hms_opt(21, 0, 0).unwrap()
        ).unwrap();
        assert_eq!(picked.with_timezone(&Utc).date_naive(), ymd(2024, 12, 9));

        let day = selected_day(&picked);
        assert_eq!(day, ymd(2024, 12, 8));

        let bounds = day_bounds_utc(day);
        assert!(bounds.contains(&at("2024-12-08T02:00:00Z")));
        assert!(bounds.contains(&at("2024-12-08T23:30:00Z")));
        assert!(bounds.contains(&at("2024-12-09T00:30:00Z")) == false);
    }

    #[test]
    fn grouping() {
        let task = |id: &str, start: Option<&str>| Task::new_with_parameters(
            TaskId::from(id), id.to_string(), None, None, None,
            start.map(at), None, false);
        let tasks = vec![
            task("a", Some("2024-12-08T02:00:00Z")),
            task("b", None),
            task("c", Some("2024-12-09T00:30:00Z")),
            task("d", Some("2024-12-08T23:30:00Z")),
        ];

        let days = group_by_day(&tasks);
        assert_eq!(days.len(), 2);
        let ids: Vec<&str> = days[&ymd(2024, 12, 8)].iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert_eq!(days[&ymd(2024, 12, 9)].len(), 1);
    }
}
