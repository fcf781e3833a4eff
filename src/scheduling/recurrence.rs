//! Recurrence rules and due-time computation.
//!
//! A recurrence is descriptive, not materialized: no future occurrence rows
//! exist anywhere. The next occurrence is always derived on the fly from the
//! rule and the caller's clock.

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::ScheduleError;

/// Look-ahead used by the pending-alert query. Fixed, not configuration.
pub const PENDING_WINDOW_MINUTES: i64 = 5;

/// Discriminant stored in the `recurrence` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    MultiplePerDay,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::MultiplePerDay => "multiple_per_day",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ScheduleError> {
        match s {
            "none" => Ok(RecurrenceKind::None),
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "multiple_per_day" => Ok(RecurrenceKind::MultiplePerDay),
            other => Err(ScheduleError::UnknownRecurrence(other.to_string())),
        }
    }
}

/// A validated recurrence rule. Exactly one payload shape per kind, so a
/// normalized alert cannot carry detail fields from two kinds at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    /// Fires once, at the alert's `starts_at`.
    None,
    Daily { time: NaiveTime },
    Weekly { weekday: Weekday, time: NaiveTime },
    MultiplePerDay { times: Vec<NaiveTime> },
}

/// Flat column values for one recurrence rule. Columns not belonging to the
/// rule's kind are `None`, which is what keeps the stored row mutually
/// exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrenceColumns {
    pub daily_time: Option<NaiveTime>,
    pub weekly_day: Option<i16>,
    pub weekly_time: Option<NaiveTime>,
    pub times_of_day: Option<String>,
}

impl Recurrence {
    pub fn kind(&self) -> RecurrenceKind {
        match self {
            Recurrence::None => RecurrenceKind::None,
            Recurrence::Daily { .. } => RecurrenceKind::Daily,
            Recurrence::Weekly { .. } => RecurrenceKind::Weekly,
            Recurrence::MultiplePerDay { .. } => RecurrenceKind::MultiplePerDay,
        }
    }

    /// Next occurrence at or after `now`. `starts_at` is only consulted for
    /// one-shot alerts, whose single occurrence is the window start itself.
    pub fn next_occurrence(&self, now: NaiveDateTime, starts_at: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        match self {
            Recurrence::None => starts_at,
            Recurrence::Daily { time } => {
                let candidate = today.and_time(*time);
                if candidate >= now {
                    candidate
                } else {
                    (today + Days::new(1)).and_time(*time)
                }
            }
            Recurrence::Weekly { weekday, time } => {
                let ahead = (weekday.num_days_from_monday() + 7
                    - now.weekday().num_days_from_monday())
                    % 7;
                let candidate = (today + Days::new(u64::from(ahead))).and_time(*time);
                if candidate >= now {
                    candidate
                } else {
                    // same weekday but the time already passed today
                    (today + Days::new(7)).and_time(*time)
                }
            }
            Recurrence::MultiplePerDay { times } => {
                if let Some(candidate) =
                    times.iter().map(|t| today.and_time(*t)).filter(|c| *c >= now).min()
                {
                    return candidate;
                }
                match times.iter().min() {
                    Some(earliest) => (today + Days::new(1)).and_time(*earliest),
                    // unreachable for validated rows; degrade to the one-shot answer
                    None => starts_at,
                }
            }
        }
    }

    /// Flatten into the storage columns, clearing everything that does not
    /// belong to this kind.
    pub fn detail_columns(&self) -> RecurrenceColumns {
        match self {
            Recurrence::None => RecurrenceColumns::default(),
            Recurrence::Daily { time } => RecurrenceColumns {
                daily_time: Some(*time),
                ..Default::default()
            },
            Recurrence::Weekly { weekday, time } => RecurrenceColumns {
                weekly_day: Some(weekday_index(*weekday)),
                weekly_time: Some(*time),
                ..Default::default()
            },
            Recurrence::MultiplePerDay { times } => RecurrenceColumns {
                times_of_day: Some(format_time_list(times)),
                ..Default::default()
            },
        }
    }

    /// Rebuild the rule from stored columns. Returns `None` for rows whose
    /// detail columns do not line up with their kind (such rows cannot be
    /// produced by the validator).
    pub fn from_columns(kind: RecurrenceKind, columns: &RecurrenceColumns) -> Option<Self> {
        match kind {
            RecurrenceKind::None => Some(Recurrence::None),
            RecurrenceKind::Daily => columns.daily_time.map(|time| Recurrence::Daily { time }),
            RecurrenceKind::Weekly => {
                let weekday = weekday_from_index(columns.weekly_day?).ok()?;
                let time = columns.weekly_time?;
                Some(Recurrence::Weekly { weekday, time })
            }
            RecurrenceKind::MultiplePerDay => {
                let raw = columns.times_of_day.as_deref()?;
                let times = parse_time_list(raw).ok()?;
                Some(Recurrence::MultiplePerDay { times })
            }
        }
    }
}

/// Strict `HH:MM` parse, 0-23 hours and 0-59 minutes. Anything else, trailing
/// input included, is rejected.
pub fn parse_time(s: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| ScheduleError::InvalidTimeFormat(s.to_string()))
}

/// Parse a comma-separated `HH:MM` list into a sorted, deduplicated set.
/// Whitespace around entries is ignored and empty segments are dropped; a
/// single malformed entry rejects the whole list.
pub fn parse_time_list(raw: &str) -> Result<Vec<NaiveTime>, ScheduleError> {
    let mut times = Vec::new();
    for segment in raw.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        times.push(parse_time(segment)?);
    }
    if times.is_empty() {
        return Err(ScheduleError::MissingMultipleTimes);
    }
    times.sort();
    times.dedup();
    Ok(times)
}

/// Canonical storage form of a multi-time list.
pub fn format_time_list(times: &[NaiveTime]) -> String {
    times
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// 0 = Monday .. 6 = Sunday, matching the stored `weekly_day` column.
pub fn weekday_from_index(index: i16) -> Result<Weekday, ScheduleError> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        other => Err(ScheduleError::InvalidWeekday(other)),
    }
}

pub fn weekday_index(weekday: Weekday) -> i16 {
    weekday.num_days_from_monday() as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time_valid() {
        assert_eq!(parse_time("08:00").unwrap(), hm(8, 0));
        assert_eq!(parse_time("23:59").unwrap(), hm(23, 59));
        assert_eq!(parse_time("00:00").unwrap(), hm(0, 0));
    }

    #[test]
    fn test_parse_time_rejects_out_of_range() {
        assert!(matches!(
            parse_time("24:00"),
            Err(ScheduleError::InvalidTimeFormat(_))
        ));
        assert!(matches!(
            parse_time("10:60"),
            Err(ScheduleError::InvalidTimeFormat(_))
        ));
        assert!(matches!(
            parse_time("25:61"),
            Err(ScheduleError::InvalidTimeFormat(_))
        ));
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time("").is_err());
        assert!(parse_time("0800").is_err());
        assert!(parse_time("08:00:00").is_err());
        assert!(parse_time("soon").is_err());
    }

    #[test]
    fn test_parse_time_list_sorted_and_deduped() {
        let times = parse_time_list("20:30, 08:00,14:00,08:00").unwrap();
        assert_eq!(times, vec![hm(8, 0), hm(14, 0), hm(20, 30)]);
    }

    #[test]
    fn test_parse_time_list_spec_example() {
        let times = parse_time_list("08:00,14:00,20:30").unwrap();
        assert_eq!(times, vec![hm(8, 0), hm(14, 0), hm(20, 30)]);
        assert!(times[0] < times[1] && times[1] < times[2]);
    }

    #[test]
    fn test_parse_time_list_rejects_whole_list_on_one_bad_entry() {
        assert_eq!(
            parse_time_list("08:00,25:61"),
            Err(ScheduleError::InvalidTimeFormat("25:61".to_string()))
        );
    }

    #[test]
    fn test_parse_time_list_empty_segments_only() {
        assert_eq!(parse_time_list(",, ,"), Err(ScheduleError::MissingMultipleTimes));
    }

    #[test]
    fn test_format_time_list_round_trips() {
        let times = parse_time_list(" 14:00 ,08:00").unwrap();
        assert_eq!(format_time_list(&times), "08:00,14:00");
    }

    #[test]
    fn test_daily_before_todays_time() {
        let rec = Recurrence::Daily { time: hm(10, 3) };
        let now = at(2024, 1, 1, 10, 0);
        assert_eq!(rec.next_occurrence(now, now), at(2024, 1, 1, 10, 3));
    }

    #[test]
    fn test_daily_after_todays_time_rolls_to_tomorrow() {
        let rec = Recurrence::Daily { time: hm(9, 0) };
        let now = at(2024, 1, 1, 10, 0);
        assert_eq!(rec.next_occurrence(now, now), at(2024, 1, 2, 9, 0));
    }

    #[test]
    fn test_daily_exact_moment_counts() {
        let rec = Recurrence::Daily { time: hm(10, 0) };
        let now = at(2024, 1, 1, 10, 0);
        assert_eq!(rec.next_occurrence(now, now), now);
    }

    #[test]
    fn test_weekly_later_in_week() {
        // 2024-01-01 is a Monday
        let rec = Recurrence::Weekly {
            weekday: Weekday::Fri,
            time: hm(9, 0),
        };
        let now = at(2024, 1, 1, 8, 0);
        assert_eq!(rec.next_occurrence(now, now), at(2024, 1, 5, 9, 0));
    }

    #[test]
    fn test_weekly_same_day_time_passed_rolls_a_week() {
        let rec = Recurrence::Weekly {
            weekday: Weekday::Mon,
            time: hm(7, 0),
        };
        let now = at(2024, 1, 1, 8, 0);
        assert_eq!(rec.next_occurrence(now, now), at(2024, 1, 8, 7, 0));
    }

    #[test]
    fn test_weekly_earlier_weekday_wraps_forward() {
        // asked on Friday for a Tuesday slot
        let rec = Recurrence::Weekly {
            weekday: Weekday::Tue,
            time: hm(9, 0),
        };
        let now = at(2024, 1, 5, 12, 0);
        assert_eq!(rec.next_occurrence(now, now), at(2024, 1, 9, 9, 0));
    }

    #[test]
    fn test_multiple_per_day_picks_smallest_future() {
        let rec = Recurrence::MultiplePerDay {
            times: vec![hm(8, 0), hm(14, 0), hm(20, 30)],
        };
        let now = at(2024, 1, 1, 9, 0);
        assert_eq!(rec.next_occurrence(now, now), at(2024, 1, 1, 14, 0));
    }

    #[test]
    fn test_multiple_per_day_all_passed_rolls_to_tomorrow_earliest() {
        let rec = Recurrence::MultiplePerDay {
            times: vec![hm(8, 0), hm(14, 0)],
        };
        let now = at(2024, 1, 1, 21, 0);
        assert_eq!(rec.next_occurrence(now, now), at(2024, 1, 2, 8, 0));
    }

    #[test]
    fn test_one_shot_occurrence_is_window_start() {
        let rec = Recurrence::None;
        let starts = at(2023, 1, 1, 0, 0);
        let now = at(2024, 1, 1, 10, 0);
        assert_eq!(rec.next_occurrence(now, starts), starts);
    }

    #[test]
    fn test_detail_columns_mutually_exclusive() {
        let daily = Recurrence::Daily { time: hm(8, 0) }.detail_columns();
        assert!(daily.daily_time.is_some());
        assert!(daily.weekly_day.is_none() && daily.weekly_time.is_none());
        assert!(daily.times_of_day.is_none());

        let weekly = Recurrence::Weekly {
            weekday: Weekday::Wed,
            time: hm(9, 30),
        }
        .detail_columns();
        assert_eq!(weekly.weekly_day, Some(2));
        assert!(weekly.weekly_time.is_some());
        assert!(weekly.daily_time.is_none() && weekly.times_of_day.is_none());

        let multi = Recurrence::MultiplePerDay {
            times: vec![hm(8, 0)],
        }
        .detail_columns();
        assert_eq!(multi.times_of_day.as_deref(), Some("08:00"));
        assert!(multi.daily_time.is_none());
        assert!(multi.weekly_day.is_none() && multi.weekly_time.is_none());

        assert_eq!(Recurrence::None.detail_columns(), RecurrenceColumns::default());
    }

    #[test]
    fn test_from_columns_round_trip() {
        let original = Recurrence::Weekly {
            weekday: Weekday::Sun,
            time: hm(22, 15),
        };
        let rebuilt =
            Recurrence::from_columns(RecurrenceKind::Weekly, &original.detail_columns()).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_from_columns_rejects_mismatched_row() {
        let columns = RecurrenceColumns {
            daily_time: Some(hm(8, 0)),
            ..Default::default()
        };
        assert!(Recurrence::from_columns(RecurrenceKind::Weekly, &columns).is_none());
    }

    #[test]
    fn test_weekday_index_mapping() {
        assert_eq!(weekday_from_index(0).unwrap(), Weekday::Mon);
        assert_eq!(weekday_from_index(6).unwrap(), Weekday::Sun);
        assert_eq!(weekday_from_index(7), Err(ScheduleError::InvalidWeekday(7)));
        assert_eq!(weekday_index(Weekday::Fri), 4);
    }
}
