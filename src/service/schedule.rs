//! Recurring-schedule calculator
//!
//! Converts a user's local wall-clock recurrence into exact UTC run instants.
//! All functions are pure; `now` is injected so the calculator is testable
//! against pinned instants, including DST transition dates.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::model::{Frequency, ScheduleSpec};

/// Day-of-month ceiling so every calendar month has a valid occurrence
const MAX_DAY_OF_MONTH: u8 = 28;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Unrecognized timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid schedule field: {0}")]
    InvalidField(String),
}

fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// Compute the next run instant, strictly greater than `now`.
///
/// `now` is projected into the target timezone's wall-clock fields, the
/// earliest candidate date matching the spec is chosen, and the candidate is
/// converted back to UTC with a DST-safe two-pass offset correction.
pub fn next_run(spec: &ScheduleSpec, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
    let tz = parse_timezone(&spec.timezone)?;
    if spec.hour > 23 {
        return Err(ScheduleError::InvalidField(format!(
            "hour {} out of range 0-23",
            spec.hour
        )));
    }

    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();
    let hour = u32::from(spec.hour);
    let hour_passed = local_now.hour() >= hour;

    let target_date = match spec.frequency {
        Frequency::Daily => {
            if hour_passed {
                today + Duration::days(1)
            } else {
                today
            }
        }
        Frequency::Weekly => {
            let target_dow = i64::from(spec.day_of_week.unwrap_or(1) % 7);
            let current_dow = i64::from(local_now.weekday().num_days_from_sunday());
            let mut days_ahead = (target_dow - current_dow).rem_euclid(7);
            // Same weekday with the hour already passed means a full week out,
            // never zero days.
            if days_ahead == 0 && hour_passed {
                days_ahead = 7;
            }
            today + Duration::days(days_ahead)
        }
        Frequency::Monthly => {
            let target_day = u32::from(spec.day_of_month.unwrap_or(1).clamp(1, MAX_DAY_OF_MONTH));
            let day = local_now.day();
            if day < target_day || (day == target_day && !hour_passed) {
                date_in_month(local_now.year(), local_now.month(), target_day)?
            } else {
                let (year, month) = if local_now.month() == 12 {
                    (local_now.year() + 1, 1)
                } else {
                    (local_now.year(), local_now.month() + 1)
                };
                date_in_month(year, month, target_day)?
            }
        }
    };

    let wall_clock = target_date
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| ScheduleError::InvalidField(format!("hour {}", spec.hour)))?;

    Ok(wall_clock_to_utc(tz, wall_clock))
}

fn date_in_month(year: i32, month: u32, day: u32) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ScheduleError::InvalidField(format!("day {} invalid for {}-{}", day, year, month))
    })
}

/// Convert a wall-clock time in `tz` to the UTC instant it names.
///
/// Two-pass offset correction: derive the offset as if the wall-clock fields
/// were UTC, apply it, then re-derive the offset at the corrected instant and
/// re-apply if it changed. A naive single pass lands on the wrong side of a
/// spring-forward or fall-back transition.
fn wall_clock_to_utc(tz: Tz, wall_clock: NaiveDateTime) -> DateTime<Utc> {
    let approx = Utc.from_utc_datetime(&wall_clock);

    let first_offset = i64::from(
        tz.offset_from_utc_datetime(&wall_clock)
            .fix()
            .local_minus_utc(),
    );
    let candidate = approx - Duration::seconds(first_offset);

    let second_offset = i64::from(
        tz.offset_from_utc_datetime(&candidate.naive_utc())
            .fix()
            .local_minus_utc(),
    );
    if second_offset != first_offset {
        approx - Duration::seconds(second_offset)
    } else {
        candidate
    }
}

/// Human-readable description of a schedule, e.g. "Every Monday at 6:00 AM"
pub fn describe(spec: &ScheduleSpec) -> String {
    let time = format_hour(spec.hour);
    match spec.frequency {
        Frequency::Daily => format!("Every day at {}", time),
        Frequency::Weekly => {
            let day = weekday_name(spec.day_of_week.unwrap_or(1) % 7);
            format!("Every {} at {}", day, time)
        }
        Frequency::Monthly => {
            let day = spec.day_of_month.unwrap_or(1).clamp(1, MAX_DAY_OF_MONTH);
            format!("Every month on day {} at {}", day, time)
        }
    }
}

/// Render a UTC instant in the given timezone for display
pub fn format_in_timezone(instant: DateTime<Utc>, timezone: &str) -> Result<String, ScheduleError> {
    let tz = parse_timezone(timezone)?;
    Ok(instant
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M %Z")
        .to_string())
}

fn format_hour(hour: u8) -> String {
    match hour {
        0 => "12:00 AM".to_string(),
        1..=11 => format!("{}:00 AM", hour),
        12 => "12:00 PM".to_string(),
        _ => format!("{}:00 PM", hour - 12),
    }
}

fn weekday_name(day_of_week: u8) -> &'static str {
    match day_of_week {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        _ => "Saturday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Frequency, ScheduleSpec};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn daily(hour: u8, timezone: &str) -> ScheduleSpec {
        ScheduleSpec {
            frequency: Frequency::Daily,
            hour,
            day_of_week: None,
            day_of_month: None,
            timezone: timezone.to_string(),
        }
    }

    fn local_rendering(instant: DateTime<Utc>, timezone: &str) -> String {
        format_in_timezone(instant, timezone).unwrap()
    }

    #[test]
    fn daily_same_day_when_hour_not_passed() {
        // 03:00 UTC = 04:00 CET in winter; 6 AM has not passed yet
        let now = utc(2026, 1, 15, 3, 0);
        let next = next_run(&daily(6, "Europe/Prague"), now).unwrap();
        assert_eq!(next, utc(2026, 1, 15, 5, 0));
    }

    #[test]
    fn daily_rolls_to_next_day_when_hour_passed() {
        let now = utc(2026, 1, 15, 9, 0);
        let next = next_run(&daily(6, "Europe/Prague"), now).unwrap();
        assert_eq!(next, utc(2026, 1, 16, 5, 0));
    }

    #[test]
    fn daily_dst_round_trip_winter_and_summer() {
        // Winter: Prague is UTC+1
        let winter = next_run(&daily(6, "Europe/Prague"), utc(2026, 1, 10, 12, 0)).unwrap();
        assert_eq!(local_rendering(winter, "Europe/Prague"), "2026-01-11 06:00 CET");

        // Summer: Prague is UTC+2
        let summer = next_run(&daily(6, "Europe/Prague"), utc(2026, 7, 10, 12, 0)).unwrap();
        assert_eq!(local_rendering(summer, "Europe/Prague"), "2026-07-11 06:00 CEST");
        assert_eq!(summer, utc(2026, 7, 11, 4, 0));
    }

    #[test]
    fn daily_across_spring_forward_transition() {
        // Europe/Prague springs forward on 2026-03-29 at 02:00 local.
        // A 6 AM schedule computed the evening before must land on
        // 06:00 CEST = 04:00 UTC, not 05:00 UTC.
        let now = utc(2026, 3, 28, 20, 0);
        let next = next_run(&daily(6, "Europe/Prague"), now).unwrap();
        assert_eq!(next, utc(2026, 3, 29, 4, 0));
        assert_eq!(local_rendering(next, "Europe/Prague"), "2026-03-29 06:00 CEST");
    }

    #[test]
    fn daily_across_fall_back_transition() {
        // Europe/Prague falls back on 2026-10-25 at 03:00 local.
        let now = utc(2026, 10, 24, 20, 0);
        let next = next_run(&daily(6, "Europe/Prague"), now).unwrap();
        assert_eq!(next, utc(2026, 10, 25, 5, 0));
        assert_eq!(local_rendering(next, "Europe/Prague"), "2026-10-25 06:00 CET");
    }

    #[test]
    fn daily_in_no_dst_zone() {
        // Tokyo never observes DST; 6 AM local is always 21:00 UTC previous day
        let next = next_run(&daily(6, "Asia/Tokyo"), utc(2026, 6, 15, 12, 0)).unwrap();
        assert_eq!(next, utc(2026, 6, 15, 21, 0));
        assert_eq!(local_rendering(next, "Asia/Tokyo"), "2026-06-16 06:00 JST");
    }

    #[test]
    fn daily_southern_hemisphere_dst() {
        // Sydney observes DST opposite to Europe: DST in January, none in July
        let january = next_run(&daily(9, "Australia/Sydney"), utc(2026, 1, 10, 0, 0)).unwrap();
        assert_eq!(january, utc(2026, 1, 10, 22, 0)); // UTC+11

        let july = next_run(&daily(9, "Australia/Sydney"), utc(2026, 7, 10, 0, 0)).unwrap();
        assert_eq!(july, utc(2026, 7, 10, 23, 0)); // UTC+10
    }

    #[test]
    fn weekly_same_day_hour_passed_advances_full_week() {
        // 2026-01-12 is a Monday; at 10:00 local the 6 AM Monday slot is gone
        let spec = ScheduleSpec {
            frequency: Frequency::Weekly,
            hour: 6,
            day_of_week: Some(1),
            day_of_month: None,
            timezone: "Europe/Prague".to_string(),
        };
        let now = utc(2026, 1, 12, 9, 0); // 10:00 CET
        let next = next_run(&spec, now).unwrap();
        assert_eq!(next, utc(2026, 1, 19, 5, 0));
    }

    #[test]
    fn weekly_targets_upcoming_weekday() {
        let spec = ScheduleSpec {
            frequency: Frequency::Weekly,
            hour: 6,
            day_of_week: Some(5), // Friday
            day_of_month: None,
            timezone: "Europe/Prague".to_string(),
        };
        let now = utc(2026, 1, 12, 9, 0); // Monday
        let next = next_run(&spec, now).unwrap();
        assert_eq!(next, utc(2026, 1, 16, 5, 0)); // Friday 2026-01-16
    }

    #[test]
    fn monthly_clamps_day_to_28() {
        let spec = ScheduleSpec {
            frequency: Frequency::Monthly,
            hour: 6,
            day_of_week: None,
            day_of_month: Some(31),
            timezone: "Europe/Prague".to_string(),
        };
        // February must still have a valid occurrence
        let now = utc(2026, 2, 1, 12, 0);
        let next = next_run(&spec, now).unwrap();
        assert_eq!(
            local_rendering(next, "Europe/Prague"),
            "2026-02-28 06:00 CET"
        );
    }

    #[test]
    fn monthly_rolls_over_december_to_january() {
        let spec = ScheduleSpec {
            frequency: Frequency::Monthly,
            hour: 6,
            day_of_week: None,
            day_of_month: Some(15),
            timezone: "Europe/Prague".to_string(),
        };
        let now = utc(2026, 12, 15, 9, 0); // hour passed on target day
        let next = next_run(&spec, now).unwrap();
        assert_eq!(
            local_rendering(next, "Europe/Prague"),
            "2027-01-15 06:00 CET"
        );
    }

    #[test]
    fn monthly_same_day_hour_not_passed_runs_today() {
        let spec = ScheduleSpec {
            frequency: Frequency::Monthly,
            hour: 20,
            day_of_week: None,
            day_of_month: Some(15),
            timezone: "Europe/Prague".to_string(),
        };
        let now = utc(2026, 6, 15, 9, 0);
        let next = next_run(&spec, now).unwrap();
        assert_eq!(
            local_rendering(next, "Europe/Prague"),
            "2026-06-15 20:00 CEST"
        );
    }

    #[test]
    fn result_is_strictly_greater_than_now() {
        // Exactly at the scheduled instant the next run is tomorrow
        let now = utc(2026, 1, 15, 5, 0); // 06:00 CET sharp
        let next = next_run(&daily(6, "Europe/Prague"), now).unwrap();
        assert!(next > now);
        assert_eq!(next, utc(2026, 1, 16, 5, 0));
    }

    #[test]
    fn invalid_timezone_fails_fast() {
        let err = next_run(&daily(6, "Mars/Olympus_Mons"), utc(2026, 1, 1, 0, 0)).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTimezone(_)));
    }

    #[test]
    fn invalid_hour_rejected() {
        let err = next_run(&daily(24, "Europe/Prague"), utc(2026, 1, 1, 0, 0)).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidField(_)));
    }

    #[test]
    fn describe_renders_schedules() {
        assert_eq!(describe(&daily(6, "Europe/Prague")), "Every day at 6:00 AM");

        let weekly = ScheduleSpec {
            frequency: Frequency::Weekly,
            hour: 18,
            day_of_week: Some(1),
            day_of_month: None,
            timezone: "Europe/Prague".to_string(),
        };
        assert_eq!(describe(&weekly), "Every Monday at 6:00 PM");

        let monthly = ScheduleSpec {
            frequency: Frequency::Monthly,
            hour: 0,
            day_of_week: None,
            day_of_month: Some(31),
            timezone: "Europe/Prague".to_string(),
        };
        assert_eq!(describe(&monthly), "Every month on day 28 at 12:00 AM");
    }
}
