//! Pure next-occurrence computation for weekly reminders.
//!
//! Reminders carry a local wall-clock time plus a weekday set; this module
//! turns them into concrete UTC instants for the alarm backend.

use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use thiserror::Error;

use crate::reminder::Reminder;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OccurrenceError {
    #[error("reminder has no weekdays selected")]
    NoDaysSelected,
    #[error("no resolvable local fire time within the search window")]
    UnresolvableLocalTime,
}

/// Earliest instant strictly after `after` at which the reminder fires.
///
/// One candidate per selected weekday: the next calendar date on that weekday
/// at the reminder's time of day, interpreted in `tz`. A candidate whose local
/// reading is not strictly after `after` rolls to the following week, so an
/// occurrence landing exactly on the reference instant counts as not yet due.
pub fn next_occurrence(
    reminder: &Reminder,
    after: DateTime<Utc>,
    tz: Tz,
) -> Result<DateTime<Utc>, OccurrenceError> {
    if reminder.days.is_empty() {
        return Err(OccurrenceError::NoDaysSelected);
    }

    let local_after = after.with_timezone(&tz).naive_local();
    let mut earliest: Option<DateTime<Utc>> = None;

    for day in reminder.days.iter() {
        let candidate = resolve_candidate(day, reminder, after, local_after, tz)?;
        earliest = Some(match earliest {
            Some(current) if current <= candidate => current,
            _ => candidate,
        });
    }

    // Non-empty day set yields at least one candidate.
    earliest.ok_or(OccurrenceError::UnresolvableLocalTime)
}

fn resolve_candidate(
    day: Weekday,
    reminder: &Reminder,
    after: DateTime<Utc>,
    local_after: NaiveDateTime,
    tz: Tz,
) -> Result<DateTime<Utc>, OccurrenceError> {
    let days_ahead =
        (day.num_days_from_monday() + 7 - local_after.weekday().num_days_from_monday()) % 7;
    let mut date = local_after
        .date()
        .checked_add_days(Days::new(u64::from(days_ahead)))
        .ok_or(OccurrenceError::UnresolvableLocalTime)?;

    if date.and_time(reminder.time.time()) <= local_after {
        date = date
            .checked_add_days(Days::new(7))
            .ok_or(OccurrenceError::UnresolvableLocalTime)?;
    }

    // A local reading erased by a spring-forward transition moves to the same
    // weekday one week later; transitions cannot erase it two weeks running.
    // The `dt <= after` arm covers a reference instant sitting in the second
    // pass of a fall-back hour, where the naive comparison alone is not enough.
    for _ in 0..3 {
        let naive = date.and_time(reminder.time.time());
        let resolved = match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(earlier, _) => Some(earlier),
            LocalResult::None => None,
        };

        match resolved {
            Some(dt) if dt.with_timezone(&Utc) > after => return Ok(dt.with_timezone(&Utc)),
            _ => {
                date = date
                    .checked_add_days(Days::new(7))
                    .ok_or(OccurrenceError::UnresolvableLocalTime)?;
            }
        }
    }

    Err(OccurrenceError::UnresolvableLocalTime)
}
