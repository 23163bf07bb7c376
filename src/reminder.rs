use std::fmt;

use chrono::{NaiveTime, Timelike, Weekday};
use thiserror::Error;

pub type ReminderId = i64;

/// Id value of a reminder that has not been persisted yet.
pub const UNASSIGNED_ID: ReminderId = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("reminder label is empty")]
    EmptyLabel,
    #[error("reminder has no weekdays selected")]
    EmptyDays,
    #[error("time of day out of range: {hour}:{minute}")]
    InvalidTime { hour: u32, minute: u32 },
}

/// Wall-clock time of day a reminder fires at, truncated to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or(ValidationError::InvalidTime { hour, minute })
    }

    pub fn from_naive(inner: NaiveTime) -> Self {
        let truncated =
            NaiveTime::from_hms_opt(inner.hour(), inner.minute(), 0).expect("Will never fail.");
        Self(truncated)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Set of weekdays a reminder repeats on. Duplicates collapse, order is
/// irrelevant, iteration always runs Mon..Sun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !(1 << day.num_days_from_monday());
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> {
        let set = *self;
        ALL_DAYS.into_iter().filter(move |day| set.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: ReminderId,
    pub label: String,
    pub time: ReminderTime,
    pub days: WeekdaySet,
}

impl Reminder {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(&self.label, &self.days)
    }
}

/// Input to [`crate::storage::ReminderStorage::insert`]; the store assigns
/// the id on commit.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub label: String,
    pub time: ReminderTime,
    pub days: WeekdaySet,
}

impl NewReminder {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(&self.label, &self.days)
    }
}

fn validate(label: &str, days: &WeekdaySet) -> Result<(), ValidationError> {
    if label.trim().is_empty() {
        return Err(ValidationError::EmptyLabel);
    }
    if days.is_empty() {
        return Err(ValidationError::EmptyDays);
    }
    Ok(())
}

/// "You have N reminders." subtitle shown above the reminder list.
pub fn reminder_count_line(count: usize) -> String {
    match count {
        0 => "You have no reminders.".to_string(),
        1 => "You have 1 reminder.".to_string(),
        n => format!("You have {n} reminders."),
    }
}

/// Time-of-day greeting for the list header.
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning.",
        12..=16 => "Good afternoon.",
        17..=20 => "Good evening.",
        _ => "Good night.",
    }
}
