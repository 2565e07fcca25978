use std::{fmt, str::FromStr};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{ChildId, EngineError, LessonId, OperatorId};

/// How many weekly copies the recurrence generator proposes.
pub const RECURRENCE_WEEKS: u64 = 4;

/// Wall-clock time of day, serialized as zero-padded `HH:MM`.
///
/// Fixed-width formatting keeps lexicographic ordering of the serialized form
/// consistent with the time ordering, so stored records can be compared as
/// strings as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// Adds minutes, wrapping around midnight like a wall clock.
    #[must_use]
    pub fn plus_minutes(self, minutes: i64) -> Self {
        Self(self.0 + chrono::Duration::minutes(minutes))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = EngineError;

    /// Parses `HH:MM` or the compact 4-digit `HHMM` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation("invalid time".to_string());
        let trimmed = s.trim();

        let (hours, minutes) = if let Some((h, m)) = trimmed.split_once(':') {
            (h, m)
        } else if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            trimmed.split_at(2)
        } else {
            return Err(invalid());
        };

        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hours.parse().map_err(|_| invalid())?;
        let minute: u32 = minutes.parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A scheduled tutoring session.
///
/// The three flags are independent: a lesson counts toward the billing
/// ledger only while `completed && !cancelled`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub operator: OperatorId,
    pub child_id: ChildId,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub completed: bool,
    pub cancelled: bool,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    /// Validates the time invariant and builds a fresh, unmarked lesson.
    pub fn new(
        operator: OperatorId,
        child_id: ChildId,
        date: NaiveDate,
        start_time: ClockTime,
        end_time: ClockTime,
    ) -> Result<Self, EngineError> {
        if end_time <= start_time {
            return Err(EngineError::EndNotAfterStart);
        }
        let now = Utc::now();
        Ok(Self {
            id: LessonId::new(),
            operator,
            child_id,
            date,
            start_time,
            end_time,
            completed: false,
            cancelled: false,
            paid: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the session was actually held and counts against payments.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.completed && !self.cancelled
    }
}

/// Candidate dates for the weekly recurrence: the same weekday for each of
/// the next [`RECURRENCE_WEEKS`] weeks after `base`.
#[must_use]
pub fn recurrence_candidates(base: NaiveDate) -> Vec<NaiveDate> {
    (1..=RECURRENCE_WEEKS)
        .filter_map(|week| base.checked_add_days(Days::new(week * 7)))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clock_parses_both_forms() {
        assert_eq!("10:00".parse::<ClockTime>().unwrap().to_string(), "10:00");
        assert_eq!("1000".parse::<ClockTime>().unwrap().to_string(), "10:00");
        assert_eq!("9:05".parse::<ClockTime>().unwrap().to_string(), "09:05");
    }

    #[test]
    fn clock_rejects_garbage() {
        assert!("25:00".parse::<ClockTime>().is_err());
        assert!("10:60".parse::<ClockTime>().is_err());
        assert!("100".parse::<ClockTime>().is_err());
        assert!("10000".parse::<ClockTime>().is_err());
        assert!("ab:cd".parse::<ClockTime>().is_err());
    }

    #[test]
    fn clock_quick_pick_offsets() {
        let start = "10:00".parse::<ClockTime>().unwrap();
        assert_eq!(start.plus_minutes(30).to_string(), "10:30");
        assert_eq!(start.plus_minutes(55).to_string(), "10:55");
    }

    #[test]
    fn lesson_rejects_end_not_after_start() {
        let start = "10:00".parse::<ClockTime>().unwrap();
        let child = ChildId::new();
        let op = OperatorId::new(1);
        let err = Lesson::new(op, child, date(2024, 11, 14), start, start).unwrap_err();
        assert_eq!(err, EngineError::EndNotAfterStart);

        let earlier = "09:30".parse::<ClockTime>().unwrap();
        assert!(Lesson::new(op, child, date(2024, 11, 14), start, earlier).is_err());
    }

    #[test]
    fn recurrence_is_weekly_for_four_weeks() {
        let base = date(2024, 11, 14);
        let candidates = recurrence_candidates(base);
        assert_eq!(
            candidates,
            vec![
                date(2024, 11, 21),
                date(2024, 11, 28),
                date(2024, 12, 5),
                date(2024, 12, 12),
            ]
        );
        // Same weekday throughout.
        assert!(candidates.iter().all(|d| d.weekday() == base.weekday()));
    }

    #[test]
    fn clock_serde_round_trips_as_string() {
        let time = "09:05".parse::<ClockTime>().unwrap();
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"09:05\"");
        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, time);
    }
}
