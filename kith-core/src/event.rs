//! Calendar event types.
//!
//! Events use calendar-day granularity: the date is a plain `NaiveDate`
//! and occurrence checks are calendar-date equality, never instant
//! comparisons across timezones.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar event owned by a user or shared with a circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    /// Day the event (first) occurs on
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    /// How the event repeats; absent for one-off events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatRule>,
    pub owner: EventOwner,
}

impl Event {
    pub fn new(title: impl Into<String>, date: NaiveDate, owner: EventOwner) -> Self {
        Event {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            date,
            start_time: None,
            end_time: None,
            repeat: None,
            owner,
        }
    }
}

/// Who an event belongs to. User events are private to their owner;
/// circle events are visible to every member of the circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EventOwner {
    User(String),
    Circle(String),
}

/// A structured repeat rule: frequency, interval, and the frequency's
/// parameters (weekday set for weekly, day-of-month for monthly).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRule {
    pub frequency: Frequency,
    /// Every `interval` days/weeks/months. Zero is treated as one.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Weekdays the event repeats on, for weekly frequency
    #[serde(default)]
    pub days: Vec<Weekday>,
    /// Day of month the event repeats on, for monthly frequency
    #[serde(default)]
    pub day_of_month: Option<u32>,
}

impl RepeatRule {
    /// Interval with the zero guard applied.
    pub fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }
}

fn default_interval() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    None,
    Daily,
    Weekly,
    Monthly,
}
