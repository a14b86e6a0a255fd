//! Repeat-rule expansion for calendar views.
//!
//! Given the events loaded for a user and the visible days of a month,
//! computes which days each event occurs on. The expansion is a pure
//! function of its inputs, so a view layer can re-derive it on every
//! change without hidden state.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::event::{Event, Frequency};

/// Day -> events occurring that day, deduplicated by event id.
pub type OccurrenceMap = BTreeMap<NaiveDate, Vec<Event>>;

/// Expand `events` over `days`, including repeat occurrences.
///
/// Within a day, events are ordered by title then id so the result is
/// deterministic regardless of input order.
pub fn expand_events(events: &[Event], days: &[NaiveDate]) -> OccurrenceMap {
    let mut map = OccurrenceMap::new();

    for &day in days {
        for event in events {
            if occurs_on(event, day) {
                add_occurrence(&mut map, day, event);
            }
        }
    }

    for list in map.values_mut() {
        list.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
    }

    map
}

/// Whether `event` occurs on `day`.
///
/// An event always occurs on its own base date, regardless of any
/// repeat rule. Repeat occurrences never precede the base date.
pub fn occurs_on(event: &Event, day: NaiveDate) -> bool {
    if day == event.date {
        return true;
    }

    let Some(rule) = &event.repeat else {
        return false;
    };
    if day < event.date {
        return false;
    }

    let interval = i64::from(rule.effective_interval());
    let offset_days = (day - event.date).num_days();

    match rule.frequency {
        Frequency::None => false,
        Frequency::Daily => offset_days % interval == 0,
        Frequency::Weekly => {
            rule.days.contains(&day.weekday()) && (offset_days / 7) % interval == 0
        }
        Frequency::Monthly => rule.day_of_month == Some(day.day()),
    }
}

/// An event cannot appear twice on the same day, even if it is listed
/// twice in the input (e.g. loaded through two scopes).
fn add_occurrence(map: &mut OccurrenceMap, day: NaiveDate, event: &Event) {
    let list = map.entry(day).or_default();
    if !list.iter().any(|e| e.id == event.id) {
        list.push(event.clone());
    }
}
