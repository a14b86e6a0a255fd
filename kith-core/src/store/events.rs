//! Event operations.
//!
//! Events are stored in one collection with an explicit owner: a user
//! (private) or a circle (shared with every member). The repeat rule is
//! stored as a JSON column since only the expander interprets it.

use rusqlite::{params, OptionalExtension, Row};

use crate::error::{KithError, KithResult};
use crate::event::{Event, EventOwner, RepeatRule};
use crate::store::{
    date_from_column, date_to_column, time_from_column, time_to_column, Store,
};

struct EventRow {
    id: String,
    title: String,
    date: String,
    start_time: Option<String>,
    end_time: Option<String>,
    repeat_rule: Option<String>,
    owner_kind: String,
    owner_id: String,
}

fn event_from_row(row: &Row) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get("id")?,
        title: row.get("title")?,
        date: row.get("date")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        repeat_rule: row.get("repeat_rule")?,
        owner_kind: row.get("owner_kind")?,
        owner_id: row.get("owner_id")?,
    })
}

fn into_event(raw: EventRow) -> KithResult<Event> {
    let owner = match raw.owner_kind.as_str() {
        "user" => EventOwner::User(raw.owner_id),
        "circle" => EventOwner::Circle(raw.owner_id),
        other => {
            return Err(KithError::Store(format!(
                "Unknown event owner kind '{}'",
                other
            )))
        }
    };

    let repeat: Option<RepeatRule> = raw
        .repeat_rule
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;

    Ok(Event {
        id: raw.id,
        title: raw.title,
        date: date_from_column(&raw.date)?,
        start_time: raw.start_time.as_deref().map(time_from_column).transpose()?,
        end_time: raw.end_time.as_deref().map(time_from_column).transpose()?,
        repeat,
        owner,
    })
}

fn owner_columns(owner: &EventOwner) -> (&'static str, &str) {
    match owner {
        EventOwner::User(id) => ("user", id),
        EventOwner::Circle(id) => ("circle", id),
    }
}

impl Store {
    pub fn create_event(&self, event: &Event) -> KithResult<()> {
        let (owner_kind, owner_id) = owner_columns(&event.owner);
        let repeat = event
            .repeat
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO events (id, title, date, start_time, end_time, repeat_rule, owner_kind, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.id,
                event.title,
                date_to_column(&event.date),
                event.start_time.as_ref().map(time_to_column),
                event.end_time.as_ref().map(time_to_column),
                repeat,
                owner_kind,
                owner_id
            ],
        )?;
        Ok(())
    }

    pub fn event(&self, id: &str) -> KithResult<Event> {
        let raw = self
            .conn
            .query_row(
                "SELECT * FROM events WHERE id = ?1",
                params![id],
                event_from_row,
            )
            .optional()?
            .ok_or_else(|| KithError::EventNotFound(id.to_string()))?;
        into_event(raw)
    }

    /// Overwrite an event's fields. Ownership does not change.
    pub fn update_event(&self, event: &Event) -> KithResult<()> {
        let repeat = event
            .repeat
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let changed = self.conn.execute(
            "UPDATE events SET title = ?2, date = ?3, start_time = ?4, end_time = ?5, repeat_rule = ?6
             WHERE id = ?1",
            params![
                event.id,
                event.title,
                date_to_column(&event.date),
                event.start_time.as_ref().map(time_to_column),
                event.end_time.as_ref().map(time_to_column),
                repeat
            ],
        )?;

        if changed == 0 {
            return Err(KithError::EventNotFound(event.id.clone()));
        }
        Ok(())
    }

    pub fn delete_event(&self, id: &str) -> KithResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(KithError::EventNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn events_for_owner(&self, owner: &EventOwner) -> KithResult<Vec<Event>> {
        let (owner_kind, owner_id) = owner_columns(owner);
        let mut stmt = self.conn.prepare(
            "SELECT * FROM events WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![owner_kind, owner_id], event_from_row)?;

        rows.map(|raw| into_event(raw?)).collect()
    }

    /// Events `user_id` can see: their own plus those of every circle
    /// they have joined.
    pub fn events_visible_to(&self, user_id: &str) -> KithResult<Vec<Event>> {
        let mut events = self.events_for_owner(&EventOwner::User(user_id.to_string()))?;

        for circle in self.joined_circles(user_id)? {
            events.extend(self.events_for_owner(&EventOwner::Circle(circle.id))?);
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Frequency;
    use chrono::{NaiveDate, NaiveTime, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_event_roundtrips_through_store() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("Alice", "alice@example.com").unwrap();

        let mut event = Event::new("Soccer practice", date(2024, 3, 4), EventOwner::User(user.id.clone()));
        event.start_time = NaiveTime::from_hms_opt(17, 30, 0);
        event.repeat = Some(RepeatRule {
            frequency: Frequency::Weekly,
            interval: 1,
            days: vec![Weekday::Mon, Weekday::Fri],
            day_of_month: None,
        });
        store.create_event(&event).unwrap();

        let fetched = store.event(&event.id).unwrap();
        assert_eq!(fetched.title, "Soccer practice");
        assert_eq!(fetched.date, event.date);
        assert_eq!(fetched.start_time, event.start_time);
        assert_eq!(fetched.repeat, event.repeat);
        assert_eq!(fetched.owner, event.owner);
    }

    #[test]
    fn test_update_overwrites_fields() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("Alice", "alice@example.com").unwrap();
        let mut event = Event::new("Dentist", date(2024, 3, 4), EventOwner::User(user.id.clone()));
        store.create_event(&event).unwrap();

        event.title = "Dentist (rescheduled)".into();
        event.date = date(2024, 3, 11);
        store.update_event(&event).unwrap();

        let fetched = store.event(&event.id).unwrap();
        assert_eq!(fetched.title, "Dentist (rescheduled)");
        assert_eq!(fetched.date, date(2024, 3, 11));
    }

    #[test]
    fn test_update_missing_event_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let event = Event::new("Ghost", date(2024, 3, 4), EventOwner::User("u1".into()));

        assert!(matches!(
            store.update_event(&event),
            Err(KithError::EventNotFound(_))
        ));
    }

    #[test]
    fn test_delete_event() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("Alice", "alice@example.com").unwrap();
        let event = Event::new("Dentist", date(2024, 3, 4), EventOwner::User(user.id.clone()));
        store.create_event(&event).unwrap();

        store.delete_event(&event.id).unwrap();
        assert!(store.event(&event.id).is_err());
        assert!(store.delete_event(&event.id).is_err());
    }

    #[test]
    fn test_visible_events_include_joined_circles() {
        let mut store = Store::open_in_memory().unwrap();
        let alice = store.create_user("Alice", "alice@example.com").unwrap();
        let bob = store.create_user("Bob", "bob@example.com").unwrap();
        let circle = store.create_circle("Family", &alice.id).unwrap();

        let private = Event::new("Alice only", date(2024, 3, 4), EventOwner::User(alice.id.clone()));
        let shared = Event::new("Family dinner", date(2024, 3, 8), EventOwner::Circle(circle.id.clone()));
        let foreign = Event::new("Bob only", date(2024, 3, 9), EventOwner::User(bob.id.clone()));
        for event in [&private, &shared, &foreign] {
            store.create_event(event).unwrap();
        }

        let titles: Vec<String> = store
            .events_visible_to(&alice.id)
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();

        assert!(titles.contains(&"Alice only".to_string()));
        assert!(titles.contains(&"Family dinner".to_string()));
        assert!(!titles.contains(&"Bob only".to_string()));

        // Bob is not in the circle, so he sees only his own event
        let bob_titles: Vec<String> = store
            .events_visible_to(&bob.id)
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(bob_titles, vec!["Bob only".to_string()]);
    }
}
