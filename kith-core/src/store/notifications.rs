//! Notification operations and read receipts.
//!
//! Read state lives in a receipts table keyed by (notification, user),
//! so marking as read is naturally idempotent and the read set can only
//! grow.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::error::{KithError, KithResult};
use crate::notification::Notification;
use crate::store::{timestamp_from_column, timestamp_to_column, Store};

/// Outcome of a bulk mark-as-read: which updates landed and which
/// failed. Partial failure is reported, never swallowed.
#[derive(Debug, Default)]
pub struct ReadAllOutcome {
    pub updated: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl Store {
    pub fn publish_notification(&self, circle_id: &str, message: &str) -> KithResult<Notification> {
        self.circle(circle_id)?;

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            circle_id: circle_id.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
            read_by: vec![],
        };

        self.conn.execute(
            "INSERT INTO notifications (id, circle_id, message, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                notification.id,
                notification.circle_id,
                notification.message,
                timestamp_to_column(&notification.created_at)
            ],
        )?;

        Ok(notification)
    }

    /// All notifications with their read sets loaded.
    pub fn all_notifications(&self) -> KithResult<Vec<Notification>> {
        let mut read_by: HashMap<String, Vec<String>> = HashMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT notification_id, user_id FROM notification_reads")?;
        let receipts = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for receipt in receipts {
            let (notification_id, user_id) = receipt?;
            read_by.entry(notification_id).or_default().push(user_id);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, circle_id, message, created_at FROM notifications")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>("id")?,
                row.get::<_, String>("circle_id")?,
                row.get::<_, String>("message")?,
                row.get::<_, String>("created_at")?,
            ))
        })?;

        rows.map(|raw| {
            let (id, circle_id, message, created_at) = raw?;
            Ok(Notification {
                read_by: read_by.remove(&id).unwrap_or_default(),
                id,
                circle_id,
                message,
                created_at: timestamp_from_column(&created_at)?,
            })
        })
        .collect()
    }

    /// Record that `user_id` read a notification. Returns false when it
    /// was already read (marking twice has no additional effect).
    pub fn mark_notification_read(&self, notification_id: &str, user_id: &str) -> KithResult<bool> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM notifications WHERE id = ?1",
                params![notification_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(KithError::NotificationNotFound(notification_id.to_string()));
        }

        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO notification_reads (notification_id, user_id, read_at)
             VALUES (?1, ?2, ?3)",
            params![notification_id, user_id, timestamp_to_column(&Utc::now())],
        )?;

        Ok(changed > 0)
    }

    /// Mark every notification in `notification_ids` read for
    /// `user_id`, continuing past failures and reporting them.
    pub fn mark_all_read(&self, notification_ids: &[String], user_id: &str) -> ReadAllOutcome {
        let mut outcome = ReadAllOutcome::default();

        for id in notification_ids {
            match self.mark_notification_read(id, user_id) {
                Ok(_) => outcome.updated.push(id.clone()),
                Err(e) => outcome.failed.push((id.clone(), e.to_string())),
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{has_unread, visible_notifications};

    fn store_with_circle() -> (Store, String, String) {
        let mut store = Store::open_in_memory().unwrap();
        let alice = store.create_user("Alice", "alice@example.com").unwrap();
        let circle = store.create_circle("Family", &alice.id).unwrap();
        (store, alice.id, circle.id)
    }

    #[test]
    fn test_publish_and_list() {
        let (store, _alice, circle_id) = store_with_circle();
        store
            .publish_notification(&circle_id, "Dinner moved to 7pm")
            .unwrap();

        let all = store.all_notifications().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].message, "Dinner moved to 7pm");
        assert!(all[0].read_by.is_empty());
    }

    #[test]
    fn test_publish_to_unknown_circle_fails() {
        let (store, _alice, _circle_id) = store_with_circle();

        assert!(matches!(
            store.publish_notification("no-such-circle", "hello"),
            Err(KithError::CircleNotFound(_))
        ));
    }

    #[test]
    fn test_read_receipts_grow_only_and_idempotent() {
        let (store, alice, circle_id) = store_with_circle();
        let n = store.publish_notification(&circle_id, "hello").unwrap();

        assert!(store.mark_notification_read(&n.id, &alice).unwrap());
        assert!(!store.mark_notification_read(&n.id, &alice).unwrap());

        let all = store.all_notifications().unwrap();
        assert_eq!(all[0].read_by, vec![alice.clone()]);
    }

    #[test]
    fn test_mark_read_unknown_notification() {
        let (store, alice, _circle_id) = store_with_circle();

        assert!(matches!(
            store.mark_notification_read("missing", &alice),
            Err(KithError::NotificationNotFound(_))
        ));
    }

    #[test]
    fn test_mark_all_reports_partial_failure() {
        let (store, alice, circle_id) = store_with_circle();
        let n = store.publish_notification(&circle_id, "hello").unwrap();

        let outcome =
            store.mark_all_read(&[n.id.clone(), "missing".to_string()], &alice);

        assert_eq!(outcome.updated, vec![n.id]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "missing");
    }

    #[test]
    fn test_visibility_pipeline_over_store_data() {
        let (mut store, alice, circle_id) = store_with_circle();
        let bob = store.create_user("Bob", "bob@example.com").unwrap();
        let other = store.create_circle("Neighbors", &bob.id).unwrap();

        store.publish_notification(&circle_id, "visible").unwrap();
        store.publish_notification(&other.id, "hidden").unwrap();

        let joined = store.joined_circle_ids(&alice).unwrap();
        let visible = visible_notifications(&store.all_notifications().unwrap(), &joined);

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "visible");
        assert!(has_unread(&visible, &alice));

        store.mark_notification_read(&visible[0].id, &alice).unwrap();
        let visible = visible_notifications(&store.all_notifications().unwrap(), &joined);
        assert!(!has_unread(&visible, &alice));
    }
}
