//! Circle notifications and per-user read state.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub circle_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Ids of users who have acknowledged this notification. Grow-only.
    #[serde(default)]
    pub read_by: Vec<String>,
}

impl Notification {
    pub fn is_read_by(&self, user_id: &str) -> bool {
        self.read_by.iter().any(|id| id == user_id)
    }

    /// Record that `user_id` has read this notification. Idempotent:
    /// returns false when the user was already in the read set.
    pub fn mark_read(&mut self, user_id: &str) -> bool {
        if self.is_read_by(user_id) {
            return false;
        }
        self.read_by.push(user_id.to_string());
        true
    }
}

/// Filter to notifications in joined circles, newest first.
pub fn visible_notifications(
    all: &[Notification],
    joined_circle_ids: &HashSet<String>,
) -> Vec<Notification> {
    let mut visible: Vec<Notification> = all
        .iter()
        .filter(|n| joined_circle_ids.contains(&n.circle_id))
        .cloned()
        .collect();

    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}

/// True when at least one of `visible` is unread for `user_id`.
pub fn has_unread(visible: &[Notification], user_id: &str) -> bool {
    visible.iter().any(|n| !n.is_read_by(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn notification(id: &str, circle_id: &str, minute: u32) -> Notification {
        Notification {
            id: id.into(),
            circle_id: circle_id.into(),
            message: format!("Message {}", id),
            created_at: Utc.with_ymd_and_hms(2024, 3, 4, 12, minute, 0).unwrap(),
            read_by: vec![],
        }
    }

    #[test]
    fn test_notifications_outside_joined_circles_are_hidden() {
        let all = vec![notification("n1", "c1", 0), notification("n2", "c2", 1)];
        let joined = HashSet::from(["c1".to_string()]);

        let visible = visible_notifications(&all, &joined);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "n1");
    }

    #[test]
    fn test_hidden_even_when_user_is_in_read_by() {
        let mut foreign = notification("n1", "c2", 0);
        foreign.read_by = vec!["alice".into()];
        let joined = HashSet::from(["c1".to_string()]);

        assert!(visible_notifications(&[foreign], &joined).is_empty());
    }

    #[test]
    fn test_sorted_newest_first() {
        let all = vec![
            notification("older", "c1", 0),
            notification("newest", "c1", 30),
            notification("middle", "c1", 15),
        ];
        let joined = HashSet::from(["c1".to_string()]);

        let ids: Vec<String> = visible_notifications(&all, &joined)
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["newest", "middle", "older"]);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut n = notification("n1", "c1", 0);

        assert!(n.mark_read("alice"));
        assert!(!n.mark_read("alice"));
        assert_eq!(
            n.read_by.iter().filter(|id| *id == "alice").count(),
            1,
            "alice must appear exactly once"
        );
    }

    #[test]
    fn test_unread_badge() {
        let mut read = notification("n1", "c1", 0);
        read.mark_read("alice");
        let unread = notification("n2", "c1", 1);

        assert!(has_unread(&[read.clone(), unread], "alice"));
        assert!(!has_unread(&[read], "alice"));
        assert!(!has_unread(&[], "alice"));
    }
}
