//! Circle membership resolution.
//!
//! A user is joined to a circle when they own it or a member record
//! keyed by their id exists. Resolution is a pure function over circles
//! and their loaded member lists; assembling those inputs (and failing
//! loudly when a member list cannot be read) is the store's job.

use std::collections::HashSet;

use crate::circle::{Circle, CircleRef, Member};

/// Whether `user_id` owns or is a member of `circle`.
pub fn is_joined(user_id: &str, circle: &Circle, members: &[Member]) -> bool {
    circle.owner_id == user_id || members.iter().any(|m| m.user_id == user_id)
}

/// Resolve the circles `user_id` owns or belongs to.
///
/// Returns at most one entry per circle, in input order.
pub fn joined_circles(user_id: &str, circles: &[(Circle, Vec<Member>)]) -> Vec<CircleRef> {
    let mut joined: Vec<CircleRef> = Vec::new();

    for (circle, members) in circles {
        if joined.iter().any(|c| c.id == circle.id) {
            continue;
        }
        if is_joined(user_id, circle, members) {
            joined.push(CircleRef::from(circle));
        }
    }

    joined
}

/// The joined circle ids as a set, for visibility filtering.
pub fn joined_circle_ids(user_id: &str, circles: &[(Circle, Vec<Member>)]) -> HashSet<String> {
    joined_circles(user_id, circles)
        .into_iter()
        .map(|c| c.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circle::MemberRole;
    use chrono::Utc;

    fn circle(id: &str, owner_id: &str) -> Circle {
        Circle {
            id: id.into(),
            name: format!("Circle {}", id),
            owner_id: owner_id.into(),
            created_at: Utc::now(),
        }
    }

    fn member(user_id: &str) -> Member {
        Member {
            user_id: user_id.into(),
            role: MemberRole::Editor,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_without_member_record_is_joined() {
        let circles = vec![(circle("c1", "alice"), vec![])];

        let joined = joined_circles("alice", &circles);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].id, "c1");
    }

    #[test]
    fn test_member_record_grants_membership() {
        let circles = vec![(circle("c1", "alice"), vec![member("bob")])];

        assert_eq!(joined_circles("bob", &circles).len(), 1);
    }

    #[test]
    fn test_neither_owner_nor_member_is_excluded() {
        let circles = vec![(circle("c1", "alice"), vec![member("bob")])];

        assert!(joined_circles("carol", &circles).is_empty());
    }

    #[test]
    fn test_owner_who_is_also_member_listed_once() {
        let circles = vec![(circle("c1", "alice"), vec![member("alice")])];

        assert_eq!(joined_circles("alice", &circles).len(), 1);
    }

    #[test]
    fn test_duplicate_circle_rows_resolve_once() {
        let circles = vec![
            (circle("c1", "alice"), vec![]),
            (circle("c1", "alice"), vec![]),
        ];

        assert_eq!(joined_circles("alice", &circles).len(), 1);
    }

    #[test]
    fn test_joined_ids_set() {
        let circles = vec![
            (circle("c1", "alice"), vec![member("bob")]),
            (circle("c2", "carol"), vec![]),
        ];

        let ids = joined_circle_ids("bob", &circles);
        assert!(ids.contains("c1"));
        assert!(!ids.contains("c2"));
    }
}
