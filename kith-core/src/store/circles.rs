//! Circle, member and invite operations.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::circle::{Circle, CircleRef, Invite, InviteStatus, Member, MemberRole};
use crate::error::{KithError, KithResult};
use crate::membership;
use crate::store::{timestamp_from_column, timestamp_to_column, Store};

fn circle_from_row(row: &Row) -> rusqlite::Result<(String, String, String, String)> {
    Ok((
        row.get("id")?,
        row.get("name")?,
        row.get("owner_id")?,
        row.get("created_at")?,
    ))
}

fn into_circle(raw: (String, String, String, String)) -> KithResult<Circle> {
    let (id, name, owner_id, created_at) = raw;
    Ok(Circle {
        id,
        name,
        owner_id,
        created_at: timestamp_from_column(&created_at)?,
    })
}

fn member_from_row(row: &Row) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get("user_id")?, row.get("role")?, row.get("joined_at")?))
}

fn into_member(raw: (String, String, String)) -> KithResult<Member> {
    let (user_id, role, joined_at) = raw;
    Ok(Member {
        user_id,
        role: MemberRole::from_str(&role).map_err(KithError::Store)?,
        joined_at: timestamp_from_column(&joined_at)?,
    })
}

fn invite_from_row(row: &Row) -> rusqlite::Result<(String, String, String, String, String, String, String)> {
    Ok((
        row.get("id")?,
        row.get("circle_id")?,
        row.get("email")?,
        row.get("token")?,
        row.get("status")?,
        row.get("invited_by")?,
        row.get("sent_at")?,
    ))
}

fn into_invite(raw: (String, String, String, String, String, String, String)) -> KithResult<Invite> {
    let (id, circle_id, email, token, status, invited_by, sent_at) = raw;
    Ok(Invite {
        id,
        circle_id,
        email,
        token,
        status: InviteStatus::from_str(&status).map_err(KithError::Store)?,
        invited_by,
        sent_at: timestamp_from_column(&sent_at)?,
    })
}

impl Store {
    /// Create a circle and its owner's membership record in one
    /// transaction, so a circle never exists without its owner member.
    pub fn create_circle(&mut self, name: &str, owner_id: &str) -> KithResult<Circle> {
        let circle = Circle {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now(),
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO circles (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                circle.id,
                circle.name,
                circle.owner_id,
                timestamp_to_column(&circle.created_at)
            ],
        )?;
        tx.execute(
            "INSERT INTO members (circle_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                circle.id,
                circle.owner_id,
                MemberRole::Owner.as_str(),
                timestamp_to_column(&circle.created_at)
            ],
        )?;
        tx.commit()?;

        Ok(circle)
    }

    pub fn circle(&self, id: &str) -> KithResult<Circle> {
        let raw = self
            .conn
            .query_row(
                "SELECT * FROM circles WHERE id = ?1",
                params![id],
                circle_from_row,
            )
            .optional()?
            .ok_or_else(|| KithError::CircleNotFound(id.to_string()))?;
        into_circle(raw)
    }

    pub fn members(&self, circle_id: &str) -> KithResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM members WHERE circle_id = ?1 ORDER BY joined_at")?;
        let rows = stmt.query_map(params![circle_id], member_from_row)?;

        rows.map(|raw| into_member(raw?)).collect()
    }

    /// Every circle together with its member list. This is the input
    /// to membership resolution; a failure reading any circle's members
    /// fails the whole call rather than silently omitting the circle.
    pub fn circles_with_members(&self) -> KithResult<Vec<(Circle, Vec<Member>)>> {
        let mut stmt = self.conn.prepare("SELECT * FROM circles ORDER BY created_at")?;
        let raw_circles: Vec<_> = stmt
            .query_map([], circle_from_row)?
            .collect::<rusqlite::Result<_>>()?;

        let mut out = Vec::with_capacity(raw_circles.len());
        for raw in raw_circles {
            let circle = into_circle(raw)?;
            let members = self.members(&circle.id)?;
            out.push((circle, members));
        }
        Ok(out)
    }

    /// The circles `user_id` owns or belongs to.
    pub fn joined_circles(&self, user_id: &str) -> KithResult<Vec<CircleRef>> {
        Ok(membership::joined_circles(
            user_id,
            &self.circles_with_members()?,
        ))
    }

    /// The joined circle ids as a set, for visibility filtering.
    pub fn joined_circle_ids(&self, user_id: &str) -> KithResult<HashSet<String>> {
        Ok(membership::joined_circle_ids(
            user_id,
            &self.circles_with_members()?,
        ))
    }

    pub fn add_member(&self, circle_id: &str, user_id: &str, role: MemberRole) -> KithResult<()> {
        // Verify the circle exists for a clean not-found
        self.circle(circle_id)?;

        self.conn.execute(
            "INSERT OR IGNORE INTO members (circle_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                circle_id,
                user_id,
                role.as_str(),
                timestamp_to_column(&Utc::now())
            ],
        )?;
        Ok(())
    }

    /// Remove a member. The owner can never be removed.
    pub fn remove_member(&self, circle_id: &str, user_id: &str) -> KithResult<()> {
        let circle = self.circle(circle_id)?;
        if circle.owner_id == user_id {
            return Err(KithError::OwnerRemoval);
        }

        self.conn.execute(
            "DELETE FROM members WHERE circle_id = ?1 AND user_id = ?2",
            params![circle_id, user_id],
        )?;
        Ok(())
    }

    /// Delete a circle and everything scoped to it.
    pub fn delete_circle(&mut self, circle_id: &str) -> KithResult<()> {
        self.circle(circle_id)?;

        let tx = self.conn.transaction()?;
        // Circle-owned events are not FK-linked (owner is polymorphic)
        tx.execute(
            "DELETE FROM events WHERE owner_kind = 'circle' AND owner_id = ?1",
            params![circle_id],
        )?;
        tx.execute("DELETE FROM circles WHERE id = ?1", params![circle_id])?;
        tx.commit()?;

        Ok(())
    }

    /// Create a pending invite with a fresh single-use token.
    pub fn create_invite(
        &self,
        circle_id: &str,
        email: &str,
        invited_by: &str,
    ) -> KithResult<Invite> {
        self.circle(circle_id)?;

        let invite = Invite {
            id: Uuid::new_v4().to_string(),
            circle_id: circle_id.to_string(),
            email: email.to_string(),
            token: Uuid::new_v4().to_string(),
            status: InviteStatus::Pending,
            invited_by: invited_by.to_string(),
            sent_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO invites (id, circle_id, email, token, status, invited_by, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                invite.id,
                invite.circle_id,
                invite.email,
                invite.token,
                invite.status.as_str(),
                invite.invited_by,
                timestamp_to_column(&invite.sent_at)
            ],
        )?;

        Ok(invite)
    }

    pub fn invites(&self, circle_id: &str) -> KithResult<Vec<Invite>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM invites WHERE circle_id = ?1 ORDER BY sent_at")?;
        let rows = stmt.query_map(params![circle_id], invite_from_row)?;

        rows.map(|raw| into_invite(raw?)).collect()
    }

    /// Revoke a pending invite. Revoked invites stay on record; their
    /// token can no longer be accepted.
    pub fn revoke_invite(&self, circle_id: &str, invite_id: &str) -> KithResult<()> {
        let changed = self.conn.execute(
            "UPDATE invites SET status = 'revoked'
             WHERE id = ?1 AND circle_id = ?2 AND status = 'pending'",
            params![invite_id, circle_id],
        )?;

        if changed == 0 {
            return Err(KithError::InvalidInvite);
        }
        Ok(())
    }

    /// Consume an invite token: add `user_id` as an editor and mark the
    /// invite accepted, atomically. A token only works once.
    pub fn accept_invite(&mut self, token: &str, user_id: &str) -> KithResult<CircleRef> {
        let tx = self.conn.transaction()?;

        let found: Option<(String, String)> = tx
            .query_row(
                "SELECT id, circle_id FROM invites WHERE token = ?1 AND status = 'pending'",
                params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((invite_id, circle_id)) = found else {
            return Err(KithError::InvalidInvite);
        };

        // INSERT OR IGNORE keeps an existing role (e.g. owner) intact
        tx.execute(
            "INSERT OR IGNORE INTO members (circle_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                circle_id,
                user_id,
                MemberRole::Editor.as_str(),
                timestamp_to_column(&Utc::now())
            ],
        )?;
        tx.execute(
            "UPDATE invites SET status = 'accepted' WHERE id = ?1",
            params![invite_id],
        )?;

        let raw = tx.query_row(
            "SELECT * FROM circles WHERE id = ?1",
            params![circle_id],
            circle_from_row,
        )?;
        tx.commit()?;

        let circle = into_circle(raw)?;
        Ok(CircleRef::from(&circle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_user(email: &str) -> (Store, String) {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("Test User", email).unwrap();
        (store, user.id)
    }

    #[test]
    fn test_create_circle_adds_owner_member() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();

        let members = store.members(&circle.id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, alice);
        assert_eq!(members[0].role, MemberRole::Owner);
    }

    #[test]
    fn test_owner_without_member_record_still_joined() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();

        // Simulate a circle document whose owner member record is missing
        store
            .conn
            .execute("DELETE FROM members WHERE circle_id = ?1", params![circle.id])
            .unwrap();

        let joined = store.joined_circles(&alice).unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].id, circle.id);
    }

    #[test]
    fn test_non_member_sees_no_circles() {
        let (mut store, alice) = store_with_user("alice@example.com");
        store.create_circle("Family", &alice).unwrap();
        let bob = store.create_user("Bob", "bob@example.com").unwrap();

        assert!(store.joined_circles(&bob.id).unwrap().is_empty());
    }

    #[test]
    fn test_invite_accept_joins_as_editor() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();
        let bob = store.create_user("Bob", "bob@example.com").unwrap();

        let invite = store
            .create_invite(&circle.id, "bob@example.com", &alice)
            .unwrap();
        let joined = store.accept_invite(&invite.token, &bob.id).unwrap();
        assert_eq!(joined.id, circle.id);

        let members = store.members(&circle.id).unwrap();
        let bob_member = members.iter().find(|m| m.user_id == bob.id).unwrap();
        assert_eq!(bob_member.role, MemberRole::Editor);

        let invites = store.invites(&circle.id).unwrap();
        assert_eq!(invites[0].status, InviteStatus::Accepted);
    }

    #[test]
    fn test_invite_token_is_single_use() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();
        let bob = store.create_user("Bob", "bob@example.com").unwrap();
        let carol = store.create_user("Carol", "carol@example.com").unwrap();

        let invite = store
            .create_invite(&circle.id, "bob@example.com", &alice)
            .unwrap();
        store.accept_invite(&invite.token, &bob.id).unwrap();

        assert!(matches!(
            store.accept_invite(&invite.token, &carol.id),
            Err(KithError::InvalidInvite)
        ));
    }

    #[test]
    fn test_revoked_invite_cannot_be_accepted() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();
        let bob = store.create_user("Bob", "bob@example.com").unwrap();

        let invite = store
            .create_invite(&circle.id, "bob@example.com", &alice)
            .unwrap();
        store.revoke_invite(&circle.id, &invite.id).unwrap();

        assert!(matches!(
            store.accept_invite(&invite.token, &bob.id),
            Err(KithError::InvalidInvite)
        ));
        // Revoking twice is also invalid
        assert!(store.revoke_invite(&circle.id, &invite.id).is_err());
    }

    #[test]
    fn test_unknown_token_rejected() {
        let (mut store, _alice) = store_with_user("alice@example.com");

        assert!(matches!(
            store.accept_invite("no-such-token", "someone"),
            Err(KithError::InvalidInvite)
        ));
    }

    #[test]
    fn test_owner_cannot_be_removed() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();

        assert!(matches!(
            store.remove_member(&circle.id, &alice),
            Err(KithError::OwnerRemoval)
        ));
    }

    #[test]
    fn test_remove_member() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();
        let bob = store.create_user("Bob", "bob@example.com").unwrap();
        store
            .add_member(&circle.id, &bob.id, MemberRole::Viewer)
            .unwrap();

        store.remove_member(&circle.id, &bob.id).unwrap();
        assert!(store.joined_circles(&bob.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_circle_cascades() {
        let (mut store, alice) = store_with_user("alice@example.com");
        let circle = store.create_circle("Family", &alice).unwrap();
        store
            .create_invite(&circle.id, "bob@example.com", &alice)
            .unwrap();

        store.delete_circle(&circle.id).unwrap();

        assert!(matches!(
            store.circle(&circle.id),
            Err(KithError::CircleNotFound(_))
        ));
        assert!(store.members(&circle.id).unwrap().is_empty());
        assert!(store.invites(&circle.id).unwrap().is_empty());
    }
}
