//! Family member roster operations.

use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{KithError, KithResult};
use crate::family::FamilyMember;
use crate::store::Store;

fn family_member_from_row(row: &Row) -> rusqlite::Result<FamilyMember> {
    Ok(FamilyMember {
        id: row.get("id")?,
        circle_id: row.get("circle_id")?,
        name: row.get("name")?,
        age: row.get("age")?,
        relationship: row.get("relationship")?,
        photo_url: row.get("photo_url")?,
    })
}

impl Store {
    pub fn add_family_member(
        &self,
        circle_id: &str,
        name: &str,
        age: Option<u32>,
        relationship: &str,
    ) -> KithResult<FamilyMember> {
        self.circle(circle_id)?;

        let member = FamilyMember {
            id: Uuid::new_v4().to_string(),
            circle_id: circle_id.to_string(),
            name: name.to_string(),
            age,
            relationship: relationship.to_string(),
            photo_url: None,
        };

        self.conn.execute(
            "INSERT INTO family_members (id, circle_id, name, age, relationship, photo_url)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
            params![
                member.id,
                member.circle_id,
                member.name,
                member.age,
                member.relationship
            ],
        )?;

        Ok(member)
    }

    pub fn family_member(&self, id: &str) -> KithResult<FamilyMember> {
        self.conn
            .query_row(
                "SELECT * FROM family_members WHERE id = ?1",
                params![id],
                family_member_from_row,
            )
            .optional()?
            .ok_or_else(|| KithError::FamilyMemberNotFound(id.to_string()))
    }

    pub fn family_members(&self, circle_id: &str) -> KithResult<Vec<FamilyMember>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM family_members WHERE circle_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![circle_id], family_member_from_row)?;

        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Overwrite a roster entry, including the photo URL produced by
    /// the external file store.
    pub fn update_family_member(&self, member: &FamilyMember) -> KithResult<()> {
        let changed = self.conn.execute(
            "UPDATE family_members SET name = ?2, age = ?3, relationship = ?4, photo_url = ?5
             WHERE id = ?1",
            params![
                member.id,
                member.name,
                member.age,
                member.relationship,
                member.photo_url
            ],
        )?;

        if changed == 0 {
            return Err(KithError::FamilyMemberNotFound(member.id.clone()));
        }
        Ok(())
    }

    pub fn delete_family_member(&self, id: &str) -> KithResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM family_members WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(KithError::FamilyMemberNotFound(id.to_string()));
        }
        Ok(())
    }
}
