//! User and session operations.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{KithError, KithResult};
use crate::store::{timestamp_to_column, Store};
use crate::user::{Session, UserProfile};

fn user_from_row(row: &Row) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get("id")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        home_location: row.get("home_location")?,
    })
}

impl Store {
    pub fn create_user(&self, full_name: &str, email: &str) -> KithResult<UserProfile> {
        let user = UserProfile {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: None,
            home_location: None,
        };

        self.conn.execute(
            "INSERT INTO users (id, full_name, email, phone, home_location)
             VALUES (?1, ?2, ?3, NULL, NULL)",
            params![user.id, user.full_name, user.email],
        )?;

        Ok(user)
    }

    pub fn user(&self, id: &str) -> KithResult<UserProfile> {
        self.conn
            .query_row("SELECT * FROM users WHERE id = ?1", params![id], user_from_row)
            .optional()?
            .ok_or_else(|| KithError::UserNotFound(id.to_string()))
    }

    pub fn user_by_email(&self, email: &str) -> KithResult<Option<UserProfile>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()?)
    }

    pub fn update_profile(&self, user: &UserProfile) -> KithResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET full_name = ?2, email = ?3, phone = ?4, home_location = ?5
             WHERE id = ?1",
            params![
                user.id,
                user.full_name,
                user.email,
                user.phone,
                user.home_location
            ],
        )?;

        if changed == 0 {
            return Err(KithError::UserNotFound(user.id.clone()));
        }
        Ok(())
    }

    /// Mint a bearer session for `user_id`.
    pub fn create_session(&self, user_id: &str) -> KithResult<Session> {
        // Ensure the user exists so a stale id fails here, not at resolve time
        let user = self.user(user_id)?;

        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: user.id,
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session.token,
                session.user_id,
                timestamp_to_column(&session.created_at)
            ],
        )?;

        Ok(session)
    }

    /// Resolve a bearer token to its user. Unknown tokens are an
    /// authentication failure, not a not-found.
    pub fn session_user(&self, token: &str) -> KithResult<UserProfile> {
        let user_id: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?;

        match user_id {
            Some(id) => self.user(&id),
            None => Err(KithError::NotAuthenticated),
        }
    }

    pub fn revoke_session(&self, token: &str) -> KithResult<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }
}
