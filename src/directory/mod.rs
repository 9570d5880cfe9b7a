//! Partner directory — user records and the partner link.
//!
//! The fan-out pipeline consumes `partner_id` read-only. The link is written
//! through the thin `link`/`unlink` surface and assumed symmetric; no reverse
//! link validation happens on the read path.

pub mod handlers;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub partner_id: Option<String>,
    pub created_at: i64,
}

pub struct Directory {
    pool: SqlitePool,
}

impl Directory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, name: &str) -> Result<User, PipelineError> {
        if name.trim().is_empty() {
            return Err(PipelineError::validation("user name must not be empty"));
        }
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO users (id, name) VALUES (?, ?)")
            .bind(&id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        self.get_user(&id).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, PipelineError> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PipelineError::UserNotFound(id.to_string()))
    }

    /// Resolve the linked partner's id. Absence of a link is a valid result,
    /// not a failure.
    pub async fn get_partner_id(&self, user_id: &str) -> Result<Option<String>, PipelineError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT partner_id FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((partner,)) => Ok(partner),
            None => Err(PipelineError::UserNotFound(user_id.to_string())),
        }
    }

    /// Link two users symmetrically. Both sides are written in one
    /// transaction; an existing link on either side is replaced.
    pub async fn link_partners(&self, a: &str, b: &str) -> Result<(), PipelineError> {
        if a == b {
            return Err(PipelineError::validation("cannot link a user to themselves"));
        }
        // Surface the missing-user error before any write.
        self.get_user(a).await?;
        self.get_user(b).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE users SET partner_id = ? WHERE id = ?")
            .bind(b)
            .bind(a)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET partner_id = ? WHERE id = ?")
            .bind(a)
            .bind(b)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Clear the link on both sides. Unlinking an unlinked user is a no-op.
    pub async fn unlink_partners(&self, user_id: &str) -> Result<(), PipelineError> {
        let partner = self.get_partner_id(user_id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE users SET partner_id = NULL WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if let Some(partner_id) = partner {
            sqlx::query("UPDATE users SET partner_id = NULL WHERE id = ? AND partner_id = ?")
                .bind(&partner_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
