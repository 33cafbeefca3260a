use anyhow::Result;

use crate::app::auth::map_user;
use crate::domain::user::PublicUser;
use crate::infra::db::Db;

/// Admin-only user management.
#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>> {
        let rows = sqlx::query(
            "SELECT id, username, email, password_hash, balance_cents, created_at \
             FROM users ORDER BY id DESC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(|row| map_user(row).into()).collect())
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<PublicUser>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, balance_cents, created_at \
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_user(&row).into()))
    }

    /// Hard delete. Hires, posts, likes, comments, and reset tokens cascade
    /// through the schema's ON DELETE CASCADE constraints.
    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
