use anyhow::Result;

use crate::infra::db::Db;

/// Balance ledger. Every mutation is a single atomic UPDATE relative to the
/// stored value; the schema-level CHECK rejects negative balances.
#[derive(Clone)]
pub struct LedgerService {
    db: Db,
}

impl LedgerService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Current balance in cents, or None if the user does not exist.
    pub async fn balance(&self, user_id: i64) -> Result<Option<i64>> {
        let balance = sqlx::query_scalar("SELECT balance_cents FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(balance)
    }

    /// Credit the user's balance and return the new total in cents, or None
    /// if the user does not exist. The amount must already be validated as
    /// positive and within the deposit cap by the caller.
    pub async fn add_funds(&self, user_id: i64, amount_cents: i64) -> Result<Option<i64>> {
        let balance = sqlx::query_scalar(
            "UPDATE users SET balance_cents = balance_cents + ? \
             WHERE id = ? \
             RETURNING balance_cents",
        )
        .bind(amount_cents)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(balance)
    }
}
