use anyhow::Result;
use sqlx::Row;

use crate::app::auth::is_unique_violation;
use crate::domain::hire::{HireStatus, HireWithWorker};
use crate::domain::money;
use crate::infra::db::{self, Db};

/// Result of a hire attempt. Business failures are values, not errors; only
/// infrastructure trouble surfaces as Err.
#[derive(Debug)]
pub enum HireOutcome {
    Hired {
        hire_id: i64,
        worker_name: String,
        amount_cents: i64,
        balance_cents: i64,
    },
    WorkerNotFound,
    AlreadyHired,
    InsufficientFunds {
        required_cents: i64,
        available_cents: i64,
    },
    UserNotFound,
}

#[derive(Clone)]
pub struct HireService {
    db: Db,
}

impl HireService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Check-deduct-insert runs in one transaction. The deduction is a
    /// conditional UPDATE (`balance_cents >= rate`), so two concurrent hires
    /// can never overdraw; the partial unique index on active (user, worker)
    /// pairs is the backstop for concurrent duplicate hires.
    pub async fn hire(&self, user_id: i64, worker_id: i64) -> Result<HireOutcome> {
        let mut tx = self.db.pool().begin().await?;

        let worker = sqlx::query(
            "SELECT name, hourly_rate_cents FROM workers WHERE id = ?",
        )
        .bind(worker_id)
        .fetch_optional(&mut *tx)
        .await?;
        let worker = match worker {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                return Ok(HireOutcome::WorkerNotFound);
            }
        };
        let worker_name: String = worker.get("name");
        let rate_cents: i64 = worker.get("hourly_rate_cents");

        let active: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM hires WHERE user_id = ? AND worker_id = ? AND status = 'active'",
        )
        .bind(user_id)
        .bind(worker_id)
        .fetch_optional(&mut *tx)
        .await?;
        if active.is_some() {
            tx.rollback().await?;
            return Ok(HireOutcome::AlreadyHired);
        }

        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET balance_cents = balance_cents - ? \
             WHERE id = ? AND balance_cents >= ? \
             RETURNING balance_cents",
        )
        .bind(rate_cents)
        .bind(user_id)
        .bind(rate_cents)
        .fetch_optional(&mut *tx)
        .await?;

        let balance_cents = match balance {
            Some(balance) => balance,
            None => {
                // Zero rows: either the user is gone or the funds are short.
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT balance_cents FROM users WHERE id = ?")
                        .bind(user_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                tx.rollback().await?;
                return Ok(match available {
                    Some(available_cents) => HireOutcome::InsufficientFunds {
                        required_cents: rate_cents,
                        available_cents,
                    },
                    None => HireOutcome::UserNotFound,
                });
            }
        };

        // amount_cents snapshots the rate at this instant; later catalog
        // price changes must not affect this hire.
        let insert = sqlx::query(
            "INSERT INTO hires (user_id, worker_id, status, amount_cents, created_at) \
             VALUES (?, ?, 'active', ?, ?) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(worker_id)
        .bind(rate_cents)
        .bind(db::now())
        .fetch_one(&mut *tx)
        .await;

        let hire_id: i64 = match insert {
            Ok(row) => row.get("id"),
            Err(sqlx::Error::Database(db_err)) if is_unique_violation(&*db_err) => {
                tx.rollback().await?;
                return Ok(HireOutcome::AlreadyHired);
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;

        Ok(HireOutcome::Hired {
            hire_id,
            worker_name,
            amount_cents: rate_cents,
            balance_cents,
        })
    }

    /// Transition a hire to completed. Returns false when the hire does not
    /// exist or belongs to another user. Ending an already-completed hire is
    /// an accepted no-op: the row stays in its terminal state.
    pub async fn end_hire(&self, user_id: i64, hire_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE hires SET status = 'completed' WHERE id = ? AND user_id = ?",
        )
        .bind(hire_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All of the caller's hires joined with worker display fields,
    /// newest-first.
    pub async fn list_hires(&self, user_id: i64) -> Result<Vec<HireWithWorker>> {
        let rows = sqlx::query(
            "SELECT h.id, h.status, h.amount_cents, h.created_at, \
                    w.id AS worker_id, w.name AS worker_name, w.category, \
                    w.hourly_rate_cents, w.rating, w.location \
             FROM hires h \
             JOIN workers w ON w.id = h.worker_id \
             WHERE h.user_id = ? \
             ORDER BY h.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut hires = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.get("status");
            let status = HireStatus::from_db(&status)
                .ok_or_else(|| anyhow::anyhow!("unknown hire status: {}", status))?;
            hires.push(HireWithWorker {
                id: row.get("id"),
                status,
                amount: money::cents_to_dollars(row.get("amount_cents")),
                created_at: row.get("created_at"),
                worker_id: row.get("worker_id"),
                worker_name: row.get("worker_name"),
                category: row.get("category"),
                hourly_rate: money::cents_to_dollars(row.get("hourly_rate_cents")),
                rating: row.get("rating"),
                location: row.get("location"),
            });
        }

        Ok(hires)
    }
}
