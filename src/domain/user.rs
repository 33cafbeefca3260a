use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::money;

/// Full user row. The password hash never leaves the service layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub balance_cents: i64,
    pub created_at: OffsetDateTime,
}

/// Projection returned to clients: no credential, balance in dollars.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub balance: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            balance: money::cents_to_dollars(user.balance_cents),
            created_at: user.created_at,
        }
    }
}
