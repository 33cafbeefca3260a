use serde::Serialize;
use time::OffsetDateTime;

/// Catalog entry. Read-only to end users; mutated only by seeding.
#[derive(Debug, Clone, Serialize)]
pub struct Worker {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing)]
    pub hourly_rate_cents: i64,
    /// Hourly rate in dollars, derived from `hourly_rate_cents` at load time.
    pub hourly_rate: f64,
    pub rating: f64,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
