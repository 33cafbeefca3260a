use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HireStatus {
    Active,
    Completed,
}

impl HireStatus {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// A user's hire joined with the worker's display fields. `amount` is the
/// price snapshot captured when the hire was created, not the worker's
/// current rate.
#[derive(Debug, Clone, Serialize)]
pub struct HireWithWorker {
    pub id: i64,
    pub status: HireStatus,
    pub amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub worker_id: i64,
    pub worker_name: String,
    pub category: String,
    pub hourly_rate: f64,
    pub rating: f64,
    pub location: String,
}
