use anyhow::Result;
use sqlx::Row;

use crate::domain::money;
use crate::domain::validate::escape_like_pattern;
use crate::domain::worker::Worker;
use crate::infra::db::{self, Db};

/// Default catalog loaded on first startup: (name, category, description,
/// hourly rate in cents, rating, location).
const SEED_WORKERS: &[(&str, &str, &str, i64, f64, &str)] = &[
    ("Sarah Chen", "Design", "UI/UX designer with 8 years of experience in web and mobile design.", 6500, 4.9, "San Francisco, CA"),
    ("Marcus Rivera", "Design", "Brand identity specialist and graphic designer.", 5500, 4.7, "New York, NY"),
    ("Aisha Patel", "Design", "Motion graphics and visual design expert.", 7000, 4.8, "Los Angeles, CA"),
    ("James O'Brien", "Design", "Interior designer specializing in commercial spaces.", 8000, 4.6, "Chicago, IL"),
    ("Mike Johnson", "Construction", "Licensed general contractor with 15 years experience.", 8500, 4.8, "Houston, TX"),
    ("Carlos Hernandez", "Construction", "Residential and commercial framing specialist.", 6000, 4.5, "Phoenix, AZ"),
    ("David Kim", "Construction", "Expert electrician, certified master electrician.", 7500, 4.9, "Seattle, WA"),
    ("Robert Taylor", "Construction", "Plumbing contractor with full licensing.", 7000, 4.7, "Denver, CO"),
    ("Emma Wilson", "Technology", "Full-stack developer specializing in React and Node.js.", 9500, 4.9, "Austin, TX"),
    ("Alex Nguyen", "Technology", "DevOps engineer and cloud infrastructure expert.", 10000, 4.8, "Portland, OR"),
    ("Priya Sharma", "Technology", "Mobile app developer for iOS and Android.", 9000, 4.7, "Boston, MA"),
    ("Tom Martinez", "Technology", "Cybersecurity analyst and penetration tester.", 11000, 4.9, "Washington, DC"),
    ("Lisa Brown", "Cleaning", "Professional house cleaner with eco-friendly products.", 3500, 4.8, "Miami, FL"),
    ("Grace Lee", "Cleaning", "Deep cleaning and move-in/move-out specialist.", 4000, 4.6, "Atlanta, GA"),
    ("Maria Santos", "Cleaning", "Commercial office cleaning services.", 3800, 4.7, "Dallas, TX"),
    ("Frank Miller", "Plumbing", "Emergency plumbing and pipe repair specialist.", 8000, 4.8, "Philadelphia, PA"),
    ("Hassan Ali", "Plumbing", "Bathroom and kitchen remodeling plumber.", 7500, 4.5, "Detroit, MI"),
    ("Ryan Cooper", "Electrical", "Residential wiring and panel upgrades.", 7000, 4.7, "Nashville, TN"),
    ("Steven Park", "Electrical", "Solar panel installation and electrical systems.", 8500, 4.9, "San Diego, CA"),
    ("Big T Moving Co.", "Moving", "Full-service local and long-distance moving.", 5000, 4.6, "Charlotte, NC"),
    ("Jake Williams", "Moving", "Furniture assembly and small moves specialist.", 4000, 4.5, "Orlando, FL"),
    ("Green Thumb Landscaping", "Landscaping", "Lawn care, garden design, and maintenance.", 4500, 4.7, "Sacramento, CA"),
    ("Pedro Gonzalez", "Landscaping", "Tree service and hardscape installation.", 5500, 4.8, "San Antonio, TX"),
];

#[derive(Clone)]
pub struct CatalogService {
    db: Db,
}

impl CatalogService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Exact category match AND'ed with a case-insensitive substring search
    /// across name, description, and category. Ordered by rating descending.
    pub async fn list(&self, category: Option<&str>, search: Option<&str>) -> Result<Vec<Worker>> {
        let pattern = search.map(|s| format!("%{}%", escape_like_pattern(s)));

        let rows = match (category, pattern.as_deref()) {
            (Some(category), Some(pattern)) => {
                sqlx::query(
                    "SELECT id, name, category, description, hourly_rate_cents, rating, \
                            location, avatar, created_at \
                     FROM workers \
                     WHERE category = ? \
                       AND (name LIKE ? ESCAPE '\\' \
                            OR description LIKE ? ESCAPE '\\' \
                            OR category LIKE ? ESCAPE '\\') \
                     ORDER BY rating DESC, id DESC",
                )
                .bind(category)
                .bind(pattern)
                .bind(pattern)
                .bind(pattern)
                .fetch_all(self.db.pool())
                .await?
            }
            (Some(category), None) => {
                sqlx::query(
                    "SELECT id, name, category, description, hourly_rate_cents, rating, \
                            location, avatar, created_at \
                     FROM workers \
                     WHERE category = ? \
                     ORDER BY rating DESC, id DESC",
                )
                .bind(category)
                .fetch_all(self.db.pool())
                .await?
            }
            (None, Some(pattern)) => {
                sqlx::query(
                    "SELECT id, name, category, description, hourly_rate_cents, rating, \
                            location, avatar, created_at \
                     FROM workers \
                     WHERE name LIKE ? ESCAPE '\\' \
                        OR description LIKE ? ESCAPE '\\' \
                        OR category LIKE ? ESCAPE '\\' \
                     ORDER BY rating DESC, id DESC",
                )
                .bind(pattern)
                .bind(pattern)
                .bind(pattern)
                .fetch_all(self.db.pool())
                .await?
            }
            (None, None) => {
                sqlx::query(
                    "SELECT id, name, category, description, hourly_rate_cents, rating, \
                            location, avatar, created_at \
                     FROM workers \
                     ORDER BY rating DESC, id DESC",
                )
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.iter().map(map_worker).collect())
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let categories =
            sqlx::query_scalar("SELECT DISTINCT category FROM workers ORDER BY category")
                .fetch_all(self.db.pool())
                .await?;
        Ok(categories)
    }

    pub async fn get(&self, worker_id: i64) -> Result<Option<Worker>> {
        let row = sqlx::query(
            "SELECT id, name, category, description, hourly_rate_cents, rating, \
                    location, avatar, created_at \
             FROM workers WHERE id = ?",
        )
        .bind(worker_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(map_worker))
    }

    /// Populate the catalog with the default workers when the table is
    /// empty. Returns the number of rows inserted.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workers")
            .fetch_one(self.db.pool())
            .await?;
        if count > 0 {
            return Ok(0);
        }

        let now = db::now();
        let mut tx = self.db.pool().begin().await?;
        for (name, category, description, rate_cents, rating, location) in SEED_WORKERS {
            sqlx::query(
                "INSERT INTO workers (name, category, description, hourly_rate_cents, \
                                      rating, location, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(name)
            .bind(category)
            .bind(description)
            .bind(rate_cents)
            .bind(rating)
            .bind(location)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(SEED_WORKERS.len())
    }
}

fn map_worker(row: &sqlx::sqlite::SqliteRow) -> Worker {
    let hourly_rate_cents: i64 = row.get("hourly_rate_cents");
    Worker {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        description: row.get("description"),
        hourly_rate_cents,
        hourly_rate: money::cents_to_dollars(hourly_rate_cents),
        rating: row.get("rating"),
        location: row.get("location"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
    }
}
