use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::Row;

use crate::domain::user::{PublicUser, User};
use crate::infra::db::{self, Db};

/// Claims carried by a session token, decoded without a DB round trip.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    token_key: [u8; 32],
    token_ttl_hours: u64,
    reset_token_ttl_minutes: u64,
}

impl AuthService {
    pub fn new(
        db: Db,
        token_key: [u8; 32],
        token_ttl_hours: u64,
        reset_token_ttl_minutes: u64,
    ) -> Self {
        Self {
            db,
            token_key,
            token_ttl_hours,
            reset_token_ttl_minutes,
        }
    }

    /// Create an account with a zero starting balance and issue a session
    /// token. Returns None when the username or email is already taken
    /// (email compared case-insensitively).
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthSuccess>> {
        let email = email.to_lowercase();

        let existing = sqlx::query("SELECT id FROM users WHERE username = ? OR lower(email) = ?")
            .bind(username)
            .bind(&email)
            .fetch_optional(self.db.pool())
            .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let password_hash = hash_password(password)?;
        let created_at = db::now();

        let insert = sqlx::query(
            "INSERT INTO users (username, email, password_hash, balance_cents, created_at) \
             VALUES (?, ?, ?, 0, ?) \
             RETURNING id",
        )
        .bind(username)
        .bind(&email)
        .bind(&password_hash)
        .bind(created_at)
        .fetch_one(self.db.pool())
        .await;

        // Unique index backstop for the race between the pre-check and the
        // insert; maps to the same "identity taken" outcome.
        let row = match insert {
            Ok(row) => row,
            Err(sqlx::Error::Database(db_err)) if is_unique_violation(&*db_err) => {
                return Ok(None)
            }
            Err(err) => return Err(err.into()),
        };

        let user = User {
            id: row.get("id"),
            username: username.to_string(),
            email,
            password_hash,
            balance_cents: 0,
            created_at,
        };
        let token = self.issue_token(&user)?;

        Ok(Some(AuthSuccess {
            token,
            user: user.into(),
        }))
    }

    /// Returns None for unknown email and bad password alike; the handler
    /// turns both into one generic message.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<AuthSuccess>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, balance_cents, created_at \
             FROM users WHERE lower(email) = ?",
        )
        .bind(email.to_lowercase())
        .fetch_optional(self.db.pool())
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };
        let user = map_user(&row);

        if !verify_password(password, &user.password_hash)? {
            return Ok(None);
        }

        let token = self.issue_token(&user)?;
        Ok(Some(AuthSuccess {
            token,
            user: user.into(),
        }))
    }

    pub async fn current_user(&self, user_id: i64) -> Result<Option<PublicUser>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, balance_cents, created_at \
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| map_user(&row).into()))
    }

    /// Decrypt and validate a session token. Returns None on any malformed,
    /// expired, or foreign token.
    pub fn authenticate(&self, token: &str) -> Result<Option<AuthSession>> {
        let claims = match self.decrypt_claims(token)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        let user_id = claim_i64(&claims, "sub")?;
        let username = claim_str(&claims, "username")?;
        let email = claim_str(&claims, "email")?;
        Ok(Some(AuthSession {
            user_id,
            username,
            email,
        }))
    }

    pub fn issue_token(&self, user: &User) -> Result<String> {
        let duration = std::time::Duration::from_secs(self.token_ttl_hours * 60 * 60);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer("hirework")?;
        claims.audience("hirework")?;
        claims.subject(&user.id.to_string())?;
        claims.add_additional("username", user.username.as_str())?;
        claims.add_additional("email", user.email.as_str())?;

        let key = SymmetricKey::<V4>::from(&self.token_key)?;
        Ok(local::encrypt(&key, &claims, None, None)?)
    }

    /// Create a single-use password-reset token for the account with this
    /// email. Only the SHA-256 digest is stored; the raw token is returned
    /// for delivery and never persisted. Returns None when no account
    /// matches (the caller must not reveal that to the client).
    pub async fn create_reset_token(&self, email: &str) -> Result<Option<String>> {
        let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE lower(email) = ?")
            .bind(email.to_lowercase())
            .fetch_optional(self.db.pool())
            .await?;

        let user_id = match user_id {
            Some(id) => id,
            None => return Ok(None),
        };

        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        let token_hash = hash_token(&token);

        let now = db::now();
        let expires_at = now + time::Duration::minutes(self.reset_token_ttl_minutes as i64);

        // Rows that can no longer be redeemed are dead weight; drop them
        // before storing the new digest. `now()` is second-truncated, so the
        // stored RFC3339 TEXT compares correctly.
        sqlx::query(
            "DELETE FROM password_resets \
             WHERE user_id = ? AND (used_at IS NOT NULL OR expires_at <= ?)",
        )
        .bind(user_id)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        sqlx::query(
            "INSERT INTO password_resets (user_id, token_hash, expires_at, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(Some(token))
    }

    /// Consume a reset token and store the new credential. Returns false for
    /// unknown, expired, or already-used tokens.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<bool> {
        let token_hash = hash_token(token);
        let row = sqlx::query(
            "SELECT id, user_id, expires_at FROM password_resets \
             WHERE token_hash = ? AND used_at IS NULL",
        )
        .bind(&token_hash)
        .fetch_optional(self.db.pool())
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(false),
        };
        let reset_id: i64 = row.get("id");
        let user_id: i64 = row.get("user_id");
        let expires_at: time::OffsetDateTime = row.get("expires_at");

        let now = db::now();
        if expires_at <= now {
            return Ok(false);
        }

        let password_hash = hash_password(new_password)?;

        let mut tx = self.db.pool().begin().await?;
        let consumed = sqlx::query(
            "UPDATE password_resets SET used_at = ? WHERE id = ? AND used_at IS NULL",
        )
        .bind(now)
        .bind(reset_id)
        .execute(&mut *tx)
        .await?;
        if consumed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }

    fn decrypt_claims(&self, token: &str) -> Result<Option<Claims>> {
        let key = SymmetricKey::<V4>::from(&self.token_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with("hirework");
        rules.validate_audience_with("hirework");

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }
}

pub(crate) fn map_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        balance_cents: row.get("balance_cents"),
        created_at: row.get("created_at"),
    }
}

pub(crate) fn is_unique_violation(err: &dyn sqlx::error::DatabaseError) -> bool {
    matches!(err.code().as_deref(), Some("2067") | Some("1555"))
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

fn claim_i64(claims: &Claims, name: &str) -> Result<i64> {
    let value = claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing {} claim", name))?;
    Ok(value.parse()?)
}

fn claim_str(claims: &Claims, name: &str) -> Result<String> {
    let value = claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing {} claim", name))?;
    Ok(value.to_string())
}
