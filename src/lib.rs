pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::app::mailer::Mailer;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub mailer: Mailer,
    pub token_key: [u8; 32],
    pub token_ttl_hours: u64,
    pub reset_token_ttl_minutes: u64,
    pub max_deposit_cents: i64,
    pub admin_token: Option<String>,
}
