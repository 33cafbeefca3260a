use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::AppState;

// Post images arrive inline as base64 data URIs, so request bodies can be
// several megabytes.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::{AdminToken, AuthUser, MaybeAuthUser};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::workers())
        .merge(routes::hires())
        .merge(routes::posts())
        .merge(routes::users())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
