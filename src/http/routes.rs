use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::get_current_user))
        .route("/auth/balance", get(handlers::get_balance))
        .route("/auth/add-funds", post(handlers::add_funds))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/reset-password", post(handlers::reset_password))
}

pub fn workers() -> Router<AppState> {
    Router::new()
        .route("/workers", get(handlers::list_workers))
        .route("/workers/categories", get(handlers::worker_categories))
        .route("/workers/:id", get(handlers::get_worker))
}

pub fn hires() -> Router<AppState> {
    Router::new()
        .route("/hires", post(handlers::create_hire))
        .route("/hires", get(handlers::list_hires))
        .route("/hires/:id/end", patch(handlers::end_hire))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", get(handlers::list_feed))
        .route("/posts", post(handlers::create_post))
        .route("/posts/:id", delete(handlers::delete_post))
        .route("/posts/:id/like", patch(handlers::toggle_like))
        .route("/posts/:id/comments", post(handlers::add_comment))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/:id", get(handlers::get_user))
        .route("/users/:id", delete(handlers::delete_user))
}
