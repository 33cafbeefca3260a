use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::auth::AuthService;
use crate::app::catalog::CatalogService;
use crate::app::feed::{DeleteOutcome, FeedService};
use crate::app::hires::{HireOutcome, HireService};
use crate::app::ledger::LedgerService;
use crate::app::users::UserService;
use crate::domain::money;
use crate::domain::post::{CommentView, FeedPost};
use crate::domain::user::PublicUser;
use crate::domain::validate;
use crate::domain::worker::Worker;
use crate::http::{AdminToken, AppError, AuthUser, MaybeAuthUser};
use crate::AppState;

const MAX_PASSWORD_LEN: usize = 128;
const MAX_TITLE_LEN: usize = 200;
const MAX_CONTENT_LEN: usize = 1500;
const MAX_COMMENT_LEN: usize = 400;

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.db.clone(),
        state.token_key,
        state.token_ttl_hours,
        state.reset_token_ttl_minutes,
    )
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request(
            "Username, email, and password are required.",
        ));
    }
    let username_chars = username.chars().count();
    if username_chars < 2 || username_chars > 100 {
        return Err(AppError::bad_request(
            "Username must be between 2 and 100 characters.",
        ));
    }
    if !validate::is_valid_email(email) {
        return Err(AppError::bad_request("Please enter a valid email address."));
    }
    let password_chars = payload.password.chars().count();
    if password_chars < 6 {
        return Err(AppError::bad_request(
            "Password must be at least 6 characters.",
        ));
    }
    if password_chars > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "Password must be at most 128 characters.",
        ));
    }

    let service = auth_service(&state);
    let success = service
        .register(username, email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to register");
            AppError::internal("Server error. Please try again.")
        })?;

    match success {
        Some(success) => {
            state
                .mailer
                .send_welcome(&success.user.email, &success.user.username);
            Ok(Json(AuthResponse {
                token: success.token,
                user: success.user,
            }))
        }
        None => Err(AppError::conflict("Username or email already exists.")),
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required."));
    }
    if payload.password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "Password must be at most 128 characters.",
        ));
    }

    let service = auth_service(&state);
    let success = service
        .login(payload.email.trim(), &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("Server error. Please try again.")
        })?;

    match success {
        Some(success) => {
            state
                .mailer
                .send_login_notice(&success.user.email, &success.user.username);
            Ok(Json(AuthResponse {
                token: success.token,
                user: success.user,
            }))
        }
        // One message for unknown email and bad password alike.
        None => Err(AppError::unauthorized("Invalid email or password.")),
    }
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, AppError> {
    let service = auth_service(&state);
    let user = service.current_user(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch current user");
        AppError::internal("Server error. Please try again.")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("User not found.")),
    }
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = payload.email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::bad_request("Email is required."));
    }

    let service = auth_service(&state);
    let token = service.create_reset_token(&email).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to create reset token");
        AppError::internal("Server error. Please try again.")
    })?;

    if let Some(token) = token {
        state.mailer.send_password_reset(&email, &token);
    }

    // Same response whether or not the account exists.
    Ok(Json(MessageResponse {
        message: "If an account with that email exists, a password reset link has been sent."
            .to_string(),
    }))
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.token.trim().is_empty() {
        return Err(AppError::bad_request("Reset token is required."));
    }
    let password_chars = payload.new_password.chars().count();
    if password_chars < 6 {
        return Err(AppError::bad_request(
            "Password must be at least 6 characters.",
        ));
    }
    if password_chars > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "Password must be at most 128 characters.",
        ));
    }

    let service = auth_service(&state);
    let changed = service
        .reset_password(payload.token.trim(), &payload.new_password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to reset password");
            AppError::internal("Server error. Please try again.")
        })?;

    if !changed {
        return Err(AppError::bad_request("Invalid or expired reset token."));
    }

    Ok(Json(MessageResponse {
        message: "Password changed successfully!".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Balance ledger
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

pub async fn get_balance(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, AppError> {
    let service = LedgerService::new(state.db.clone());
    let balance = service.balance(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch balance");
        AppError::internal("Server error. Please try again.")
    })?;

    match balance {
        Some(cents) => Ok(Json(BalanceResponse {
            balance: money::cents_to_dollars(cents),
        })),
        None => Err(AppError::not_found("User not found.")),
    }
}

#[derive(Deserialize)]
pub struct AddFundsRequest {
    pub amount: f64,
}

#[derive(Serialize)]
pub struct AddFundsResponse {
    pub message: String,
    pub balance: f64,
}

pub async fn add_funds(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<AddFundsRequest>,
) -> Result<Json<AddFundsResponse>, AppError> {
    let amount_cents = match money::dollars_to_cents(payload.amount) {
        Some(cents) if cents > 0 => cents,
        _ => return Err(AppError::bad_request("Please enter a valid amount.")),
    };
    if amount_cents > state.max_deposit_cents {
        return Err(AppError::bad_request(format!(
            "Maximum deposit is {} at a time.",
            money::format_dollars(state.max_deposit_cents)
        )));
    }

    let service = LedgerService::new(state.db.clone());
    let balance = service
        .add_funds(auth.user_id, amount_cents)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to add funds");
            AppError::internal("Server error. Please try again.")
        })?;

    match balance {
        Some(balance_cents) => Ok(Json(AddFundsResponse {
            message: format!(
                "{} added to your account!",
                money::format_dollars(amount_cents)
            ),
            balance: money::cents_to_dollars(balance_cents),
        })),
        None => Err(AppError::not_found("User not found.")),
    }
}

// ---------------------------------------------------------------------------
// Worker catalog
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct WorkerListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// "All" and blank filter values mean "no filter".
fn normalize_filter(value: Option<String>) -> Option<String> {
    let value = value?.trim().to_string();
    if value.is_empty() || value == "All" {
        None
    } else {
        Some(value)
    }
}

pub async fn list_workers(
    Query(query): Query<WorkerListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Worker>>, AppError> {
    let category = normalize_filter(query.category);
    let search = normalize_filter(query.search);

    let service = CatalogService::new(state.db.clone());
    let workers = service
        .list(category.as_deref(), search.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list workers");
            AppError::internal("Server error. Please try again.")
        })?;

    Ok(Json(workers))
}

pub async fn worker_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let service = CatalogService::new(state.db.clone());
    let categories = service.categories().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list categories");
        AppError::internal("Server error. Please try again.")
    })?;

    Ok(Json(categories))
}

pub async fn get_worker(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Worker>, AppError> {
    let service = CatalogService::new(state.db.clone());
    let worker = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, worker_id = id, "failed to fetch worker");
        AppError::internal("Server error. Please try again.")
    })?;

    match worker {
        Some(worker) => Ok(Json(worker)),
        None => Err(AppError::not_found("Worker not found.")),
    }
}

// ---------------------------------------------------------------------------
// Hires
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateHireRequest {
    pub worker_id: i64,
}

#[derive(Serialize)]
pub struct CreateHireResponse {
    pub message: String,
    pub hire_id: i64,
    pub balance: f64,
}

pub async fn create_hire(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateHireRequest>,
) -> Result<Json<CreateHireResponse>, AppError> {
    let service = HireService::new(state.db.clone());
    let outcome = service
        .hire(auth.user_id, payload.worker_id)
        .await
        .map_err(|err| {
            tracing::error!(
                error = ?err,
                user_id = auth.user_id,
                worker_id = payload.worker_id,
                "failed to hire worker"
            );
            AppError::internal("Server error. Please try again.")
        })?;

    match outcome {
        HireOutcome::Hired {
            hire_id,
            worker_name,
            amount_cents,
            balance_cents,
        } => {
            state.mailer.send_hire_confirmation(
                &auth.email,
                &auth.username,
                &worker_name,
                amount_cents,
                balance_cents,
                hire_id,
            );
            Ok(Json(CreateHireResponse {
                message: format!(
                    "Successfully hired {}! {} deducted.",
                    worker_name,
                    money::format_dollars(amount_cents)
                ),
                hire_id,
                balance: money::cents_to_dollars(balance_cents),
            }))
        }
        HireOutcome::WorkerNotFound => Err(AppError::not_found("Worker not found.")),
        HireOutcome::AlreadyHired => {
            Err(AppError::conflict("You have already hired this worker."))
        }
        HireOutcome::InsufficientFunds {
            required_cents,
            available_cents,
        } => Err(AppError::bad_request(format!(
            "Insufficient funds. You need {} but have {}. Please add funds first.",
            money::format_dollars(required_cents),
            money::format_dollars(available_cents)
        ))),
        HireOutcome::UserNotFound => Err(AppError::not_found("User not found.")),
    }
}

pub async fn list_hires(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::domain::hire::HireWithWorker>>, AppError> {
    let service = HireService::new(state.db.clone());
    let hires = service.list_hires(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, "failed to list hires");
        AppError::internal("Server error. Please try again.")
    })?;

    Ok(Json(hires))
}

pub async fn end_hire(
    auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = HireService::new(state.db.clone());
    let ended = service.end_hire(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, hire_id = id, "failed to end hire");
        AppError::internal("Server error. Please try again.")
    })?;

    if !ended {
        return Err(AppError::not_found("Hire not found."));
    }

    Ok(Json(MessageResponse {
        message: "Hire ended successfully.".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Social feed
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct FeedQuery {
    pub category: Option<String>,
}

pub async fn list_feed(
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<FeedQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<FeedPost>>, AppError> {
    let category = normalize_filter(query.category);

    let service = FeedService::new(state.db.clone());
    let posts = service
        .list_feed(viewer.map(|v| v.user_id), category.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list feed");
            AppError::internal("Server error. Please try again.")
        })?;

    Ok(Json(posts))
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub image: Option<String>,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<FeedPost>, AppError> {
    let title = payload.title.trim();
    let content = payload.content.trim();

    if title.is_empty() || content.is_empty() {
        return Err(AppError::bad_request("Title and content are required."));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::bad_request("Title cannot exceed 200 characters."));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(AppError::bad_request(
            "Post content cannot exceed 1500 characters.",
        ));
    }

    let image = payload
        .image
        .as_deref()
        .map(str::trim)
        .filter(|image| !image.is_empty());
    if let Some(image) = image {
        validate::validate_image(image).map_err(AppError::bad_request)?;
    }

    let category = payload
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .unwrap_or("General");

    let service = FeedService::new(state.db.clone());
    let post = service
        .create_post(auth.user_id, title, content, category, image)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to create post");
            AppError::internal("Server error. Please try again.")
        })?;

    match post {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("User not found.")),
    }
}

pub async fn delete_post(
    auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = FeedService::new(state.db.clone());
    let outcome = service.delete_post(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, post_id = id, "failed to delete post");
        AppError::internal("Server error. Please try again.")
    })?;

    match outcome {
        DeleteOutcome::Deleted => Ok(Json(MessageResponse {
            message: "Post deleted.".to_string(),
        })),
        DeleteOutcome::NotFound => Err(AppError::not_found("Post not found.")),
        DeleteOutcome::NotOwner => Err(AppError::forbidden("Not authorized.")),
    }
}

#[derive(Serialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub likes_count: i64,
}

pub async fn toggle_like(
    auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ToggleLikeResponse>, AppError> {
    let service = FeedService::new(state.db.clone());
    let result = service.toggle_like(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, post_id = id, "failed to toggle like");
        AppError::internal("Server error. Please try again.")
    })?;

    match result {
        Some((liked, likes_count)) => Ok(Json(ToggleLikeResponse { liked, likes_count })),
        None => Err(AppError::not_found("Post not found.")),
    }
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

pub async fn add_comment(
    auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<Json<CommentView>, AppError> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("Comment text is required."));
    }
    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(
            "Comment cannot exceed 400 characters.",
        ));
    }

    let service = FeedService::new(state.db.clone());
    let comment = service
        .add_comment(id, auth.user_id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, post_id = id, "failed to add comment");
            AppError::internal("Server error. Please try again.")
        })?;

    match comment {
        Some(comment) => Ok(Json(comment)),
        None => Err(AppError::not_found("Post not found.")),
    }
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

pub async fn list_users(
    _admin: AdminToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let service = UserService::new(state.db.clone());
    let users = service.list_users().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list users");
        AppError::internal("Server error. Please try again.")
    })?;

    Ok(Json(users))
}

pub async fn get_user(
    _admin: AdminToken,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = id, "failed to fetch user");
        AppError::internal("Server error. Please try again.")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("User not found.")),
    }
}

pub async fn delete_user(
    _admin: AdminToken,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = UserService::new(state.db.clone());
    let deleted = service.delete_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = id, "failed to delete user");
        AppError::internal("Server error. Please try again.")
    })?;

    if !deleted {
        return Err(AppError::not_found("User not found."));
    }

    Ok(StatusCode::NO_CONTENT)
}
