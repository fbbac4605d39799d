//! HTTP API handlers for CivicPulse.
//!
//! Thin translation layer: extract and default the query/body parameters,
//! call into the lifecycle / scoring / review engines or straight into
//! storage for plain listings, and let [`AppError`]'s `IntoResponse` impl
//! shape every failure. Handlers that require an authenticated official take
//! [`Claims`] as an extractor.
//!
//! Route map (`router`):
//!
//! - `POST  /api/complaints` - submit a complaint (public)
//! - `GET   /api/complaints` - filtered, paginated listing (auth)
//! - `GET   /api/complaints/public` - complaints open for review
//! - `POST  /api/complaints/sweep-delayed` - promote stale pending complaints
//! - `GET   /api/complaints/:id` - complaint by id
//! - `PATCH /api/complaints/:id/status` - status transition (auth)
//! - `POST  /api/officials/register` - create an official account
//! - `POST  /api/officials/login` - verify credentials, issue a token
//! - `GET   /api/officials` - active officials by score (auth)
//! - `GET   /api/officials/:id/dashboard` - dashboard view (auth)
//! - `PATCH /api/officials/:id/performance` - explicit recompute (auth)
//! - `POST  /api/reviews` - submit a citizen review
//! - `GET   /api/reviews/public` - all reviews, paginated
//! - `GET   /api/reviews/leaderboard` - top officials
//! - `GET   /api/reviews/official/:id` - reviews for an official (auth)
//! - `GET   /api/reviews/complaint/:id` - reviews for a complaint
//! - `GET   /api/health` - health check

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::auth::{self, Claims};
use crate::error::AppError;
use crate::lifecycle;
use crate::model::{
    Complaint, ComplaintPage, ComplaintStatus, IssueType, LoginRequest, LoginResponse, Official,
    OfficialReviewPage, RegisterRequest, Review, ReviewPage, SubmitComplaintRequest,
    SubmitReviewRequest, SweepResponse, UpdateStatusRequest,
};
use crate::review;
use crate::scoring;
use crate::storage::{ComplaintFilter, Storage};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub jwt_secret: String,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

fn default_public_reviews_limit() -> i64 {
    20
}

fn default_leaderboard_limit() -> i64 {
    scoring::DEFAULT_LEADERBOARD_LIMIT
}

fn default_threshold_hours() -> i64 {
    lifecycle::DELAYED_THRESHOLD_HOURS
}

/// Query parameters for GET /api/complaints.
#[derive(Debug, Deserialize)]
pub struct ComplaintListQuery {
    pub ward: Option<String>,
    pub status: Option<String>,
    pub issue_type: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Query parameters for paginated review listings.
#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Query parameters for GET /api/reviews/public.
#[derive(Debug, Deserialize)]
pub struct PublicReviewsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_public_reviews_limit")]
    pub limit: i64,
}

/// Query parameters for GET /api/reviews/leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default = "default_leaderboard_limit")]
    pub limit: i64,
}

/// Query parameters for POST /api/complaints/sweep-delayed.
#[derive(Debug, Deserialize)]
pub struct SweepQuery {
    #[serde(default = "default_threshold_hours")]
    pub threshold_hours: i64,
}

fn pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

// ============================================================================
// Complaints
// ============================================================================

/// POST /api/complaints - Submit a new complaint.
#[instrument(skip(state, request))]
pub async fn submit_complaint(
    State(state): State<AppState>,
    Json(request): Json<SubmitComplaintRequest>,
) -> Result<(StatusCode, Json<Complaint>), AppError> {
    let complaint = lifecycle::submit_complaint(&state.storage, request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

/// GET /api/complaints - Filtered, newest-first page of complaints.
///
/// Filters: `ward`, `status`, `issue_type`; pagination: `page` (default 1),
/// `limit` (default 10).
#[instrument(skip(state))]
pub async fn list_complaints(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ComplaintListQuery>,
) -> Result<Json<ComplaintPage>, AppError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            ComplaintStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown status '{raw}'")))?,
        ),
        None => None,
    };
    let issue_type = match query.issue_type.as_deref() {
        Some(raw) => Some(
            IssueType::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown issue type '{raw}'")))?,
        ),
        None => None,
    };
    let filter = ComplaintFilter {
        ward: query.ward.clone(),
        status,
        issue_type,
    };

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (complaints, total) = state.storage.list_complaints(&filter, page, limit).await?;

    info!(
        requested_by = claims.sub,
        total,
        page,
        "Complaints listed"
    );

    Ok(Json(ComplaintPage {
        complaints,
        total,
        total_pages: pages(total, limit),
        current_page: page,
    }))
}

/// GET /api/complaints/public - Complaints open for citizen review.
#[instrument(skip(state))]
pub async fn get_public_complaints(
    State(state): State<AppState>,
) -> Result<Json<Vec<Complaint>>, AppError> {
    let complaints = lifecycle::list_public(&state.storage).await?;
    Ok(Json(complaints))
}

/// GET /api/complaints/:id - Complaint by id.
#[instrument(skip(state))]
pub async fn get_complaint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Complaint>, AppError> {
    let complaint = state
        .storage
        .find_complaint(id)
        .await?
        .ok_or(AppError::NotFound("complaint"))?;
    Ok(Json(complaint))
}

/// PATCH /api/complaints/:id/status - Apply a status transition.
#[instrument(skip(state, request))]
pub async fn update_complaint_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Complaint>, AppError> {
    let complaint = lifecycle::update_status(&state.storage, id, &request.status, Utc::now()).await?;

    info!(
        complaint_id = id,
        status = %complaint.status,
        official = claims.sub,
        "Complaint status updated"
    );

    Ok(Json(complaint))
}

/// POST /api/complaints/sweep-delayed - Promote stale pending complaints to
/// delayed+public.
///
/// Intended for an external scheduler; safe to re-invoke since the sweep is
/// idempotent. `threshold_hours` defaults to 72.
#[instrument(skip(state))]
pub async fn sweep_delayed(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepResponse>, AppError> {
    let count =
        lifecycle::sweep_delayed(&state.storage, Utc::now(), query.threshold_hours).await?;
    Ok(Json(SweepResponse { count }))
}

// ============================================================================
// Officials
// ============================================================================

/// POST /api/officials/register - Create an official account.
#[instrument(skip(state, request))]
pub async fn register_official(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Official>), AppError> {
    let official = auth::register(&state.storage, request).await?;

    info!(
        official_id = official.id,
        ward = %official.ward,
        "Official registered"
    );

    Ok((StatusCode::CREATED, Json(official)))
}

/// POST /api/officials/login - Verify credentials and issue a token.
#[instrument(skip(state, request))]
pub async fn login_official(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, official) = auth::login(&state.storage, &state.jwt_secret, request).await?;

    info!(official_id = official.id, "Official logged in");

    Ok(Json(LoginResponse { token, official }))
}

/// GET /api/officials - Active officials, best score first.
#[instrument(skip(state))]
pub async fn list_officials(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Vec<Official>>, AppError> {
    let officials = state.storage.list_active_officials().await?;
    info!(requested_by = claims.sub, count = officials.len(), "Officials listed");
    Ok(Json(officials))
}

/// GET /api/officials/:id/dashboard - Dashboard view for one official.
#[instrument(skip(state))]
pub async fn get_official_dashboard(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
) -> Result<Json<crate::model::DashboardResponse>, AppError> {
    let dashboard = scoring::dashboard(&state.storage, id).await?;
    info!(official_id = id, requested_by = claims.sub, "Dashboard queried");
    Ok(Json(dashboard))
}

/// PATCH /api/officials/:id/performance - Recompute the derived metrics.
#[instrument(skip(state))]
pub async fn recompute_performance(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
) -> Result<Json<Official>, AppError> {
    let official = scoring::recompute(&state.storage, id).await?;

    info!(
        official_id = id,
        score = official.performance_score,
        requested_by = claims.sub,
        "Performance recomputed"
    );

    Ok(Json(official))
}

// ============================================================================
// Reviews
// ============================================================================

/// POST /api/reviews - Submit a citizen review for a public complaint.
#[instrument(skip(state, request))]
pub async fn submit_review(
    State(state): State<AppState>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = review::submit_review(&state.storage, request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/reviews/official/:id - Reviews for one official, newest first,
/// with their running average rating.
#[instrument(skip(state))]
pub async fn get_official_reviews(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<OfficialReviewPage>, AppError> {
    state
        .storage
        .find_official(id)
        .await?
        .ok_or(AppError::NotFound("official"))?;

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (reviews, total) = state.storage.list_reviews_for_official(id, page, limit).await?;
    let average_rating = scoring::average_rating(&state.storage, id).await?;

    info!(official_id = id, requested_by = claims.sub, total, "Official reviews listed");

    Ok(Json(OfficialReviewPage {
        reviews,
        total,
        total_pages: pages(total, limit),
        current_page: page,
        average_rating,
    }))
}

/// GET /api/reviews/complaint/:id - Reviews for one complaint, newest first.
#[instrument(skip(state))]
pub async fn get_complaint_reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.storage.list_reviews_for_complaint(id).await?;
    Ok(Json(reviews))
}

/// GET /api/reviews/public - All reviews, newest first, paginated.
#[instrument(skip(state))]
pub async fn get_public_reviews(
    State(state): State<AppState>,
    Query(query): Query<PublicReviewsQuery>,
) -> Result<Json<ReviewPage>, AppError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (reviews, total) = state.storage.list_reviews(page, limit).await?;

    Ok(Json(ReviewPage {
        reviews,
        total,
        total_pages: pages(total, limit),
        current_page: page,
    }))
}

/// GET /api/reviews/leaderboard - Top active officials by performance score.
#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<Official>>, AppError> {
    let limit = query.limit.clamp(1, 100);
    let officials = scoring::leaderboard(&state.storage, limit).await?;
    Ok(Json(officials))
}

/// GET /api/health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Build the application router. Shared between `main` and the integration
/// tests so both serve exactly the same surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/complaints", post(submit_complaint).get(list_complaints))
        .route("/api/complaints/public", get(get_public_complaints))
        .route("/api/complaints/sweep-delayed", post(sweep_delayed))
        .route("/api/complaints/:id", get(get_complaint))
        .route("/api/complaints/:id/status", patch(update_complaint_status))
        .route("/api/officials/register", post(register_official))
        .route("/api/officials/login", post(login_official))
        .route("/api/officials", get(list_officials))
        .route("/api/officials/:id/dashboard", get(get_official_dashboard))
        .route("/api/officials/:id/performance", patch(recompute_performance))
        .route("/api/reviews", post(submit_review))
        .route("/api/reviews/public", get(get_public_reviews))
        .route("/api/reviews/leaderboard", get(get_leaderboard))
        .route("/api/reviews/official/:id", get(get_official_reviews))
        .route("/api/reviews/complaint/:id", get(get_complaint_reviews))
        .route("/api/health", get(health_check))
        .with_state(state)
}
