//! Review admission gate.
//!
//! Decides who may review a complaint and when, then hands accepted reviews
//! to storage and triggers a scoring recompute for the rated official.
//!
//! Admission checks run in a fixed order: the complaint must exist, be
//! public, and have an assigned official; the citizen must not have reviewed
//! it before; the rating must be in range. The duplicate pre-check is only
//! an optimization: two racing submissions are settled by the store's
//! UNIQUE constraint on (complaint, citizen).

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::AppError;
use crate::model::{Complaint, NewReview, Review, SubmitReviewRequest};
use crate::scoring;
use crate::storage::Storage;

/// Upper bound on review comment length.
pub const MAX_COMMENT_LEN: usize = 500;

fn response_time_hours(complaint: &Complaint, now: DateTime<Utc>) -> f64 {
    let end = complaint.resolved_at.unwrap_or(now);
    (end - complaint.submitted_at).num_seconds() as f64 / 3600.0
}

/// Admit and persist a citizen review, then recompute the official's score.
pub async fn submit_review(
    storage: &Storage,
    request: SubmitReviewRequest,
    now: DateTime<Utc>,
) -> Result<Review, AppError> {
    let complaint = storage
        .find_complaint(request.complaint_id)
        .await?
        .ok_or(AppError::NotFound("complaint"))?;

    if !complaint.is_public {
        return Err(AppError::NotPublic);
    }
    let official_id = complaint
        .assigned_official
        .ok_or(AppError::NoOfficialAssigned)?;

    let citizen_email = request.citizen_email.trim().to_lowercase();
    if citizen_email.is_empty() {
        return Err(AppError::Validation("citizen email is required".to_string()));
    }
    if storage
        .find_review_by_citizen(complaint.id, &citizen_email)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateReview);
    }

    if !(1..=5).contains(&request.rating) {
        return Err(AppError::InvalidRating);
    }
    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    if comment.as_ref().is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN) {
        return Err(AppError::Validation(format!(
            "comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }

    let review = storage
        .insert_review(&NewReview {
            complaint_id: complaint.id,
            official_id,
            citizen_email,
            rating: request.rating,
            comment,
            response_time: response_time_hours(&complaint, now),
            is_anonymous: request.is_anonymous,
            created_at: now,
        })
        .await?
        // Lost the race against another submission from the same citizen
        .ok_or(AppError::DuplicateReview)?;

    scoring::recompute(storage, official_id).await?;

    info!(
        review_id = review.id,
        complaint_id = review.complaint_id,
        official_id = review.official_id,
        rating = review.rating,
        "Review accepted"
    );

    Ok(review)
}
