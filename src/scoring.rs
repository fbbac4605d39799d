//! Performance scoring engine.
//!
//! An official's `performance_score`, `total_complaints`, and
//! `resolved_complaints` are caches over the reviews and complaints
//! collections, never hand-updated: [`recompute`] is the single entry point
//! that rewrites them, and it runs after every accepted review and after a
//! complaint resolves. Calling it again on unchanged data writes the same
//! values.

use crate::error::AppError;
use crate::model::{
    ComplaintStatus, DashboardResponse, DashboardStatistics, Official, Review,
};
use crate::storage::Storage;

/// How many recent reviews the dashboard shows.
const RECENT_REVIEW_LIMIT: i64 = 5;

/// Default leaderboard size.
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

/// Round to two decimal places, the precision scores are reported at.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean rating for an official across all their reviews, rounded to two
/// decimals; 0 when no reviews exist.
pub async fn average_rating(storage: &Storage, official_id: i64) -> Result<f64, AppError> {
    let average = storage
        .average_rating_for_official(official_id)
        .await?
        .unwrap_or(0.0);
    Ok(round2(average))
}

/// Recompute the derived fields for one official and write them back.
pub async fn recompute(storage: &Storage, official_id: i64) -> Result<Official, AppError> {
    storage
        .find_official(official_id)
        .await?
        .ok_or(AppError::NotFound("official"))?;

    let score = average_rating(storage, official_id).await?;
    let total = storage.count_complaints_for_official(official_id).await?;
    let resolved = storage
        .count_resolved_complaints_for_official(official_id)
        .await?;

    storage
        .update_official_metrics(official_id, score, total, resolved)
        .await?;

    storage
        .find_official(official_id)
        .await?
        .ok_or(AppError::NotFound("official"))
}

/// Top active officials by performance score, ties broken by ascending id.
/// Inactive officials never appear.
pub async fn leaderboard(storage: &Storage, limit: i64) -> Result<Vec<Official>, AppError> {
    Ok(storage.leaderboard(limit).await?)
}

/// Dashboard view for one official: profile, complaint statistics, and
/// their most recent reviews.
///
/// `average_resolution_time` is computed here from the resolved complaints'
/// timestamps; it is a display figure, not a stored source of truth.
pub async fn dashboard(storage: &Storage, official_id: i64) -> Result<DashboardResponse, AppError> {
    let official = storage
        .find_official(official_id)
        .await?
        .ok_or(AppError::NotFound("official"))?;

    let complaints = storage.list_complaints_for_official(official_id).await?;

    let count_with = |status: ComplaintStatus| {
        complaints.iter().filter(|c| c.status == status).count() as i64
    };
    let resolution_hours: Vec<f64> = complaints
        .iter()
        .filter_map(|c| {
            c.resolved_at
                .map(|resolved| (resolved - c.submitted_at).num_seconds() as f64 / 3600.0)
        })
        .collect();
    let average_resolution_time = if resolution_hours.is_empty() {
        0.0
    } else {
        round2(resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64)
    };

    let statistics = DashboardStatistics {
        total_complaints: complaints.len() as i64,
        pending_complaints: count_with(ComplaintStatus::Pending),
        resolved_complaints: count_with(ComplaintStatus::Resolved),
        delayed_complaints: count_with(ComplaintStatus::Delayed),
        average_resolution_time,
    };

    let recent_reviews: Vec<Review> = storage
        .recent_reviews_for_official(official_id, RECENT_REVIEW_LIMIT)
        .await?;

    Ok(DashboardResponse {
        official,
        statistics,
        recent_reviews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewOfficial, NewReview, OfficialRole};
    use chrono::Utc;

    async fn setup_storage() -> Storage {
        Storage::new("sqlite::memory:").await.unwrap()
    }

    async fn add_official(storage: &Storage, email: &str) -> i64 {
        storage
            .insert_official(&NewOfficial {
                name: "A. Officer".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                ward: "Ward 1".to_string(),
                phone: "555-0100".to_string(),
                department: "Works".to_string(),
                role: OfficialRole::WardOfficer,
            })
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn add_review(storage: &Storage, official_id: i64, complaint_id: i64, rating: i64) {
        storage
            .insert_review(&NewReview {
                complaint_id,
                official_id,
                citizen_email: format!("citizen{complaint_id}@example.com"),
                rating,
                comment: None,
                response_time: 24.0,
                is_anonymous: false,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.0 / 3.0 * 3.0), 4.0);
        assert_eq!(round2(3.666_666), 3.67);
        assert_eq!(round2(0.0), 0.0);
    }

    #[tokio::test]
    async fn test_recompute_with_no_reviews_is_zero() {
        let storage = setup_storage().await;
        let id = add_official(&storage, "a@city.gov").await;

        let official = recompute(&storage, id).await.unwrap();

        assert_eq!(official.performance_score, 0.0);
        assert_eq!(official.total_complaints, 0);
        assert_eq!(official.resolved_complaints, 0);
    }

    #[tokio::test]
    async fn test_recompute_averages_ratings() {
        let storage = setup_storage().await;
        let id = add_official(&storage, "a@city.gov").await;

        add_review(&storage, id, 1, 5).await;
        let official = recompute(&storage, id).await.unwrap();
        assert_eq!(official.performance_score, 5.0);

        add_review(&storage, id, 2, 3).await;
        let official = recompute(&storage, id).await.unwrap();
        assert_eq!(official.performance_score, 4.0);
    }

    #[tokio::test]
    async fn test_recompute_rounds_to_two_decimals() {
        let storage = setup_storage().await;
        let id = add_official(&storage, "a@city.gov").await;

        add_review(&storage, id, 1, 5).await;
        add_review(&storage, id, 2, 5).await;
        add_review(&storage, id, 3, 3).await;

        // 13 / 3 = 4.333... -> 4.33
        let official = recompute(&storage, id).await.unwrap();
        assert_eq!(official.performance_score, 4.33);
    }

    #[tokio::test]
    async fn test_recompute_unknown_official() {
        let storage = setup_storage().await;

        let err = recompute(&storage, 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_leaderboard_excludes_inactive_and_sorts_descending() {
        let storage = setup_storage().await;
        let low = add_official(&storage, "low@city.gov").await;
        let high = add_official(&storage, "high@city.gov").await;
        let inactive = add_official(&storage, "inactive@city.gov").await;

        add_review(&storage, low, 1, 2).await;
        recompute(&storage, low).await.unwrap();
        add_review(&storage, high, 2, 5).await;
        recompute(&storage, high).await.unwrap();
        add_review(&storage, inactive, 3, 5).await;
        recompute(&storage, inactive).await.unwrap();
        storage.set_official_active(inactive, false).await.unwrap();

        let board = leaderboard(&storage, DEFAULT_LEADERBOARD_LIMIT).await.unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].id, high);
        assert_eq!(board[1].id, low);
        assert!(board.iter().all(|o| o.is_active));
    }

    #[tokio::test]
    async fn test_dashboard_statistics() {
        let storage = setup_storage().await;
        let id = add_official(&storage, "a@city.gov").await;
        let now = Utc::now();

        // Two complaints assigned; one resolved after 12h, one still pending
        let pending = crate::model::NewComplaint {
            title: "t".to_string(),
            description: "d".to_string(),
            issue_type: crate::model::IssueType::Water,
            location: crate::model::Location {
                address: None,
                lat: None,
                lng: None,
                ward: "Ward 1".to_string(),
            },
            image_url: None,
            citizen_email: None,
            citizen_phone: None,
            priority: crate::model::Priority::Medium,
            assigned_official: Some(id),
            submitted_at: now - chrono::Duration::hours(12),
        };
        storage.insert_complaint(&pending).await.unwrap();
        let resolved = storage.insert_complaint(&pending).await.unwrap();
        storage
            .update_complaint_status(resolved.id, ComplaintStatus::Resolved, Some(now))
            .await
            .unwrap();

        let view = dashboard(&storage, id).await.unwrap();

        assert_eq!(view.statistics.total_complaints, 2);
        assert_eq!(view.statistics.pending_complaints, 1);
        assert_eq!(view.statistics.resolved_complaints, 1);
        assert_eq!(view.statistics.delayed_complaints, 0);
        assert!((view.statistics.average_resolution_time - 12.0).abs() < 0.01);
    }
}
