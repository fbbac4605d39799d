//! Complaint lifecycle engine.
//!
//! Owns the status state machine, ward-based assignment at submission, and
//! the time-based promotion of stale pending complaints to delayed+public.
//! All functions take `now` from the caller so behavior is reproducible in
//! tests; the HTTP layer passes the current time.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::AppError;
use crate::model::{
    Complaint, ComplaintStatus, IssueType, NewComplaint, Priority, SubmitComplaintRequest,
};
use crate::scoring;
use crate::storage::Storage;

/// Hours a complaint may sit in `pending` before the sweep promotes it to
/// `delayed` and makes it public.
pub const DELAYED_THRESHOLD_HOURS: i64 = 72;

/// Validate and persist a new complaint, assigning the responsible official
/// for its ward.
///
/// Assignment picks the active official with the matching ward and the
/// lowest id, or leaves the complaint unassigned when the ward has no active
/// official. Unassigned submissions still succeed.
pub async fn submit_complaint(
    storage: &Storage,
    request: SubmitComplaintRequest,
    now: DateTime<Utc>,
) -> Result<Complaint, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    let description = request.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation("description is required".to_string()));
    }
    let issue_type_raw = request.issue_type.trim().to_lowercase();
    let issue_type = IssueType::parse(&issue_type_raw)
        .ok_or_else(|| AppError::Validation(format!("unknown issue type '{issue_type_raw}'")))?;
    let mut location = request.location.clone();
    location.ward = location.ward.trim().to_string();
    if location.ward.is_empty() {
        return Err(AppError::Validation("ward is required in location".to_string()));
    }
    let priority = match request.priority.as_deref() {
        Some(raw) => Priority::parse(raw.trim())
            .ok_or_else(|| AppError::Validation(format!("unknown priority '{raw}'")))?,
        None => Priority::Medium,
    };

    let assigned_official = storage
        .find_active_official_for_ward(&location.ward)
        .await?
        .map(|official| official.id);

    let complaint = storage
        .insert_complaint(&NewComplaint {
            title: title.to_string(),
            description: description.to_string(),
            issue_type,
            location,
            image_url: request.image_url,
            citizen_email: request.citizen_email,
            citizen_phone: request.citizen_phone,
            priority,
            assigned_official,
            submitted_at: now,
        })
        .await?;

    info!(
        complaint_id = complaint.id,
        ward = %complaint.location.ward,
        assigned = ?complaint.assigned_official,
        "Complaint submitted"
    );

    Ok(complaint)
}

/// Apply a status transition requested by an official.
///
/// The transition is validated against the status table; `resolved` and
/// `rejected` are terminal, so a second resolution attempt fails and the
/// stored `resolved_at` is untouched. A transition to `resolved` stamps
/// `resolved_at = now` and recomputes the assigned official's derived
/// metrics.
pub async fn update_status(
    storage: &Storage,
    complaint_id: i64,
    requested: &str,
    now: DateTime<Utc>,
) -> Result<Complaint, AppError> {
    let requested = requested.trim().to_lowercase();
    let next = ComplaintStatus::parse(&requested)
        .ok_or_else(|| AppError::Validation(format!("unknown status '{requested}'")))?;

    let complaint = storage
        .find_complaint(complaint_id)
        .await?
        .ok_or(AppError::NotFound("complaint"))?;

    if !complaint.status.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: complaint.status,
            to: next,
        });
    }

    let resolved_at = (next == ComplaintStatus::Resolved).then_some(now);
    storage
        .update_complaint_status(complaint_id, next, resolved_at)
        .await?;

    // Resolution changes the resolved counter, so the cache is refreshed here
    // rather than waiting for the next review.
    if next == ComplaintStatus::Resolved {
        if let Some(official_id) = complaint.assigned_official {
            scoring::recompute(storage, official_id).await?;
        }
    }

    storage
        .find_complaint(complaint_id)
        .await?
        .ok_or(AppError::NotFound("complaint"))
}

/// Promote every pending complaint older than `threshold_hours` to
/// delayed+public.
///
/// Idempotent: promoted complaints no longer match the filter, so a second
/// run at the same instant reports zero. No scheduler lives here; the caller
/// provides `now` and the cadence.
pub async fn sweep_delayed(
    storage: &Storage,
    now: DateTime<Utc>,
    threshold_hours: i64,
) -> Result<u64, AppError> {
    let cutoff = now - Duration::hours(threshold_hours);
    let count = storage.mark_delayed_public(cutoff, now).await?;

    if count > 0 {
        info!(count, threshold_hours, "Promoted stale pending complaints to public");
    }

    Ok(count)
}

/// Complaints open for citizen review: public, and either resolved or
/// delayed, newest-public first.
pub async fn list_public(storage: &Storage) -> Result<Vec<Complaint>, AppError> {
    Ok(storage.list_public_complaints().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, NewOfficial, OfficialRole};

    async fn setup_storage() -> Storage {
        Storage::new("sqlite::memory:").await.unwrap()
    }

    async fn add_official(storage: &Storage, email: &str, ward: &str) -> i64 {
        storage
            .insert_official(&NewOfficial {
                name: "A. Officer".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                ward: ward.to_string(),
                phone: "555-0100".to_string(),
                department: "Works".to_string(),
                role: OfficialRole::WardOfficer,
            })
            .await
            .unwrap()
            .unwrap()
            .id
    }

    fn request(ward: &str) -> SubmitComplaintRequest {
        SubmitComplaintRequest {
            title: "Pothole on 5th".to_string(),
            description: "Deep pothole near the crossing".to_string(),
            issue_type: "pothole".to_string(),
            location: Location {
                address: None,
                lat: None,
                lng: None,
                ward: ward.to_string(),
            },
            image_url: None,
            citizen_email: Some("citizen@example.com".to_string()),
            citizen_phone: None,
            priority: None,
        }
    }

    #[tokio::test]
    async fn test_submit_assigns_ward_official() {
        let storage = setup_storage().await;
        let official_id = add_official(&storage, "a@city.gov", "Ward 1").await;

        let complaint = submit_complaint(&storage, request("Ward 1"), Utc::now())
            .await
            .unwrap();

        assert_eq!(complaint.assigned_official, Some(official_id));
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert_eq!(complaint.priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_submit_without_matching_official_succeeds_unassigned() {
        let storage = setup_storage().await;
        add_official(&storage, "a@city.gov", "Ward 1").await;

        let complaint = submit_complaint(&storage, request("Ward 9"), Utc::now())
            .await
            .unwrap();

        assert_eq!(complaint.assigned_official, None);
        assert_eq!(complaint.status, ComplaintStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_requires_ward() {
        let storage = setup_storage().await;

        let err = submit_complaint(&storage, request("   "), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_issue_type() {
        let storage = setup_storage().await;

        let mut bad = request("Ward 1");
        bad.issue_type = "noise".to_string();
        let err = submit_complaint(&storage, bad, Utc::now()).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_stamps_resolved_at_once() {
        let storage = setup_storage().await;
        add_official(&storage, "a@city.gov", "Ward 1").await;

        let submitted = Utc::now() - Duration::hours(10);
        let complaint = submit_complaint(&storage, request("Ward 1"), submitted)
            .await
            .unwrap();

        let now = Utc::now();
        let resolved = update_status(&storage, complaint.id, "resolved", now)
            .await
            .unwrap();
        assert_eq!(resolved.status, ComplaintStatus::Resolved);
        let resolved_at = resolved.resolved_at.unwrap();
        assert!(resolved_at >= resolved.submitted_at);

        // Terminal: a second resolution fails and the stamp is unchanged
        let err = update_status(&storage, complaint.id, "resolved", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let stored = storage.find_complaint(complaint.id).await.unwrap().unwrap();
        assert_eq!(stored.resolved_at.unwrap(), resolved_at);
    }

    #[tokio::test]
    async fn test_update_status_unknown_complaint() {
        let storage = setup_storage().await;

        let err = update_status(&storage, 404, "resolved", Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejected_is_terminal() {
        let storage = setup_storage().await;
        let complaint = submit_complaint(&storage, request("Ward 1"), Utc::now())
            .await
            .unwrap();

        update_status(&storage, complaint.id, "rejected", Utc::now())
            .await
            .unwrap();
        let err = update_status(&storage, complaint.id, "in-progress", Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let storage = setup_storage().await;
        let now = Utc::now();

        submit_complaint(&storage, request("Ward 1"), now - Duration::days(4))
            .await
            .unwrap();
        submit_complaint(&storage, request("Ward 1"), now - Duration::hours(1))
            .await
            .unwrap();

        let first = sweep_delayed(&storage, now, DELAYED_THRESHOLD_HOURS).await.unwrap();
        assert_eq!(first, 1);

        let second = sweep_delayed(&storage, now, DELAYED_THRESHOLD_HOURS).await.unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_swept_complaint_can_still_be_resolved() {
        let storage = setup_storage().await;
        let now = Utc::now();

        let complaint = submit_complaint(&storage, request("Ward 1"), now - Duration::days(4))
            .await
            .unwrap();
        sweep_delayed(&storage, now, DELAYED_THRESHOLD_HOURS).await.unwrap();

        let resolved = update_status(&storage, complaint.id, "resolved", now)
            .await
            .unwrap();
        assert_eq!(resolved.status, ComplaintStatus::Resolved);
        // Publicity is monotonic; resolving a delayed complaint keeps it public
        assert!(resolved.is_public);
    }

    #[tokio::test]
    async fn test_list_public_orders_newest_first() {
        let storage = setup_storage().await;
        let now = Utc::now();

        let older = submit_complaint(&storage, request("Ward 1"), now - Duration::days(5))
            .await
            .unwrap();
        sweep_delayed(&storage, now - Duration::days(1), DELAYED_THRESHOLD_HOURS)
            .await
            .unwrap();

        let newer = submit_complaint(&storage, request("Ward 1"), now - Duration::days(4))
            .await
            .unwrap();
        sweep_delayed(&storage, now, DELAYED_THRESHOLD_HOURS).await.unwrap();

        let public = list_public(&storage).await.unwrap();
        assert_eq!(public.len(), 2);
        assert_eq!(public[0].id, newer.id);
        assert_eq!(public[1].id, older.id);
    }
}
