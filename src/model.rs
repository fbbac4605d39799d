//! Data models for CivicPulse.
//!
//! The three collections (complaints, officials, reviews) plus the enums
//! that constrain them and the request/response types used on the wire.
//!
//! The one real rule in this module is the complaint status machine,
//! expressed by [`ComplaintStatus::can_transition_to`]. Everything else is
//! plain data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle state of a complaint.
///
/// `resolved` and `rejected` are terminal. `delayed` is reached only by the
/// periodic sweep over stale pending complaints and can still move to
/// `resolved` if an official eventually acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
    Rejected,
    Delayed,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProgress => "in-progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Rejected => "rejected",
            ComplaintStatus::Delayed => "delayed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ComplaintStatus::Pending),
            "in-progress" => Some(ComplaintStatus::InProgress),
            "resolved" => Some(ComplaintStatus::Resolved),
            "rejected" => Some(ComplaintStatus::Rejected),
            "delayed" => Some(ComplaintStatus::Delayed),
            _ => None,
        }
    }

    /// The allowed status transitions:
    ///
    /// - `pending` -> `in-progress`, `resolved`, `rejected`, `delayed`
    /// - `in-progress` -> `resolved`, `rejected`
    /// - `delayed` -> `resolved`
    /// - `resolved`, `rejected` -> nothing (terminal)
    ///
    /// There is no self-loop in the table; writing the current status again
    /// is rejected like any other disallowed transition.
    pub fn can_transition_to(self, next: ComplaintStatus) -> bool {
        use ComplaintStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress | Resolved | Rejected | Delayed)
                | (InProgress, Resolved | Rejected)
                | (Delayed, Resolved)
        )
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of civic issue a complaint reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Garbage,
    Pothole,
    Streetlight,
    Water,
    Sewage,
    Road,
    Other,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Garbage => "garbage",
            IssueType::Pothole => "pothole",
            IssueType::Streetlight => "streetlight",
            IssueType::Water => "water",
            IssueType::Sewage => "sewage",
            IssueType::Road => "road",
            IssueType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "garbage" => Some(IssueType::Garbage),
            "pothole" => Some(IssueType::Pothole),
            "streetlight" => Some(IssueType::Streetlight),
            "water" => Some(IssueType::Water),
            "sewage" => Some(IssueType::Sewage),
            "road" => Some(IssueType::Road),
            "other" => Some(IssueType::Other),
            _ => None,
        }
    }
}

/// Complaint priority. Set once at submission; never derived from issue type
/// or age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Role of an official account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OfficialRole {
    WardOfficer,
    Supervisor,
    Admin,
}

impl OfficialRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfficialRole::WardOfficer => "ward-officer",
            OfficialRole::Supervisor => "supervisor",
            OfficialRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ward-officer" => Some(OfficialRole::WardOfficer),
            "supervisor" => Some(OfficialRole::Supervisor),
            "admin" => Some(OfficialRole::Admin),
            _ => None,
        }
    }
}

/// Where a complaint was reported. The ward is the routing key for official
/// assignment and is always required; everything else is optional detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    pub ward: String,
}

/// A citizen complaint.
#[derive(Debug, Clone, Serialize)]
pub struct Complaint {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub location: Location,

    /// Reference to externally stored media, recorded opaquely.
    pub image_url: Option<String>,

    pub citizen_email: Option<String>,
    pub citizen_phone: Option<String>,
    pub status: ComplaintStatus,
    pub priority: Priority,

    /// Id of the official responsible for this complaint's ward. Set once at
    /// submission; null if the ward had no active official at that time.
    pub assigned_official: Option<i64>,

    pub submitted_at: DateTime<Utc>,

    /// Stamped when the complaint transitions to `resolved`. Set at most
    /// once because `resolved` is terminal.
    pub resolved_at: Option<DateTime<Utc>>,

    /// Whether the complaint is visible to all citizens for review. Once
    /// true it never reverts.
    pub is_public: bool,
    pub public_at: Option<DateTime<Utc>>,
}

/// An official account. The password hash lives only in the store and is
/// never part of this type.
#[derive(Debug, Clone, Serialize)]
pub struct Official {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub ward: String,
    pub phone: String,
    pub department: String,
    pub role: OfficialRole,
    pub is_active: bool,

    /// Mean citizen rating in [0, 5], rounded to 2 decimals. Written only by
    /// the scoring engine; recomputable from the reviews at any time.
    pub performance_score: f64,
    pub total_complaints: i64,
    pub resolved_complaints: i64,

    /// Soft display field in hours; the dashboard recomputes it on demand.
    pub average_resolution_time: f64,
}

/// A citizen review of how an official handled a public complaint.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: i64,
    pub complaint_id: i64,
    pub official_id: i64,
    pub citizen_email: String,
    pub rating: i64,
    pub comment: Option<String>,

    /// Hours from submission to resolution, or to the review time if the
    /// complaint was never resolved. Frozen at submission.
    pub response_time: f64,

    /// Display-only flag; scoring ignores it.
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Insert payloads (storage input)
// ============================================================================

/// A validated complaint ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub location: Location,
    pub image_url: Option<String>,
    pub citizen_email: Option<String>,
    pub citizen_phone: Option<String>,
    pub priority: Priority,
    pub assigned_official: Option<i64>,
    pub submitted_at: DateTime<Utc>,
}

/// A validated official account ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewOfficial {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub ward: String,
    pub phone: String,
    pub department: String,
    pub role: OfficialRole,
}

/// A validated review ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub complaint_id: i64,
    pub official_id: i64,
    pub citizen_email: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub response_time: f64,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Request bodies
// ============================================================================

/// Request body for POST /api/complaints.
///
/// Enum-valued fields arrive as strings and are validated by the lifecycle
/// engine, so a bad value surfaces as a `validation_error` rather than a
/// deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitComplaintRequest {
    pub title: String,
    pub description: String,
    pub issue_type: String,
    pub location: Location,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub citizen_email: Option<String>,
    #[serde(default)]
    pub citizen_phone: Option<String>,
    /// Defaults to "medium" when absent.
    #[serde(default)]
    pub priority: Option<String>,
}

/// Request body for PATCH /api/complaints/{id}/status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Request body for POST /api/officials/register.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub ward: String,
    pub phone: String,
    pub department: String,
    /// Defaults to "ward-officer" when absent.
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for POST /api/officials/login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for POST /api/reviews.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReviewRequest {
    pub complaint_id: i64,
    pub citizen_email: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

// ============================================================================
// Response bodies
// ============================================================================

/// One page of complaints for the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintPage {
    pub complaints: Vec<Complaint>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

/// One page of reviews.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

/// Reviews for one official, with their running average rating.
#[derive(Debug, Clone, Serialize)]
pub struct OfficialReviewPage {
    pub reviews: Vec<Review>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub average_rating: f64,
}

/// Response for POST /api/officials/login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub official: Official,
}

/// Response for POST /api/complaints/sweep-delayed.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// Number of complaints promoted to delayed+public by this run.
    pub count: u64,
}

/// Aggregate statistics for one official's dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStatistics {
    pub total_complaints: i64,
    pub pending_complaints: i64,
    pub resolved_complaints: i64,
    pub delayed_complaints: i64,
    /// Mean hours from submission to resolution over resolved complaints,
    /// rounded to 2 decimals; 0 when nothing has been resolved.
    pub average_resolution_time: f64,
}

/// Response for GET /api/officials/{id}/dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub official: Official,
    pub statistics: DashboardStatistics,
    pub recent_reviews: Vec<Review>,
}
