//! SQLite storage layer for CivicPulse.
//!
//! Three collections: `complaints`, `officials`, `reviews`. Timestamps are
//! unix seconds and enums are stored as their wire strings. The two
//! uniqueness rules (one account per email, one review per
//! (complaint, citizen) pair) are declared as UNIQUE constraints so the
//! store is the final arbiter when concurrent requests race past the
//! engines' pre-checks. The insert methods surface a constraint hit as
//! `Ok(None)` rather than an error, and the engines map that to the right
//! taxonomy kind.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::model::{
    Complaint, ComplaintStatus, IssueType, Location, NewComplaint, NewOfficial, NewReview,
    Official, OfficialRole, Priority, Review,
};

/// Filter for the admin complaint listing. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    pub ward: Option<String>,
    pub status: Option<ComplaintStatus>,
    pub issue_type: Option<IssueType>,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

fn datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).unwrap()
}

fn complaint_from_row(row: &SqliteRow) -> anyhow::Result<Complaint> {
    let issue_type_raw: String = row.get("issue_type");
    let issue_type = IssueType::parse(&issue_type_raw)
        .ok_or_else(|| anyhow::anyhow!("unknown issue type in store: {issue_type_raw}"))?;

    let status_raw: String = row.get("status");
    let status = ComplaintStatus::parse(&status_raw)
        .ok_or_else(|| anyhow::anyhow!("unknown complaint status in store: {status_raw}"))?;

    let priority_raw: String = row.get("priority");
    let priority = Priority::parse(&priority_raw)
        .ok_or_else(|| anyhow::anyhow!("unknown priority in store: {priority_raw}"))?;

    Ok(Complaint {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        issue_type,
        location: Location {
            address: row.get("address"),
            lat: row.get("lat"),
            lng: row.get("lng"),
            ward: row.get("ward"),
        },
        image_url: row.get("image_url"),
        citizen_email: row.get("citizen_email"),
        citizen_phone: row.get("citizen_phone"),
        status,
        priority,
        assigned_official: row.get("assigned_official"),
        submitted_at: datetime(row.get("submitted_at")),
        resolved_at: row.get::<Option<i64>, _>("resolved_at").map(datetime),
        is_public: row.get("is_public"),
        public_at: row.get::<Option<i64>, _>("public_at").map(datetime),
    })
}

fn official_from_row(row: &SqliteRow) -> anyhow::Result<Official> {
    let role_raw: String = row.get("role");
    let role = OfficialRole::parse(&role_raw)
        .ok_or_else(|| anyhow::anyhow!("unknown official role in store: {role_raw}"))?;

    Ok(Official {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        ward: row.get("ward"),
        phone: row.get("phone"),
        department: row.get("department"),
        role,
        is_active: row.get("is_active"),
        performance_score: row.get("performance_score"),
        total_complaints: row.get("total_complaints"),
        resolved_complaints: row.get("resolved_complaints"),
        average_resolution_time: row.get("average_resolution_time"),
    })
}

fn review_from_row(row: &SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        complaint_id: row.get("complaint_id"),
        official_id: row.get("official_id"),
        citizen_email: row.get("citizen_email"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        response_time: row.get("response_time"),
        is_anonymous: row.get("is_anonymous"),
        created_at: datetime(row.get("created_at")),
    }
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:civicpulse.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS officials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                ward TEXT NOT NULL,
                phone TEXT NOT NULL,
                department TEXT NOT NULL,
                role TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                performance_score REAL NOT NULL DEFAULT 0,
                total_complaints INTEGER NOT NULL DEFAULT 0,
                resolved_complaints INTEGER NOT NULL DEFAULT 0,
                average_resolution_time REAL NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS complaints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                issue_type TEXT NOT NULL,
                address TEXT,
                lat REAL,
                lng REAL,
                ward TEXT NOT NULL,
                image_url TEXT,
                citizen_email TEXT,
                citizen_phone TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                priority TEXT NOT NULL DEFAULT 'medium',
                assigned_official INTEGER,
                submitted_at INTEGER NOT NULL,
                resolved_at INTEGER,
                is_public INTEGER NOT NULL DEFAULT 0,
                public_at INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                complaint_id INTEGER NOT NULL,
                official_id INTEGER NOT NULL,
                citizen_email TEXT NOT NULL,
                rating INTEGER NOT NULL,
                comment TEXT,
                response_time REAL NOT NULL,
                is_anonymous INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                UNIQUE (complaint_id, citizen_email)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the dashboard and listing filters
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_complaints_ward_status
            ON complaints(ward, status, issue_type)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_complaints_assigned
            ON complaints(assigned_official)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_reviews_official
            ON reviews(official_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // Complaints
    // ========================================================================

    /// Insert a new complaint. Status always starts at `pending`.
    pub async fn insert_complaint(&self, new: &NewComplaint) -> anyhow::Result<Complaint> {
        let result = sqlx::query(
            r#"
            INSERT INTO complaints (
                title, description, issue_type, address, lat, lng, ward,
                image_url, citizen_email, citizen_phone, status, priority,
                assigned_official, submitted_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.issue_type.as_str())
        .bind(&new.location.address)
        .bind(new.location.lat)
        .bind(new.location.lng)
        .bind(&new.location.ward)
        .bind(&new.image_url)
        .bind(&new.citizen_email)
        .bind(&new.citizen_phone)
        .bind(new.priority.as_str())
        .bind(new.assigned_official)
        .bind(new.submitted_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(Complaint {
            id: result.last_insert_rowid(),
            title: new.title.clone(),
            description: new.description.clone(),
            issue_type: new.issue_type,
            location: new.location.clone(),
            image_url: new.image_url.clone(),
            citizen_email: new.citizen_email.clone(),
            citizen_phone: new.citizen_phone.clone(),
            status: ComplaintStatus::Pending,
            priority: new.priority,
            assigned_official: new.assigned_official,
            submitted_at: datetime(new.submitted_at.timestamp()),
            resolved_at: None,
            is_public: false,
            public_at: None,
        })
    }

    pub async fn find_complaint(&self, id: i64) -> anyhow::Result<Option<Complaint>> {
        let row = sqlx::query("SELECT * FROM complaints WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(complaint_from_row).transpose()
    }

    /// Filtered, newest-first page of complaints plus the unpaged total.
    pub async fn list_complaints(
        &self,
        filter: &ComplaintFilter,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Complaint>, i64)> {
        let mut conditions = Vec::new();
        if filter.ward.is_some() {
            conditions.push("ward = ?");
        }
        if filter.status.is_some() {
            conditions.push("status = ?");
        }
        if filter.issue_type.is_some() {
            conditions.push("issue_type = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM complaints{where_clause} \
             ORDER BY submitted_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query(&sql);
        if let Some(ward) = &filter.ward {
            query = query.bind(ward);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(issue_type) = filter.issue_type {
            query = query.bind(issue_type.as_str());
        }
        let offset = (page - 1) * limit;
        let rows = query.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        let complaints = rows
            .iter()
            .map(complaint_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let count_sql = format!("SELECT COUNT(*) AS total FROM complaints{where_clause}");
        let mut count_query = sqlx::query(&count_sql);
        if let Some(ward) = &filter.ward {
            count_query = count_query.bind(ward);
        }
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(issue_type) = filter.issue_type {
            count_query = count_query.bind(issue_type.as_str());
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.get("total");

        Ok((complaints, total))
    }

    /// Complaints visible for citizen review, newest-public first.
    pub async fn list_public_complaints(&self) -> anyhow::Result<Vec<Complaint>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM complaints
            WHERE is_public = 1 AND status IN ('resolved', 'delayed')
            ORDER BY public_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(complaint_from_row).collect()
    }

    pub async fn list_complaints_for_official(
        &self,
        official_id: i64,
    ) -> anyhow::Result<Vec<Complaint>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM complaints
            WHERE assigned_official = ?
            ORDER BY submitted_at DESC, id DESC
            "#,
        )
        .bind(official_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(complaint_from_row).collect()
    }

    /// Write a new status. `resolved_at` is only overwritten when a value is
    /// passed; `None` keeps whatever is stored.
    pub async fn update_complaint_status(
        &self,
        id: i64,
        status: ComplaintStatus,
        resolved_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE complaints
            SET status = ?, resolved_at = COALESCE(?, resolved_at)
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(resolved_at.map(|t| t.timestamp()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Promote stale pending complaints to delayed+public in one statement.
    ///
    /// Matches status=pending, submitted before `cutoff`, not yet public.
    /// Returns the number of rows changed; a second run over the same data
    /// matches nothing.
    pub async fn mark_delayed_public(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE complaints
            SET status = 'delayed', is_public = 1, public_at = ?
            WHERE status = 'pending' AND submitted_at < ? AND is_public = 0
            "#,
        )
        .bind(now.timestamp())
        .bind(cutoff.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_complaints_for_official(&self, official_id: i64) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM complaints WHERE assigned_official = ?")
            .bind(official_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("total"))
    }

    pub async fn count_resolved_complaints_for_official(
        &self,
        official_id: i64,
    ) -> anyhow::Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM complaints
            WHERE assigned_official = ? AND status = 'resolved'
            "#,
        )
        .bind(official_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }

    // ========================================================================
    // Officials
    // ========================================================================

    /// Insert a new official account. Returns `None` when the email is
    /// already taken (UNIQUE constraint).
    pub async fn insert_official(&self, new: &NewOfficial) -> anyhow::Result<Option<Official>> {
        let result = sqlx::query(
            r#"
            INSERT INTO officials (name, email, password_hash, ward, phone, department, role)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.ward)
        .bind(&new.phone)
        .bind(&new.department)
        .bind(new.role.as_str())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(Official {
            id: result.last_insert_rowid(),
            name: new.name.clone(),
            email: new.email.clone(),
            ward: new.ward.clone(),
            phone: new.phone.clone(),
            department: new.department.clone(),
            role: new.role,
            is_active: true,
            performance_score: 0.0,
            total_complaints: 0,
            resolved_complaints: 0,
            average_resolution_time: 0.0,
        }))
    }

    pub async fn find_official(&self, id: i64) -> anyhow::Result<Option<Official>> {
        let row = sqlx::query("SELECT * FROM officials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(official_from_row).transpose()
    }

    /// Look up an account (active or not) with its password hash for the
    /// login flow.
    pub async fn find_official_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<(Official, String)>> {
        let row = sqlx::query("SELECT * FROM officials WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let official = official_from_row(&row)?;
        let hash: String = row.get("password_hash");
        Ok(Some((official, hash)))
    }

    /// The official who receives new complaints for a ward: active, matching
    /// ward, lowest id. Deterministic when several officials share the ward.
    pub async fn find_active_official_for_ward(
        &self,
        ward: &str,
    ) -> anyhow::Result<Option<Official>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM officials
            WHERE ward = ? AND is_active = 1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(ward)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(official_from_row).transpose()
    }

    pub async fn list_active_officials(&self) -> anyhow::Result<Vec<Official>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM officials
            WHERE is_active = 1
            ORDER BY performance_score DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(official_from_row).collect()
    }

    /// Top active officials by performance score; ties break on ascending id.
    pub async fn leaderboard(&self, limit: i64) -> anyhow::Result<Vec<Official>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM officials
            WHERE is_active = 1
            ORDER BY performance_score DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(official_from_row).collect()
    }

    /// Overwrite the derived fields. Only the scoring engine calls this.
    pub async fn update_official_metrics(
        &self,
        id: i64,
        performance_score: f64,
        total_complaints: i64,
        resolved_complaints: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE officials
            SET performance_score = ?, total_complaints = ?, resolved_complaints = ?
            WHERE id = ?
            "#,
        )
        .bind(performance_score)
        .bind(total_complaints)
        .bind(resolved_complaints)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deactivate an account, removing it from assignment, login, and the
    /// leaderboard.
    pub async fn set_official_active(&self, id: i64, is_active: bool) -> anyhow::Result<()> {
        sqlx::query("UPDATE officials SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    /// Insert a review. Returns `None` when the (complaint, citizen) pair
    /// already has one; the UNIQUE constraint is the arbiter for racing
    /// submissions.
    pub async fn insert_review(&self, new: &NewReview) -> anyhow::Result<Option<Review>> {
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (
                complaint_id, official_id, citizen_email, rating, comment,
                response_time, is_anonymous, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.complaint_id)
        .bind(new.official_id)
        .bind(&new.citizen_email)
        .bind(new.rating)
        .bind(&new.comment)
        .bind(new.response_time)
        .bind(new.is_anonymous)
        .bind(new.created_at.timestamp())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(Review {
            id: result.last_insert_rowid(),
            complaint_id: new.complaint_id,
            official_id: new.official_id,
            citizen_email: new.citizen_email.clone(),
            rating: new.rating,
            comment: new.comment.clone(),
            response_time: new.response_time,
            is_anonymous: new.is_anonymous,
            created_at: datetime(new.created_at.timestamp()),
        }))
    }

    pub async fn find_review_by_citizen(
        &self,
        complaint_id: i64,
        citizen_email: &str,
    ) -> anyhow::Result<Option<Review>> {
        let row = sqlx::query("SELECT * FROM reviews WHERE complaint_id = ? AND citizen_email = ?")
            .bind(complaint_id)
            .bind(citizen_email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(review_from_row))
    }

    pub async fn list_reviews_for_official(
        &self,
        official_id: i64,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Review>, i64)> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reviews
            WHERE official_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(official_id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&self.pool)
        .await?;
        let reviews = rows.iter().map(review_from_row).collect();

        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM reviews WHERE official_id = ?")
            .bind(official_id)
            .fetch_one(&self.pool)
            .await?
            .get("total");

        Ok((reviews, total))
    }

    pub async fn list_reviews_for_complaint(&self, complaint_id: i64) -> anyhow::Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reviews
            WHERE complaint_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(review_from_row).collect())
    }

    /// All reviews across complaints, newest first, paginated.
    pub async fn list_reviews(&self, page: i64, limit: i64) -> anyhow::Result<(Vec<Review>, i64)> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reviews
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&self.pool)
        .await?;
        let reviews = rows.iter().map(review_from_row).collect();

        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM reviews")
            .fetch_one(&self.pool)
            .await?
            .get("total");

        Ok((reviews, total))
    }

    pub async fn recent_reviews_for_official(
        &self,
        official_id: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reviews
            WHERE official_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(official_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(review_from_row).collect())
    }

    /// Mean rating over all reviews for an official, or `None` if there are
    /// no reviews yet.
    pub async fn average_rating_for_official(
        &self,
        official_id: i64,
    ) -> anyhow::Result<Option<f64>> {
        let row = sqlx::query("SELECT AVG(rating) AS average FROM reviews WHERE official_id = ?")
            .bind(official_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("average"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_complaint(ward: &str, submitted_at: DateTime<Utc>) -> NewComplaint {
        NewComplaint {
            title: "Overflowing bin".to_string(),
            description: "Garbage bin on the corner has not been emptied".to_string(),
            issue_type: IssueType::Garbage,
            location: Location {
                address: Some("12 Main St".to_string()),
                lat: None,
                lng: None,
                ward: ward.to_string(),
            },
            image_url: None,
            citizen_email: Some("citizen@example.com".to_string()),
            citizen_phone: None,
            priority: Priority::Medium,
            assigned_official: None,
            submitted_at,
        }
    }

    fn sample_official(email: &str, ward: &str) -> NewOfficial {
        NewOfficial {
            name: "A. Officer".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            ward: ward.to_string(),
            phone: "555-0100".to_string(),
            department: "Sanitation".to_string(),
            role: OfficialRole::WardOfficer,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_complaint() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        let now = Utc::now();
        let inserted = storage
            .insert_complaint(&sample_complaint("Ward 1", now))
            .await
            .unwrap();

        let found = storage.find_complaint(inserted.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Overflowing bin");
        assert_eq!(found.status, ComplaintStatus::Pending);
        assert_eq!(found.location.ward, "Ward 1");
        assert!(!found.is_public);
        assert!(found.resolved_at.is_none());
    }

    #[tokio::test]
    async fn test_official_email_is_unique() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        let first = storage
            .insert_official(&sample_official("officer@city.gov", "Ward 1"))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = storage
            .insert_official(&sample_official("officer@city.gov", "Ward 2"))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_one_review_per_citizen_per_complaint() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        let review = NewReview {
            complaint_id: 1,
            official_id: 1,
            citizen_email: "citizen@example.com".to_string(),
            rating: 4,
            comment: None,
            response_time: 12.0,
            is_anonymous: false,
            created_at: now,
        };

        assert!(storage.insert_review(&review).await.unwrap().is_some());
        assert!(storage.insert_review(&review).await.unwrap().is_none());

        // Same citizen, different complaint is fine
        let other = NewReview {
            complaint_id: 2,
            ..review
        };
        assert!(storage.insert_review(&other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ward_assignment_prefers_lowest_id() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        let first = storage
            .insert_official(&sample_official("a@city.gov", "Ward 3"))
            .await
            .unwrap()
            .unwrap();
        storage
            .insert_official(&sample_official("b@city.gov", "Ward 3"))
            .await
            .unwrap()
            .unwrap();

        let picked = storage
            .find_active_official_for_ward("Ward 3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.id, first.id);
    }

    #[tokio::test]
    async fn test_inactive_officials_are_not_assignable() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        let official = storage
            .insert_official(&sample_official("a@city.gov", "Ward 3"))
            .await
            .unwrap()
            .unwrap();
        storage.set_official_active(official.id, false).await.unwrap();

        let picked = storage.find_active_official_for_ward("Ward 3").await.unwrap();
        assert!(picked.is_none());
    }

    #[tokio::test]
    async fn test_mark_delayed_public_only_touches_stale_pending() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        let stale = storage
            .insert_complaint(&sample_complaint("Ward 1", now - chrono::Duration::days(4)))
            .await
            .unwrap();
        let fresh = storage
            .insert_complaint(&sample_complaint("Ward 1", now - chrono::Duration::hours(1)))
            .await
            .unwrap();

        let cutoff = now - chrono::Duration::hours(72);
        let count = storage.mark_delayed_public(cutoff, now).await.unwrap();
        assert_eq!(count, 1);

        let stale = storage.find_complaint(stale.id).await.unwrap().unwrap();
        assert_eq!(stale.status, ComplaintStatus::Delayed);
        assert!(stale.is_public);
        assert_eq!(stale.public_at.unwrap().timestamp(), now.timestamp());

        let fresh = storage.find_complaint(fresh.id).await.unwrap().unwrap();
        assert_eq!(fresh.status, ComplaintStatus::Pending);
        assert!(!fresh.is_public);
    }
}
