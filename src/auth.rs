//! Credential store and token handling.
//!
//! Passwords are stored only as salted argon2 hashes. Successful logins are
//! issued an HS256 JWT carrying `{sub, email, role}` with a 24 hour expiry;
//! protected handlers take [`Claims`] as an extractor, which verifies the
//! bearer token against the shared secret.
//!
//! Login is deliberately uniform: an unknown email, an inactive account, and
//! a wrong password all fail with the same `invalid_credentials` signal.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::AppError;
use crate::model::{LoginRequest, NewOfficial, Official, OfficialRole, RegisterRequest};
use crate::storage::Storage;

/// Token lifetime.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Minimum plaintext password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Official id.
    pub sub: i64,
    pub email: String,
    pub role: OfficialRole,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn issue_token(secret: &str, official: &Official) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: official.id,
        email: official.email.clone(),
        role: official.role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))
}

/// Verify a token and return its claims. Bad signature, malformed token,
/// and expired token are all collapsed into `Unauthorized`.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<AppState> for Claims {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        verify_token(&state.jwt_secret, token)
    }
}

/// Create an official account.
///
/// The email is lowercased and trimmed before the uniqueness check; the
/// store's UNIQUE constraint decides ties between racing registrations. New
/// accounts start active with a zero performance score and zero counters.
pub async fn register(storage: &Storage, request: RegisterRequest) -> Result<Official, AppError> {
    let name = request.name.trim();
    let email = request.email.trim().to_lowercase();
    let ward = request.ward.trim();
    let phone = request.phone.trim();
    let department = request.department.trim();

    for (field, value) in [
        ("name", name),
        ("email", email.as_str()),
        ("ward", ward),
        ("phone", phone),
        ("department", department),
    ] {
        if value.is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role = match request.role.as_deref() {
        Some(role) => OfficialRole::parse(role.trim())
            .ok_or_else(|| AppError::Validation(format!("unknown role '{role}'")))?,
        None => OfficialRole::WardOfficer,
    };

    let password_hash = hash_password(&request.password)?;
    let new = NewOfficial {
        name: name.to_string(),
        email,
        password_hash,
        ward: ward.to_string(),
        phone: phone.to_string(),
        department: department.to_string(),
        role,
    };

    storage
        .insert_official(&new)
        .await?
        .ok_or(AppError::DuplicateEmail)
}

/// Verify credentials and issue a token.
pub async fn login(
    storage: &Storage,
    secret: &str,
    request: LoginRequest,
) -> Result<(String, Official), AppError> {
    let email = request.email.trim().to_lowercase();

    let Some((official, hash)) = storage.find_official_by_email(&email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !official.is_active || !verify_password(&request.password, &hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(secret, &official)?;
    Ok((token, official))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_official() -> Official {
        Official {
            id: 7,
            name: "A. Officer".to_string(),
            email: "officer@city.gov".to_string(),
            ward: "Ward 1".to_string(),
            phone: "555-0100".to_string(),
            department: "Sanitation".to_string(),
            role: OfficialRole::WardOfficer,
            is_active: true,
            performance_score: 0.0,
            total_complaints: 0,
            resolved_complaints: 0,
            average_resolution_time: 0.0,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2isfine").unwrap();
        assert_ne!(hash, "hunter2isfine");
        assert!(verify_password("hunter2isfine", &hash));
        assert!(!verify_password("hunter3isfine", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }

    #[test]
    fn test_token_round_trip() {
        let secret = "test-secret";
        let token = issue_token(secret, &sample_official()).unwrap();

        let claims = verify_token(secret, &token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "officer@city.gov");
        assert_eq!(claims.role, OfficialRole::WardOfficer);
    }

    #[test]
    fn test_token_wrong_secret_fails() {
        let token = issue_token("secret-a", &sample_official()).unwrap();
        assert!(matches!(
            verify_token("secret-b", &token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_fails() {
        let now = Utc::now();
        let claims = Claims {
            sub: 7,
            email: "officer@city.gov".to_string(),
            role: OfficialRole::WardOfficer,
            iat: (now - Duration::hours(26)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            verify_token("test-secret", &token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_garbage_token_fails() {
        assert!(matches!(
            verify_token("test-secret", "not.a.token"),
            Err(AppError::Unauthorized)
        ));
    }
}
