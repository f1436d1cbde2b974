//! User model and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub is_student: bool,
    pub is_lecturer: bool,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        match (&self.firstname, &self.lastname) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// JWT Claims for authenticated users. Token issuance is handled by the
/// campus identity provider; this server only validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_student: bool,
    pub is_lecturer: bool,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Create a new JWT token (used by tests and tooling)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Lab admins and super admins count as administrators
    pub fn is_any_admin(&self) -> bool {
        self.is_admin || self.is_super_admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_any_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    pub fn require_student(&self) -> Result<(), AppError> {
        if self.is_student {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only students can book computers".to_string(),
            ))
        }
    }

    pub fn require_lecturer(&self) -> Result<(), AppError> {
        if self.is_lecturer {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only lecturers can book lab sessions".to_string(),
            ))
        }
    }
}
